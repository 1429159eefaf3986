//! One row of arrays below a frame row
//!
//! Arrays keep the x they ask for; collisions are resolved vertically by
//! moving an array down into the first lane where its interval, widened by
//! `array_min_gap` on both sides, meets no other array.

use super::LayoutContext;
use crate::config::LayoutConfig;
use crate::diagram::{Diagram, ValueId, ValueKind};

#[derive(Debug, Clone)]
pub struct ArrayLevel {
    pub level: usize,
    /// Placed intervals per lane, sorted by x
    lanes: Vec<Vec<(f64, f64)>>,
    /// Values in placement order
    pub values: Vec<ValueId>,
    y: f64,
}

impl ArrayLevel {
    pub fn new(level: usize) -> Self {
        ArrayLevel {
            level,
            lanes: Vec::new(),
            values: Vec::new(),
            y: 0.0,
        }
    }

    /// Lowest lane at or below `start_lane` where `[x, x + width]` fits
    pub fn claim(&mut self, x: f64, width: f64, start_lane: usize, min_gap: f64) -> usize {
        let lo = x - min_gap;
        let hi = x + width + min_gap;
        let mut lane = start_lane;
        while lane < self.lanes.len()
            && self.lanes[lane]
                .iter()
                .any(|&(a, b)| a < hi && lo < b)
        {
            lane += 1;
        }
        if lane >= self.lanes.len() {
            self.lanes.resize_with(lane + 1, Vec::new);
        }
        let intervals = &mut self.lanes[lane];
        let at = intervals.partition_point(|&(a, _)| a < x);
        intervals.insert(at, (x, x + width));
        lane
    }

    /// Place `value` at `x`, no higher than `parent_lane`
    pub fn add_array(
        &mut self,
        id: ValueId,
        x: f64,
        parent_lane: usize,
        diagram: &mut Diagram,
        config: &LayoutConfig,
    ) -> usize {
        let width = diagram.values[id.0].width();
        let lane = self.claim(x, width, parent_lane, config.array_min_gap);
        let value = &mut diagram.values[id.0];
        value.set_x(x);
        value.level = Some(self.level);
        value.lane = Some(lane);
        self.values.push(id);
        lane
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn intervals(&self, lane: usize) -> &[(f64, f64)] {
        self.lanes.get(lane).map_or(&[], |l| l.as_slice())
    }

    /// Vertical distance between two lanes
    pub fn lane_pitch(config: &LayoutConfig) -> f64 {
        config.unit_height + config.array_lane_gap
    }

    pub fn height(&self, config: &LayoutConfig) -> f64 {
        self.lanes.len() as f64 * Self::lane_pitch(config)
    }

    /// Top of the band a lane occupies, index labels included
    pub fn lane_top(&self, lane: usize, config: &LayoutConfig) -> f64 {
        self.y + lane as f64 * Self::lane_pitch(config)
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Leftmost array edge, if any array was placed
    pub fn left(&self) -> Option<f64> {
        self.lanes
            .iter()
            .filter_map(|l| l.first().map(|&(a, _)| a))
            .reduce(f64::min)
    }

    pub(crate) fn set_y(&mut self, y: f64, diagram: &mut Diagram, ctx: &LayoutContext) {
        let config = &ctx.config;
        self.y = y;
        for &id in &self.values {
            let lane = diagram.values[id.0].lane.unwrap_or(0);
            let band = self.lane_top(lane, config) + config.array_lane_gap;
            let value = &mut diagram.values[id.0];
            let vy = match value.kind {
                ValueKind::Array(_) => band,
                _ => band + (config.unit_height - value.height()) / 2.0,
            };
            value.set_y(vy);
            let (vx, vy) = (value.x(), value.y());
            if let ValueKind::Array(array) = &diagram.values[id.0].kind {
                for unit in &array.units {
                    diagram.units[unit.0].place_in(vx, vy);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_moves_to_next_lane() {
        let mut level = ArrayLevel::new(0);
        assert_eq!(level.claim(0.0, 120.0, 0, 16.0), 0);
        assert_eq!(level.claim(50.0, 80.0, 0, 16.0), 1);
    }

    #[test]
    fn test_gap_is_respected() {
        let mut level = ArrayLevel::new(0);
        level.claim(0.0, 100.0, 0, 16.0);
        // Touching within the gap conflicts, beyond it does not
        assert_eq!(level.claim(110.0, 40.0, 0, 16.0), 1);
        assert_eq!(level.claim(200.0, 40.0, 0, 16.0), 0);
        assert_eq!(level.intervals(0), &[(0.0, 100.0), (200.0, 240.0)]);
    }

    #[test]
    fn test_scan_starts_at_parent_lane() {
        let mut level = ArrayLevel::new(0);
        level.claim(0.0, 50.0, 0, 0.0);
        assert_eq!(level.claim(500.0, 50.0, 2, 0.0), 2);
        assert_eq!(level.lane_count(), 3);
        assert!(level.intervals(1).is_empty());
    }

    #[test]
    fn test_intervals_stay_sorted() {
        let mut level = ArrayLevel::new(0);
        level.claim(300.0, 10.0, 0, 0.0);
        level.claim(100.0, 10.0, 0, 0.0);
        level.claim(200.0, 10.0, 0, 0.0);
        let xs: Vec<f64> = level.intervals(0).iter().map(|&(a, _)| a).collect();
        assert_eq!(xs, vec![100.0, 200.0, 300.0]);
    }
}
