//! Lanes for arrows crossing a margin
//!
//! A margin (the space between two frame columns, or between two rows) is
//! split into a fixed number of lanes. Every target gets the lane of its
//! first-insertion index, spread by `arrow_lane_interval` so consecutive
//! targets do not end up in adjacent lanes. Asking again for the same target
//! returns the same offset for the rest of the layout pass.

use crate::config::LayoutConfig;
use crate::diagram::{FrameId, ValueId};
use rustc_hash::FxHashMap;

/// What an arrow points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneTarget {
    Frame(FrameId),
    Value(ValueId),
}

#[derive(Debug, Clone)]
pub struct ArrowLane {
    start: f64,
    span: f64,
    targets: Vec<LaneTarget>,
}

impl ArrowLane {
    pub fn new(start: f64, span: f64) -> Self {
        ArrowLane {
            start,
            span,
            targets: Vec::new(),
        }
    }

    /// Insertion index of `target`, inserting it on first sight
    pub fn index_of(&mut self, target: LaneTarget) -> usize {
        match self.targets.iter().position(|&t| t == target) {
            Some(index) => index,
            None => {
                self.targets.push(target);
                self.targets.len() - 1
            }
        }
    }

    /// Pixel offset of the lane assigned to `target`
    ///
    /// Offsets stay inside the centered `arrow_margin_fraction` of the margin.
    pub fn position(&mut self, target: LaneTarget, config: &LayoutConfig) -> f64 {
        let count = config.arrow_lane_count.max(1);
        let lane = (self.index_of(target) * config.arrow_lane_interval) % count;
        let band = self.span * config.arrow_margin_fraction;
        let inset = (self.span - band) / 2.0;
        self.start + inset + band * (lane + 1) as f64 / (count + 1) as f64
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Every lane of one layout pass, keyed by the margin's starting pixel
#[derive(Debug, Clone, Default)]
pub struct ArrowLanes {
    vertical: FxHashMap<i64, ArrowLane>,
    horizontal: FxHashMap<i64, ArrowLane>,
}

impl ArrowLanes {
    pub fn new() -> Self {
        ArrowLanes::default()
    }

    /// x of a vertical segment inside the margin `[x, x + span]`
    pub fn vertical(
        &mut self,
        x: f64,
        span: f64,
        target: LaneTarget,
        config: &LayoutConfig,
    ) -> f64 {
        self.vertical
            .entry(margin_key(x))
            .or_insert_with(|| ArrowLane::new(x, span))
            .position(target, config)
    }

    /// y of a horizontal segment inside the margin `[y, y + span]`
    pub fn horizontal(
        &mut self,
        y: f64,
        span: f64,
        target: LaneTarget,
        config: &LayoutConfig,
    ) -> f64 {
        self.horizontal
            .entry(margin_key(y))
            .or_insert_with(|| ArrowLane::new(y, span))
            .position(target, config)
    }

    pub fn clear(&mut self) {
        self.vertical.clear();
        self.horizontal.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.vertical.is_empty() && self.horizontal.is_empty()
    }
}

fn margin_key(pixel: f64) -> i64 {
    pixel.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_target_same_offset() {
        let config = LayoutConfig::default();
        let mut lanes = ArrowLanes::new();
        let target = LaneTarget::Frame(FrameId(3));
        let first = lanes.vertical(100.0, 32.0, target, &config);
        lanes.vertical(100.0, 32.0, LaneTarget::Value(ValueId(1)), &config);
        let second = lanes.vertical(100.0, 32.0, target, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_distinct_targets_get_distinct_lanes() {
        let config = LayoutConfig::default();
        let mut lane = ArrowLane::new(0.0, 60.0);
        let offsets: Vec<f64> = (0..config.arrow_lane_count)
            .map(|i| lane.position(LaneTarget::Value(ValueId(i)), &config))
            .collect();
        for (i, a) in offsets.iter().enumerate() {
            for b in &offsets[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_lane_formula() {
        let config = LayoutConfig {
            arrow_lane_count: 5,
            arrow_lane_interval: 2,
            arrow_margin_fraction: 1.0,
            ..LayoutConfig::default()
        };
        let mut lane = ArrowLane::new(10.0, 60.0);
        // index 0 -> lane 0, index 1 -> lane 2, index 3 -> lane 1
        assert_eq!(lane.position(LaneTarget::Value(ValueId(0)), &config), 20.0);
        assert_eq!(lane.position(LaneTarget::Value(ValueId(1)), &config), 40.0);
        lane.position(LaneTarget::Value(ValueId(2)), &config);
        assert_eq!(lane.position(LaneTarget::Value(ValueId(3)), &config), 30.0);
    }

    #[test]
    fn test_offsets_stay_inside_margin() {
        let config = LayoutConfig::default();
        let mut lane = ArrowLane::new(200.0, 32.0);
        for i in 0..20 {
            let offset = lane.position(LaneTarget::Value(ValueId(i)), &config);
            assert!(offset > 200.0 && offset < 232.0);
        }
    }
}
