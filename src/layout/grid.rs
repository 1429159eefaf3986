//! Frame grid: columns, rows and pixel positions
//!
//! Rows alternate between frame rows and array rows:
//!
//! ```text
//! row 0  FrameLevel 0   (roots)
//! row 1  ArrayLevel 0   (arrays first referenced from depth 0)
//! row 2  FrameLevel 1
//! row 3  ArrayLevel 1
//! ...
//! ```
//!
//! # Passes
//!
//! 1. Columns: every frame gets `max(next free column of its level, parent
//!    column)`, in creation order, followed by a bounded straighten pass.
//! 2. Widths: frames are inserted into their level in column order, which
//!    fills `cum_widths`; frame and binding x follow.
//! 3. Arrays: every value drawn in an array row is placed by its level.
//! 4. Heights: `cum_heights` from row contents, then y for everything.

use super::array_level::ArrayLevel;
use super::frame_level::FrameLevel;
use super::LayoutContext;
use crate::diagram::{BindingId, Diagram, FrameId, Placement, Reference, ValueKind};

#[derive(Debug, Clone)]
pub struct Grid {
    pub frame_levels: Vec<FrameLevel>,
    pub array_levels: Vec<ArrayLevel>,
}

impl Grid {
    pub fn build(diagram: &mut Diagram, ctx: &mut LayoutContext) -> Grid {
        let depth_count = diagram.tree().levels().len();

        assign_columns(diagram, ctx);
        measure_side_values(diagram, ctx);

        let mut frame_levels: Vec<FrameLevel> = (0..depth_count).map(FrameLevel::new).collect();
        let mut by_column: Vec<FrameId> = diagram.creation_order().to_vec();
        by_column.sort_by_key(|&id| diagram.frame(id).x_coord);
        for id in by_column {
            let level = diagram.frame(id).level;
            frame_levels[level].add_frame(id, diagram, ctx);
        }
        for level in &frame_levels {
            level.set_x(diagram, ctx);
        }

        let mut array_levels: Vec<ArrayLevel> = (0..depth_count).map(ArrayLevel::new).collect();
        place_arrays(diagram, ctx, &frame_levels, &mut array_levels);

        let mut grid = Grid {
            frame_levels,
            array_levels,
        };
        grid.compute_heights(diagram, ctx);
        for (i, level) in grid.frame_levels.iter_mut().enumerate() {
            level.set_y(ctx.row_y(2 * i), diagram, ctx);
        }
        for (i, level) in grid.array_levels.iter_mut().enumerate() {
            level.set_y(ctx.row_y(2 * i + 1), diagram, ctx);
        }

        tracing::debug!(
            levels = depth_count,
            columns = ctx.max_x_coord + 1,
            "grid placed"
        );
        grid
    }

    pub fn row_count(&self) -> usize {
        self.frame_levels.len() * 2
    }

    /// Fill `cum_heights`, one entry per row boundary
    fn compute_heights(&self, diagram: &Diagram, ctx: &mut LayoutContext) {
        let config = &ctx.config;
        let margin = config.frame_margin_y;
        let frame_extent: Vec<f64> = self
            .frame_levels
            .iter()
            .map(|l| if l.is_empty() { 0.0 } else { l.height() + margin })
            .collect();

        let mut heights = vec![0.0];
        for (i, arrays) in self.array_levels.iter().enumerate() {
            push_row(&mut heights, frame_extent[i]);

            let arrays_height = arrays.height(config);
            let extent = if arrays.is_empty() {
                0.0
            } else {
                match (self.frame_levels.get(i + 1), arrays.left()) {
                    // Arrays right of the whole next frame row share its height
                    (Some(next), Some(left)) if !next.is_empty() && left >= next.right(diagram) => {
                        (arrays_height + margin - frame_extent[i + 1]).max(0.0)
                    }
                    _ => arrays_height + margin,
                }
            };
            push_row(&mut heights, extent);
        }
        ctx.cum_heights = heights;
    }
}

fn push_row(heights: &mut Vec<f64>, extent: f64) {
    let last = heights.last().copied().unwrap_or(0.0);
    heights.push(last + extent);
}

/// Integer columns for every frame
fn assign_columns(diagram: &mut Diagram, ctx: &mut LayoutContext) {
    let n = diagram.frames.len();
    let mut rank = vec![0; n];
    for (r, id) in diagram.creation_order().iter().enumerate() {
        rank[id.0] = r;
    }
    // A frame created before its parent is held back until the parent is
    // placed, so columns are always read from an already placed parent
    let mut key = vec![0; n];
    for level in diagram.tree().levels() {
        for i in level {
            key[i] = match diagram.frames[i].parent {
                Some(p) => rank[i].max(key[p.0]),
                None => rank[i],
            };
        }
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| (key[i], diagram.frames[i].level, rank[i]));

    let depth_count = diagram.frames.iter().map(|f| f.level + 1).max().unwrap_or(0);
    let mut next_free = vec![0usize; depth_count];
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); depth_count];
    let mut placed = vec![false; n];

    for &i in &order {
        let level = diagram.frames[i].level;
        let parent_x = diagram.frames[i]
            .parent
            .map_or(0, |p| diagram.frames[p.0].x_coord);
        let x = next_free[level].max(parent_x);
        diagram.frames[i].x_coord = x;
        next_free[level] = x + 1;
        members[level].push(i);
        placed[i] = true;

        straighten(diagram, i, &mut next_free, &members, &placed);
    }

    ctx.max_x_coord = diagram.frames.iter().map(|f| f.x_coord).max().unwrap_or(0);
}

/// Move ancestors right above a first child that landed right of them
///
/// A parent only moves when nothing else on its level sits between its old
/// and new column and none of its placed children would end up left of it.
fn straighten(
    diagram: &mut Diagram,
    start: usize,
    next_free: &mut [usize],
    members: &[Vec<usize>],
    placed: &[bool],
) {
    let n = diagram.frames.len();
    let mut child = start;
    let mut steps = 0;
    while let Some(parent) = diagram.frames[child].parent {
        steps += 1;
        assert!(
            steps <= n,
            "straighten pass chased more ancestors than there are frames"
        );
        let target = diagram.frames[child].x_coord;
        let p = &diagram.frames[parent.0];
        if p.children.first() != Some(&FrameId(child)) || target <= p.x_coord {
            break;
        }
        let from = p.x_coord;
        let blocked = members[p.level].iter().any(|&m| {
            m != parent.0 && diagram.frames[m].x_coord > from && diagram.frames[m].x_coord <= target
        });
        let strands_child = p
            .children
            .iter()
            .any(|c| placed[c.0] && diagram.frames[c.0].x_coord < target);
        if blocked || strands_child {
            break;
        }
        let level = p.level;
        diagram.frames[parent.0].x_coord = target;
        next_free[level] = next_free[level].max(target + 1);
        tracing::trace!(frame = %diagram.frames[parent.0].env, from, to = target, "straightened");
        child = parent.0;
    }
}

/// Widen frames for closures drawn to the right of their box
fn measure_side_values(diagram: &mut Diagram, ctx: &LayoutContext) {
    let gap = ctx.config.fn_gap;
    for (i, binding) in diagram.bindings.iter().enumerate() {
        let value = &diagram.values[binding.value.0];
        if value.placement() == Placement::BesideFrame
            && value.is_main_reference(Reference::Binding(BindingId(i)))
        {
            diagram.frames[binding.frame.0].extend_total_width(gap + value.width());
        }
    }
}

/// Place every value drawn in an array row
///
/// Frames are visited row by row in column order and bindings in order;
/// an array's nested values are placed right after it, one lane further
/// down at the earliest.
fn place_arrays(
    diagram: &mut Diagram,
    ctx: &LayoutContext,
    frame_levels: &[FrameLevel],
    array_levels: &mut [ArrayLevel],
) {
    let config = &ctx.config;
    for frame_level in frame_levels {
        let level = frame_level.level;
        for &frame_id in &frame_level.frames {
            let binding_ids = diagram.frames[frame_id.0].bindings.clone();
            for binding_id in binding_ids {
                let binding = &diagram.bindings[binding_id.0];
                let value_id = binding.value;
                let value = &diagram.values[value_id.0];
                if value.placement() != Placement::ArrayRow
                    || !value.is_main_reference(Reference::Binding(binding_id))
                {
                    continue;
                }
                let x = binding.x() + binding.key.width;

                let mut pending = vec![(value_id, x, 0usize)];
                while let Some((id, x, parent_lane)) = pending.pop() {
                    let lane = array_levels[level].add_array(id, x, parent_lane, diagram, config);
                    let ValueKind::Array(array) = &diagram.values[id.0].kind else {
                        continue;
                    };
                    // Reversed so the first unit's value is placed first
                    for (index, unit_id) in array.units.iter().enumerate().rev() {
                        let unit = &diagram.units[unit_id.0];
                        let element = &diagram.values[unit.value.0];
                        if element.placement() == Placement::ArrayRow
                            && element.is_main_reference(Reference::Unit(*unit_id))
                        {
                            let unit_x = x + index as f64 * config.unit_width;
                            pending.push((unit.value, unit_x, lane));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::diagram::geometry::Point;
    use crate::snapshot::{EnvNode, HeapId, RawValue, Snapshot};

    fn layout(snapshot: &Snapshot) -> (Diagram, Grid, LayoutContext) {
        let config = LayoutConfig::bare();
        let mut diagram = Diagram::build(snapshot, &config).unwrap();
        let mut ctx = LayoutContext::new(config, Point::default());
        let grid = Grid::build(&mut diagram, &mut ctx);
        (diagram, grid, ctx)
    }

    fn columns(diagram: &Diagram) -> Vec<usize> {
        diagram.frames().iter().map(|f| f.x_coord).collect()
    }

    #[test]
    fn test_siblings_pack_left_to_right() {
        let (diagram, _, _) = layout(&Snapshot::new(vec![
            EnvNode::new("0", "global", None),
            EnvNode::new("1", "a", Some("0")),
            EnvNode::new("2", "b", Some("0")),
            EnvNode::new("3", "c", Some("0")),
        ]));
        assert_eq!(columns(&diagram), vec![0, 0, 1, 2]);
    }

    #[test]
    fn test_child_never_left_of_parent() {
        let (diagram, _, _) = layout(&Snapshot::new(vec![
            EnvNode::new("0", "global", None),
            EnvNode::new("1", "a", Some("0")),
            EnvNode::new("2", "b", Some("0")),
            EnvNode::new("3", "b1", Some("2")),
        ]));
        // b sits in column 1, so its child cannot take column 0
        assert_eq!(columns(&diagram), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_straighten_moves_parent_above_first_child() {
        let (diagram, _, _) = layout(&Snapshot::new(vec![
            EnvNode::new("0", "g", None),
            EnvNode::new("1", "a", Some("0")),
            EnvNode::new("2", "a1", Some("1")),
            EnvNode::new("3", "b", Some("0")),
            EnvNode::new("4", "b1", Some("3")),
            EnvNode::new("5", "b2", Some("3")),
            EnvNode::new("6", "c", None),
            EnvNode::new("7", "c1", Some("6")),
            EnvNode::new("8", "c11", Some("7")),
        ]));
        // c11 lands in column 3; c1 and then the second root c move right
        // above it since nothing else sits in their rows past them
        assert_eq!(columns(&diagram), vec![0, 0, 0, 1, 1, 2, 3, 3, 3]);
    }

    #[test]
    fn test_straighten_blocked_by_neighbour() {
        let (diagram, _, _) = layout(&Snapshot::new(vec![
            EnvNode::new("0", "global", None),
            EnvNode::new("1", "a", Some("0")),
            EnvNode::new("2", "b", Some("0")),
            EnvNode::new("3", "a1", Some("1")),
            EnvNode::new("4", "b1", Some("2")),
            EnvNode::new("5", "x", Some("4")),
            EnvNode::new("6", "y", Some("4")),
            EnvNode::new("7", "a1x", Some("3")),
        ]));
        // b1 sits between a1 and its first child, so a1 stays put
        let cols = columns(&diagram);
        assert_eq!(cols[7], 3);
        assert_eq!(cols[3], 0);
        assert_eq!(cols[1], 0);
    }

    #[test]
    fn test_rows_alternate_and_collapse() {
        let (diagram, grid, ctx) = layout(&Snapshot::new(vec![
            EnvNode::new("0", "global", None),
            EnvNode::new("1", "f", Some("0")),
        ]));
        assert_eq!(grid.row_count(), 4);
        let config = &ctx.config;
        let global = diagram.frame(FrameId(0));
        // Empty array row 0 adds nothing
        assert_eq!(ctx.cum_heights[1], global.total_height() + config.frame_margin_y);
        assert_eq!(ctx.cum_heights[2], ctx.cum_heights[1]);
        let f = diagram.frame(FrameId(1));
        assert_eq!(f.title_y(), ctx.cum_heights[2]);
    }

    #[test]
    fn test_array_row_below_its_frame() {
        let (diagram, grid, ctx) = layout(&Snapshot::new(vec![EnvNode::new(
            "0",
            "global",
            None,
        )
        .bind(
            "xs",
            RawValue::Array {
                id: HeapId(1),
                elements: vec![RawValue::Number { value: 1.0 }],
            },
        )]));
        let array = diagram.value_for_heap(HeapId(1)).unwrap();
        let value = diagram.value(array);
        let frame = diagram.frame(FrameId(0));
        assert_eq!(grid.array_levels[0].values, vec![array]);
        assert!(value.y() >= frame.bottom() + ctx.config.frame_margin_y);
        let binding = diagram.binding(frame.bindings[0]);
        assert_eq!(value.x(), binding.x() + binding.key.width);
        assert_eq!(diagram.units()[0].x(), value.x());
        assert_eq!(diagram.units()[0].y(), value.y());
    }

    #[test]
    fn test_nested_array_goes_one_lane_down() {
        let (diagram, grid, _) = layout(&Snapshot::new(vec![EnvNode::new(
            "0",
            "global",
            None,
        )
        .bind(
            "xs",
            RawValue::Array {
                id: HeapId(1),
                elements: vec![RawValue::Array {
                    id: HeapId(2),
                    elements: vec![RawValue::Number { value: 1.0 }],
                }],
            },
        )]));
        let outer = diagram.value(diagram.value_for_heap(HeapId(1)).unwrap());
        let inner = diagram.value(diagram.value_for_heap(HeapId(2)).unwrap());
        assert_eq!(outer.lane, Some(0));
        assert_eq!(inner.lane, Some(1));
        assert_eq!(inner.x(), outer.x());
        assert_eq!(grid.array_levels[0].lane_count(), 2);
        assert!(inner.y() > outer.y() + outer.height());
    }
}
