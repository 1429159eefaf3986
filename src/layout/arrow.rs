//! Orthogonal arrow routing
//!
//! Every arrow is a polyline of horizontal and vertical segments. Arrows
//! that cross a margin bend inside it at the offset [`ArrowLanes`] hands out
//! for their target, so arrows to different targets run side by side instead
//! of on top of each other.
//!
//! # Arrow kinds
//!
//! - frame to parent frame: up from the child's box top into the margin above
//!   the child row, across, and up into the parent's right half
//! - binding to value: straight down for an array the binding places, a short
//!   horizontal line for a closure beside the frame, otherwise out through the
//!   margin right of the frame and into the target from above or below
//! - array unit to element: down from the unit's center
//! - closure to enclosing frame: up from the closure's right circle and down
//!   onto the frame's top right corner
//! - stash item to heap value: down from the item into the value's top

use super::arrow_lane::{ArrowLanes, LaneTarget};
use super::machine::Machine;
use super::LayoutContext;
use crate::diagram::geometry::Point;
use crate::diagram::{BindingId, Diagram, FrameId, Placement, Reference, UnitId, ValueId, ValueKind};
use crate::scene::NodeId;
use crate::snapshot::{EnvId, HeapId};

/// Stable identity of an arrow across snapshots
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArrowKey {
    FrameParent(EnvId),
    Binding(EnvId, String),
    Unit(HeapId, usize),
    FnEnv(HeapId),
    Stash(usize),
}

#[derive(Debug, Clone)]
pub struct Arrow {
    pub key: ArrowKey,
    pub points: Vec<Point>,
    pub(crate) node: Option<NodeId>,
}

impl Arrow {
    fn new(key: ArrowKey, points: Vec<Point>) -> Self {
        Arrow {
            key,
            points: simplify(points),
            node: None,
        }
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Whether every segment is horizontal or vertical
    pub fn is_orthogonal(&self) -> bool {
        self.points
            .windows(2)
            .all(|w| w[0].x == w[1].x || w[0].y == w[1].y)
    }
}

/// Drop repeated points and the middle of straight runs
fn simplify(points: Vec<Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last() == Some(&p) {
            continue;
        }
        if out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            if (a.x == b.x && b.x == p.x) || (a.y == b.y && b.y == p.y) {
                out.pop();
            }
        }
        out.push(p);
    }
    out
}

/// Route every arrow of a placed diagram
pub fn route_all(diagram: &Diagram, machine: &Machine, ctx: &mut LayoutContext) -> Vec<Arrow> {
    let mut router = Router {
        diagram,
        ctx,
        arrows: Vec::new(),
    };
    for &id in diagram.creation_order() {
        router.frame_to_parent(id);
    }
    for (i, binding) in diagram.bindings().iter().enumerate() {
        if !binding.is_inline() {
            router.binding_to_value(BindingId(i));
        }
    }
    for (i, unit) in diagram.units().iter().enumerate() {
        if unit.content.is_none() {
            router.unit_to_value(UnitId(i));
        }
    }
    for (i, value) in diagram.values().iter().enumerate() {
        if value.is_placed() {
            if let ValueKind::Fn(f) = &value.kind {
                if let Some(frame) = diagram.frame_for(&f.env) {
                    router.fn_to_env(ValueId(i), f.heap, frame);
                }
            }
        }
    }
    if let Some(stash_bottom) = machine.stash_bottom() {
        for item in &machine.stash {
            if let Some(value) = item.value {
                let from = Point::new(item.x() + item.width() / 2.0, item.rect().bottom());
                router.stash_to_value(item.index, from, stash_bottom, value);
            }
        }
    }
    tracing::debug!(arrows = router.arrows.len(), "arrows routed");
    router.arrows
}

struct Router<'a> {
    diagram: &'a Diagram,
    ctx: &'a mut LayoutContext,
    arrows: Vec<Arrow>,
}

impl Router<'_> {
    fn lanes(&mut self) -> &mut ArrowLanes {
        &mut self.ctx.lanes
    }

    fn frame_to_parent(&mut self, id: FrameId) {
        let diagram = self.diagram;
        let child = diagram.frame(id);
        let Some(parent_id) = child.parent else {
            return;
        };
        let parent = diagram.frame(parent_id);
        let config = self.ctx.config.clone();

        let start = Point::new(child.right() - config.frame_padding_x, child.y());
        let row_top = self.ctx.row_y(2 * child.level);
        let hy = self.lanes().horizontal(
            row_top - config.frame_margin_y,
            config.frame_margin_y,
            LaneTarget::Frame(parent_id),
            &config,
        );
        let half = parent.width() / 2.0;
        let vx = self.lanes().vertical(
            parent.x() + half,
            half,
            LaneTarget::Frame(parent_id),
            &config,
        );
        self.arrows.push(Arrow::new(
            ArrowKey::FrameParent(child.env.clone()),
            vec![
                start,
                Point::new(start.x, hy),
                Point::new(vx, hy),
                Point::new(vx, parent.bottom()),
            ],
        ));
    }

    fn binding_to_value(&mut self, id: BindingId) {
        let diagram = self.diagram;
        let config = self.ctx.config.clone();
        let binding = diagram.binding(id);
        let value = diagram.value(binding.value);
        if !value.is_placed() {
            return;
        }
        let frame = diagram.frame(binding.frame);
        let key = ArrowKey::Binding(frame.env.clone(), binding.name.clone());
        let start = binding.anchor(&config);

        let points = if value.is_main_reference(Reference::Binding(id)) {
            match value.placement() {
                Placement::BesideFrame => vec![start, Point::new(value.x(), start.y)],
                // The value sits right below, starting under the key
                _ => vec![start, Point::new(start.x, value.y())],
            }
        } else {
            let vx = self.lanes().vertical(
                frame.x() + frame.total_width(),
                config.frame_margin_x,
                LaneTarget::Value(binding.value),
                &config,
            );
            let mut points = vec![start, Point::new(vx, start.y)];
            points.extend(self.approach(binding.value, vx, start.y));
            points
        };
        self.arrows.push(Arrow::new(key, points));
    }

    fn unit_to_value(&mut self, id: UnitId) {
        let diagram = self.diagram;
        let unit = diagram.unit(id);
        let value = diagram.value(unit.value);
        let Some(heap) = diagram.value(unit.array).heap_id() else {
            return;
        };
        if !value.is_placed() || !diagram.value(unit.array).is_placed() {
            return;
        }
        let key = ArrowKey::Unit(heap, unit.index);
        let center = unit.anchor();

        let points = if unit.is_main_reference && value.y() > unit.rect().bottom() {
            vec![center, Point::new(center.x, value.y())]
        } else if value.y() > unit.rect().bottom() {
            let mut points = vec![center];
            points.extend(self.approach(unit.value, center.x, center.y));
            points
        } else {
            // Up and out of the unit's top into the target from below
            let start = Point::new(center.x, unit.y());
            let mut points = vec![start];
            points.extend(self.approach(unit.value, start.x, start.y));
            points
        };
        self.arrows.push(Arrow::new(key, points));
    }

    fn fn_to_env(&mut self, id: ValueId, heap: HeapId, frame_id: FrameId) {
        let diagram = self.diagram;
        let config = self.ctx.config.clone();
        let value = diagram.value(id);
        let frame = diagram.frame(frame_id);
        let start = Point::new(value.x() + 3.0 * config.fn_radius, value.y());
        let end = Point::new(frame.right() - config.frame_padding_x / 2.0, frame.y());
        let hy = self.lanes().horizontal(
            frame.title_y(),
            frame.name.height,
            LaneTarget::Frame(frame_id),
            &config,
        );
        self.arrows.push(Arrow::new(
            ArrowKey::FnEnv(heap),
            vec![
                start,
                Point::new(start.x, hy),
                Point::new(end.x, hy),
                end,
            ],
        ));
    }

    fn stash_to_value(&mut self, index: usize, start: Point, stash_bottom: f64, id: ValueId) {
        let diagram = self.diagram;
        let config = self.ctx.config.clone();
        let value = diagram.value(id);
        if !value.is_placed() {
            return;
        }
        let span = (self.ctx.origin.y - stash_bottom).max(0.0);
        let hy = self
            .lanes()
            .horizontal(stash_bottom, span, LaneTarget::Value(id), &config);
        let end = Point::new(value.x() + entry_inset(value.width(), config.char_width), value.y());
        self.arrows.push(Arrow::new(
            ArrowKey::Stash(index),
            vec![start, Point::new(start.x, hy), Point::new(end.x, hy), end],
        ));
    }

    /// Path from `(x, y)` into a value: a horizontal lane next to the value,
    /// then straight into its top when coming from above, its bottom otherwise
    fn approach(&mut self, id: ValueId, x: f64, y: f64) -> Vec<Point> {
        let diagram = self.diagram;
        let config = self.ctx.config.clone();
        let value = diagram.value(id);
        let entry_x = value.x() + entry_inset(value.width(), config.char_width);
        let target = LaneTarget::Value(id);

        let from_above = y < value.y();
        let (hy, end_y) = match (value.level, value.lane, from_above) {
            (Some(level), Some(lane), true) => {
                let top = self.ctx.row_y(2 * level + 1)
                    + lane as f64 * (config.unit_height + config.array_lane_gap);
                let hy = self
                    .lanes()
                    .horizontal(top, value.y() - top, target, &config);
                (hy, value.y())
            }
            (Some(_), Some(_), false) => {
                let hy = self.lanes().horizontal(
                    value.y() + value.height(),
                    config.array_lane_gap,
                    target,
                    &config,
                );
                (hy, value.y() + value.height())
            }
            // Beside a frame: through the owning frame's title band
            _ => {
                let band = value
                    .main_reference()
                    .and_then(|r| diagram.owning_frame(r))
                    .map(|f| diagram.frame(f));
                let hy = match band {
                    Some(frame) => self.lanes().horizontal(
                        frame.title_y(),
                        frame.name.height,
                        target,
                        &config,
                    ),
                    None => value.y() - config.line_height / 2.0,
                };
                (hy, value.y())
            }
        };
        vec![
            Point::new(x, hy),
            Point::new(entry_x, hy),
            Point::new(entry_x, end_y),
        ]
    }
}

/// How far into a target's left edge arrows land
fn entry_inset(width: f64, char_width: f64) -> f64 {
    char_width.min(width / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplify_drops_duplicates_and_straight_runs() {
        let points = simplify(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(0.0, 10.0),
            Point::new(4.0, 10.0),
        ]);
        assert_eq!(
            points,
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 10.0),
                Point::new(4.0, 10.0)
            ]
        );
    }

    #[test]
    fn test_orthogonal_check() {
        let arrow = Arrow::new(
            ArrowKey::Stash(0),
            vec![Point::new(0.0, 0.0), Point::new(0.0, 3.0), Point::new(2.0, 3.0)],
        );
        assert!(arrow.is_orthogonal());
        assert_eq!(arrow.end(), Some(Point::new(2.0, 3.0)));
    }
}
