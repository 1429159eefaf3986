//! One row of frames sharing a tree depth

use super::LayoutContext;
use crate::diagram::{Diagram, FrameId, Placement, Reference};

#[derive(Debug, Clone)]
pub struct FrameLevel {
    pub level: usize,
    /// Frames ordered by grid column
    pub frames: Vec<FrameId>,
    y: f64,
    height: f64,
}

impl FrameLevel {
    pub fn new(level: usize) -> Self {
        FrameLevel {
            level,
            frames: Vec::new(),
            y: 0.0,
            height: 0.0,
        }
    }

    /// Append a frame and claim its column width
    ///
    /// Frames must arrive in increasing column order across all levels, so
    /// the cumulative width of every column left of this one is final.
    pub fn add_frame(&mut self, id: FrameId, diagram: &Diagram, ctx: &mut LayoutContext) {
        let frame = diagram.frame(id);
        ctx.claim_column(frame.x_coord, frame.total_width());
        self.height = self.height.max(frame.total_height());
        self.frames.push(id);
    }

    /// Tallest frame including its title
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Right edge of the widest extent in this row
    pub fn right(&self, diagram: &Diagram) -> f64 {
        self.frames
            .iter()
            .map(|&id| diagram.frame(id).extent().right())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Horizontal pass: frame and binding x, values drawn beside the frame
    pub(crate) fn set_x(&self, diagram: &mut Diagram, ctx: &LayoutContext) {
        let config = &ctx.config;
        for &id in &self.frames {
            let x = ctx.column_x(diagram.frames[id.0].x_coord);
            let frame = &mut diagram.frames[id.0];
            let y = frame.y();
            frame.set_position(x, y);
            for &binding in &diagram.frames[id.0].bindings {
                let b = &mut diagram.bindings[binding.0];
                let by = b.y();
                b.set_position(x + config.frame_padding_x, by);
            }
        }
    }

    /// Vertical pass, once the row's top is known
    pub(crate) fn set_y(&mut self, y: f64, diagram: &mut Diagram, ctx: &LayoutContext) {
        let config = &ctx.config;
        self.y = y;
        for &id in &self.frames {
            let frame = &mut diagram.frames[id.0];
            let box_y = y + frame.name.height;
            let x = frame.x();
            frame.set_position(x, box_y);
            let side_x = x + frame.width() + config.fn_gap;

            let mut binding_y = box_y + config.frame_padding_y;
            for &binding_id in &diagram.frames[id.0].bindings {
                let binding = &mut diagram.bindings[binding_id.0];
                let bx = binding.x();
                binding.set_position(bx, binding_y);
                binding.reset_total_width();
                binding_y += binding.height();

                let value = &mut diagram.values[binding.value.0];
                if value.placement() == Placement::BesideFrame
                    && value.is_main_reference(Reference::Binding(binding_id))
                {
                    let vy = binding.y() + (binding.height() - value.height()) / 2.0;
                    value.set_position(side_x, vy);
                    binding.cover_value_right(value.right());
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
    use crate::snapshot::{EnvNode, RawValue, Snapshot};

    #[test]
    fn test_add_frame_tracks_height_and_columns() {
        let config = LayoutConfig::bare();
        let snapshot = Snapshot::new(vec![
            EnvNode::new("0", "global", None),
            EnvNode::new("1", "f", Some("0"))
                .bind("a", RawValue::Number { value: 1.0 })
                .bind("b", RawValue::Number { value: 2.0 }),
        ]);
        let mut diagram = Diagram::build(&snapshot, &config).unwrap();
        diagram.frames[1].x_coord = 1;
        let mut ctx = LayoutContext::new(config.clone(), Point::default());

        let mut level = FrameLevel::new(0);
        level.add_frame(FrameId(0), &diagram, &mut ctx);
        level.add_frame(FrameId(1), &diagram, &mut ctx);

        let first = diagram.frame(FrameId(0)).total_width();
        assert_eq!(ctx.column_x(1), first + config.frame_margin_x);
        assert_eq!(level.height(), diagram.frame(FrameId(1)).total_height());
    }
}
