//! Control column and stash row
//!
//! The control is drawn as a column along the left edge with the top of the
//! stack first. The stash is a row along the top, right of the control, with
//! the bottom of the stack leftmost. The frame grid starts below the stash.

use crate::config::LayoutConfig;
use crate::diagram::geometry::{Point, Rect};
use crate::diagram::{Diagram, Text, ValueId};
use crate::scene::NodeId;
use crate::snapshot::{ControlItem, Snapshot};

#[derive(Debug, Clone)]
pub struct ControlBox {
    /// Position in the stack, counted from the bottom
    pub index: usize,
    pub text: Text,
    pub is_instruction: bool,
    pub is_literal: bool,
    /// Name this item assigns to when it runs
    pub assigns: Option<String>,
    /// Name this item reads when it runs
    pub looks_up: Option<String>,
    rect: Rect,
    pub(crate) node: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct StashBox {
    /// Position in the stack, counted from the bottom
    pub index: usize,
    pub text: Text,
    /// Heap value this item points at, when it is drawn in the diagram
    pub value: Option<ValueId>,
    rect: Rect,
    pub(crate) node: Option<NodeId>,
}

macro_rules! geometry_accessors {
    ($ty:ty) => {
        impl $ty {
            pub fn rect(&self) -> Rect {
                self.rect
            }

            pub fn x(&self) -> f64 {
                self.rect.x
            }

            pub fn y(&self) -> f64 {
                self.rect.y
            }

            pub fn width(&self) -> f64 {
                self.rect.width
            }

            pub fn height(&self) -> f64 {
                self.rect.height
            }
        }
    };
}

geometry_accessors!(ControlBox);
geometry_accessors!(StashBox);

#[derive(Debug, Clone, Default)]
pub struct Machine {
    /// Top of the stack first
    pub control: Vec<ControlBox>,
    /// Bottom of the stack first
    pub stash: Vec<StashBox>,
    grid_origin: Point,
}

impl Machine {
    pub fn build(snapshot: &Snapshot, diagram: &Diagram, config: &LayoutConfig) -> Machine {
        let padding = config.canvas_padding;
        if !config.shows_machine() {
            return Machine {
                grid_origin: Point::new(padding, padding),
                ..Machine::default()
            };
        }

        let item_height = config.unit_height;
        let control = snapshot
            .control
            .iter()
            .enumerate()
            .rev()
            .enumerate()
            .map(|(row, (index, item))| ControlBox {
                index,
                text: Text::new(item.display_text(), config),
                is_instruction: item.is_instruction(),
                is_literal: matches!(item, ControlItem::Literal { .. }),
                assigns: item.assigned_symbol().map(str::to_string),
                looks_up: item.looked_up_symbol().map(str::to_string),
                rect: Rect::new(
                    padding,
                    padding + row as f64 * item_height,
                    config.control_width,
                    item_height,
                ),
                node: None,
            })
            .collect();

        let stash_left = padding + config.control_width + config.frame_margin_x;
        let mut x = stash_left;
        let stash = snapshot
            .stash
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let text = Text::new(item.display_text(), config);
                let width = config
                    .stash_item_min_width
                    .max(text.width + 2.0 * config.char_width);
                let rect = Rect::new(x, padding, width, item_height);
                x += width + config.char_width;
                StashBox {
                    index,
                    value: item.value.heap_id().and_then(|h| diagram.value_for_heap(h)),
                    text,
                    rect,
                    node: None,
                }
            })
            .collect();

        Machine {
            control,
            stash,
            grid_origin: Point::new(stash_left, padding + item_height + config.frame_margin_y),
        }
    }

    /// Top-left corner of the frame grid
    pub fn grid_origin(&self) -> Point {
        self.grid_origin
    }

    /// Bottom edge of the stash row
    pub fn stash_bottom(&self) -> Option<f64> {
        self.stash.iter().map(|s| s.rect.bottom()).reduce(f64::max)
    }

    pub fn control_top(&self) -> Option<&ControlBox> {
        self.control.first()
    }

    pub fn stash_top(&self) -> Option<&StashBox> {
        self.stash.last()
    }

    /// Union of every item box
    pub fn extent(&self) -> Option<Rect> {
        self.control
            .iter()
            .map(|c| c.rect)
            .chain(self.stash.iter().map(|s| s.rect))
            .reduce(|a, b| a.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{EnvNode, HeapId, RawValue, StashItem};

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::new(vec![EnvNode::new("0", "global", None).bind(
            "xs",
            RawValue::Array {
                id: HeapId(4),
                elements: Vec::new(),
            },
        )]);
        snapshot.control = vec![
            ControlItem::Instruction {
                name: "pop".to_string(),
                symbol: None,
                text: None,
            },
            ControlItem::Literal {
                value: RawValue::Number { value: 2.0 },
            },
        ];
        snapshot.stash = vec![
            StashItem::new(RawValue::Number { value: 1.0 }),
            StashItem::new(RawValue::Ref { id: HeapId(4) }),
        ];
        snapshot
    }

    #[test]
    fn test_control_top_first() {
        let config = LayoutConfig::default();
        let snapshot = snapshot();
        let diagram = Diagram::build(&snapshot, &config).unwrap();
        let machine = Machine::build(&snapshot, &diagram, &config);
        assert_eq!(machine.control[0].text.content, "2");
        assert_eq!(machine.control[0].index, 1);
        assert!(machine.control[1].is_instruction);
        assert!(machine.control[1].y() > machine.control[0].y());
    }

    #[test]
    fn test_stash_bottom_first_and_linked() {
        let config = LayoutConfig::default();
        let snapshot = snapshot();
        let diagram = Diagram::build(&snapshot, &config).unwrap();
        let machine = Machine::build(&snapshot, &diagram, &config);
        assert_eq!(machine.stash[0].text.content, "1");
        assert!(machine.stash[1].x() > machine.stash[0].x());
        assert_eq!(machine.stash[1].value, diagram.value_for_heap(HeapId(4)));
        assert!(machine.grid_origin().y > machine.stash_bottom().unwrap());
        assert!(machine.grid_origin().x > machine.control[0].rect().right());
    }

    #[test]
    fn test_bare_config_has_no_machine() {
        let config = LayoutConfig::bare();
        let snapshot = snapshot();
        let diagram = Diagram::build(&snapshot, &config).unwrap();
        let machine = Machine::build(&snapshot, &diagram, &config);
        assert!(machine.control.is_empty() && machine.stash.is_empty());
        assert_eq!(machine.grid_origin(), Point::new(0.0, 0.0));
    }
}
