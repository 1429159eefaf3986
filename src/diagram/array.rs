//! Arrays and their units
//!
//! An array is a boxed row of units. Primitive elements are drawn as text
//! inside their unit; every other element is drawn elsewhere and the unit
//! draws an arrow to it. An empty array is drawn as a single placeholder unit.

use super::geometry::{Point, Rect};
use super::text::Text;
use super::value::ValueId;
use crate::config::LayoutConfig;
use crate::scene::NodeId;
use crate::snapshot::HeapId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub heap: HeapId,
    pub units: Vec<UnitId>,
}

impl ArrayValue {
    pub fn new(heap: HeapId) -> Self {
        ArrayValue {
            heap,
            units: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Drawn width; an empty array still takes one unit
    pub fn width(&self, config: &LayoutConfig) -> f64 {
        self.units.len().max(1) as f64 * config.unit_width
    }
}

/// One cell of an array
#[derive(Debug, Clone)]
pub struct ArrayUnit {
    pub array: ValueId,
    pub index: usize,
    pub value: ValueId,
    pub is_first: bool,
    pub is_last: bool,
    /// Whether this unit is the main reference of its element
    pub is_main_reference: bool,
    /// Text for primitive elements
    pub content: Option<Text>,
    rect: Rect,
    pub(crate) node: Option<NodeId>,
}

impl ArrayUnit {
    pub fn new(array: ValueId, index: usize, value: ValueId, config: &LayoutConfig) -> Self {
        ArrayUnit {
            array,
            index,
            value,
            is_first: index == 0,
            is_last: false,
            is_main_reference: false,
            content: None,
            rect: Rect::new(0.0, 0.0, config.unit_width, config.unit_height),
            node: None,
        }
    }

    /// Position the unit from its array's top-left corner
    pub(crate) fn place_in(&mut self, array_x: f64, array_y: f64) {
        self.rect.x = array_x + self.index as f64 * self.rect.width;
        self.rect.y = array_y;
    }

    /// Where an outgoing arrow starts
    pub fn anchor(&self) -> Point {
        self.rect.center()
    }

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_array_takes_one_unit() {
        let config = LayoutConfig::default();
        let array = ArrayValue::new(HeapId(1));
        assert!(array.is_empty());
        assert_eq!(array.width(&config), config.unit_width);
    }

    #[test]
    fn test_unit_placement() {
        let config = LayoutConfig::default();
        let mut unit = ArrayUnit::new(ValueId(0), 2, ValueId(1), &config);
        unit.place_in(100.0, 40.0);
        assert_eq!(unit.x(), 100.0 + 2.0 * config.unit_width);
        assert_eq!(unit.y(), 40.0);
        assert!(!unit.is_first);
    }
}
