//! Visual values
//!
//! A [`Value`] is the drawn counterpart of one runtime value. Heap values are
//! shared: every binding or array unit holding the same allocation points at
//! the same [`Value`], which records all of them in `references`. The first
//! reference is the *main* reference: it decides where the value is drawn,
//! and every other reference only draws an arrow to that instance.
//!
//! # Variants
//!
//! - [`ValueKind::Primitive`]: numbers, strings, booleans, null, undefined;
//!   drawn as text inline, never shared
//! - [`ValueKind::Array`]: a row of [`ArrayUnit`](super::array::ArrayUnit)s
//! - [`ValueKind::Fn`]: a closure, drawn as two circles with an arrow to its
//!   enclosing frame
//! - [`ValueKind::GlobalFn`]: a predeclared function without an environment
//! - [`ValueKind::Unassigned`]: a declared but uninitialized name
//! - [`ValueKind::Continuation`]: a captured continuation

use super::array::ArrayValue;
use super::geometry::Rect;
use super::text::Text;
use super::{BindingId, UnitId};
use crate::config::LayoutConfig;
use crate::scene::NodeId;
use crate::snapshot::{EnvId, HeapId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub(crate) usize);

impl ValueId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Something that holds a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reference {
    Binding(BindingId),
    Unit(UnitId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveValue {
    pub text: Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnValue {
    pub heap: HeapId,
    /// Enclosing environment
    pub env: EnvId,
    pub params: Vec<String>,
    pub body: String,
    /// `(params) => body`, shown on hover
    pub label: Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalFnValue {
    pub heap: HeapId,
    pub name: Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationValue {
    pub heap: HeapId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Primitive(PrimitiveValue),
    Array(ArrayValue),
    Fn(FnValue),
    GlobalFn(GlobalFnValue),
    Unassigned(PrimitiveValue),
    Continuation(ContinuationValue),
}

/// Where a non-inline value ends up being drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Drawn as text inside its holder
    Inline,
    /// Drawn on the binding's row, to the right of the frame
    BesideFrame,
    /// Drawn in the array row below the frame row of its main reference
    ArrayRow,
}

#[derive(Debug, Clone)]
pub struct Value {
    pub kind: ValueKind,
    pub references: Vec<Reference>,
    rect: Rect,
    placed: bool,
    /// Array row and lane, once placed there
    pub level: Option<usize>,
    pub lane: Option<usize>,
    pub(crate) node: Option<NodeId>,
}

impl Value {
    pub fn new(kind: ValueKind, config: &LayoutConfig) -> Self {
        let (width, height) = natural_size(&kind, config);
        Value {
            kind,
            references: Vec::new(),
            rect: Rect::new(0.0, 0.0, width, height),
            placed: false,
            level: None,
            lane: None,
            node: None,
        }
    }

    pub fn add_reference(&mut self, reference: Reference) {
        self.references.push(reference);
    }

    /// The reference deciding where this value is drawn
    pub fn main_reference(&self) -> Option<Reference> {
        self.references.first().copied()
    }

    pub fn is_main_reference(&self, reference: Reference) -> bool {
        self.main_reference() == Some(reference)
    }

    pub fn heap_id(&self) -> Option<HeapId> {
        match &self.kind {
            ValueKind::Array(array) => Some(array.heap),
            ValueKind::Fn(f) => Some(f.heap),
            ValueKind::GlobalFn(f) => Some(f.heap),
            ValueKind::Continuation(c) => Some(c.heap),
            ValueKind::Primitive(_) | ValueKind::Unassigned(_) => None,
        }
    }

    pub fn inline_text(&self) -> Option<&Text> {
        match &self.kind {
            ValueKind::Primitive(p) | ValueKind::Unassigned(p) => Some(&p.text),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match &self.kind {
            ValueKind::Array(array) => Some(array),
            _ => None,
        }
    }

    /// How the value is placed given its main reference
    pub fn placement(&self) -> Placement {
        match (&self.kind, self.main_reference()) {
            (ValueKind::Primitive(_) | ValueKind::Unassigned(_), _) => Placement::Inline,
            (ValueKind::Array(_), _) => Placement::ArrayRow,
            (_, Some(Reference::Unit(_))) => Placement::ArrayRow,
            _ => Placement::BesideFrame,
        }
    }

    /// Size adjustment after the units of an array are known
    pub(crate) fn set_size(&mut self, width: f64, height: f64) {
        self.rect.width = width;
        self.rect.height = height;
    }

    /// Set the drawn position; placing twice at the same spot is a no-op
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.rect.x = x;
        self.rect.y = y;
        self.placed = true;
    }

    pub(crate) fn set_x(&mut self, x: f64) {
        self.rect.x = x;
    }

    pub(crate) fn set_y(&mut self, y: f64) {
        self.rect.y = y;
        self.placed = true;
    }

    pub fn is_placed(&self) -> bool {
        self.placed
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

    pub fn right(&self) -> f64 {
        self.rect.right()
    }

    /// Short human readable description, used in logs and errors
    pub fn describe(&self) -> String {
        match &self.kind {
            ValueKind::Primitive(p) => p.text.full.clone(),
            ValueKind::Unassigned(_) => "unassigned".to_string(),
            ValueKind::Array(array) => format!("array {}", array.heap),
            ValueKind::Fn(f) => format!("closure {}", f.heap),
            ValueKind::GlobalFn(f) => format!("builtin {}", f.name.full),
            ValueKind::Continuation(c) => format!("continuation {}", c.heap),
        }
    }
}

fn natural_size(kind: &ValueKind, config: &LayoutConfig) -> (f64, f64) {
    match kind {
        ValueKind::Primitive(p) | ValueKind::Unassigned(p) => (p.text.width, p.text.height),
        // Arrays are resized once their units exist
        ValueKind::Array(_) => (config.unit_width, config.unit_height),
        ValueKind::Fn(_) | ValueKind::GlobalFn(_) | ValueKind::Continuation(_) => {
            (config.fn_radius * 4.0, config.fn_radius * 2.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closure(config: &LayoutConfig) -> Value {
        Value::new(
            ValueKind::Fn(FnValue {
                heap: HeapId(1),
                env: EnvId::new("0"),
                params: vec!["n".to_string()],
                body: "n".to_string(),
                label: Text::new("(n) => n", config),
            }),
            config,
        )
    }

    #[test]
    fn test_first_reference_is_main() {
        let config = LayoutConfig::default();
        let mut value = closure(&config);
        value.add_reference(Reference::Binding(BindingId(4)));
        value.add_reference(Reference::Unit(UnitId(0)));
        assert_eq!(value.main_reference(), Some(Reference::Binding(BindingId(4))));
        assert!(!value.is_main_reference(Reference::Unit(UnitId(0))));
        assert_eq!(value.placement(), Placement::BesideFrame);
    }

    #[test]
    fn test_closure_in_unit_goes_to_array_row() {
        let config = LayoutConfig::default();
        let mut value = closure(&config);
        value.add_reference(Reference::Unit(UnitId(2)));
        assert_eq!(value.placement(), Placement::ArrayRow);
    }

    #[test]
    fn test_position_is_idempotent() {
        let config = LayoutConfig::default();
        let mut value = closure(&config);
        value.set_position(10.0, 20.0);
        let first = value.rect();
        value.set_position(10.0, 20.0);
        assert_eq!(value.rect(), first);
        assert!(value.is_placed());
        assert_eq!(value.width(), config.fn_radius * 4.0);
    }
}
