//! Raw runtime values as emitted by the evaluator
//!
//! Heap objects (arrays, closures, builtins, continuations) carry the
//! allocation id the evaluator assigned them. Structurally shared data repeats
//! the same id, and a [`RawValue::Ref`] may stand in for any heap object
//! defined elsewhere in the same snapshot. This is what makes cyclic data
//! expressible in a tree-shaped file.

use serde::Deserialize;
use std::fmt;

/// Allocation id of a heap object, unique within one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct HeapId(pub u64);

impl fmt::Display for HeapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawValue {
    Number {
        value: f64,
    },
    String {
        value: String,
    },
    Boolean {
        value: bool,
    },
    Null,
    Undefined,
    Array {
        id: HeapId,
        #[serde(default)]
        elements: Vec<RawValue>,
    },
    Closure {
        id: HeapId,
        /// Id of the enclosing environment
        env: String,
        #[serde(default)]
        params: Vec<String>,
        #[serde(default)]
        body: String,
    },
    /// A predeclared function with no enclosing environment
    Builtin {
        id: HeapId,
        name: String,
    },
    /// A name declared but not yet initialized
    Unassigned,
    Continuation {
        id: HeapId,
    },
    Ref {
        id: HeapId,
    },
}

impl RawValue {
    /// Allocation id for heap objects (including references to them)
    pub fn heap_id(&self) -> Option<HeapId> {
        match self {
            RawValue::Array { id, .. }
            | RawValue::Closure { id, .. }
            | RawValue::Builtin { id, .. }
            | RawValue::Continuation { id }
            | RawValue::Ref { id } => Some(*id),
            _ => None,
        }
    }

    /// Whether this value is a definition of a heap object (not a reference)
    pub fn is_heap_definition(&self) -> bool {
        !matches!(self, RawValue::Ref { .. }) && self.heap_id().is_some()
    }

    /// Whether the value is drawn as plain text next to whoever holds it
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            RawValue::Number { .. }
                | RawValue::String { .. }
                | RawValue::Boolean { .. }
                | RawValue::Null
                | RawValue::Undefined
        )
    }

    /// Text used when the value is drawn inline
    pub fn display_text(&self) -> String {
        match self {
            RawValue::Number { value } => format_number(*value),
            RawValue::String { value } => format!("\"{}\"", value),
            RawValue::Boolean { value } => value.to_string(),
            RawValue::Null => "null".to_string(),
            RawValue::Undefined => "undefined".to_string(),
            RawValue::Array { elements, .. } => format!("[{} items]", elements.len()),
            RawValue::Closure { params, .. } => format!("({}) => ...", params.join(", ")),
            RawValue::Builtin { name, .. } => format!("{}(...)", name),
            RawValue::Unassigned => "unassigned".to_string(),
            RawValue::Continuation { .. } => "continuation".to_string(),
            RawValue::Ref { id } => format!("ref {}", id),
        }
    }

    /// Visit every nested value, depth first, including `self`
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a RawValue)) {
        visit(self);
        if let RawValue::Array { elements, .. } = self {
            for element in elements {
                element.walk(visit);
            }
        }
    }
}

/// Integers print without a fractional part
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_deserialize() {
        let raw: RawValue = serde_json::from_str(
            r#"{ "kind": "array", "id": 3, "elements": [ { "kind": "number", "value": 1 }, { "kind": "ref", "id": 3 } ] }"#,
        )
        .unwrap();
        match &raw {
            RawValue::Array { id, elements } => {
                assert_eq!(*id, HeapId(3));
                assert_eq!(elements.len(), 2);
                assert_eq!(elements[1], RawValue::Ref { id: HeapId(3) });
            }
            other => panic!("Expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_display_text() {
        assert_eq!(RawValue::Number { value: 3.0 }.display_text(), "3");
        assert_eq!(RawValue::Number { value: 2.5 }.display_text(), "2.5");
        assert_eq!(
            RawValue::String {
                value: "hi".to_string()
            }
            .display_text(),
            "\"hi\""
        );
        assert_eq!(RawValue::Null.display_text(), "null");
    }

    #[test]
    fn test_walk_visits_nested() {
        let raw = RawValue::Array {
            id: HeapId(1),
            elements: vec![RawValue::Array {
                id: HeapId(2),
                elements: vec![RawValue::Null],
            }],
        };
        let mut ids = Vec::new();
        raw.walk(&mut |v| {
            if let Some(id) = v.heap_id() {
                ids.push(id.0);
            }
        });
        assert_eq!(ids, vec![1, 2]);
    }
}
