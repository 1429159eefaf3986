//! Control and stash items
//!
//! Both stacks are listed bottom first, the way the evaluator pushes them.

use super::raw::RawValue;
use serde::Deserialize;

/// One entry of the control stack
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlItem {
    /// A machine instruction such as `asgn x`, `pop` or `call 2`
    Instruction {
        name: String,
        /// The name an assignment instruction writes to
        #[serde(default)]
        symbol: Option<String>,
        #[serde(default)]
        text: Option<String>,
    },
    /// A program fragment still to be evaluated
    Expression {
        text: String,
        /// Set when the whole expression is a single identifier
        #[serde(default)]
        identifier: Option<String>,
    },
    Literal {
        value: RawValue,
    },
}

impl ControlItem {
    /// Text drawn in the control column
    pub fn display_text(&self) -> String {
        match self {
            ControlItem::Instruction { name, symbol, text } => match (text, symbol) {
                (Some(text), _) => text.clone(),
                (None, Some(symbol)) => format!("{} {}", name, symbol),
                (None, None) => name.clone(),
            },
            ControlItem::Expression { text, .. } => text.clone(),
            ControlItem::Literal { value } => value.display_text(),
        }
    }

    pub fn is_instruction(&self) -> bool {
        matches!(self, ControlItem::Instruction { .. })
    }

    /// Name written by an assignment instruction
    pub fn assigned_symbol(&self) -> Option<&str> {
        match self {
            ControlItem::Instruction {
                name,
                symbol: Some(symbol),
                ..
            } if is_assignment(name) => Some(symbol),
            _ => None,
        }
    }

    /// Name read by an identifier expression
    pub fn looked_up_symbol(&self) -> Option<&str> {
        match self {
            ControlItem::Expression {
                identifier: Some(identifier),
                ..
            } => Some(identifier),
            _ => None,
        }
    }
}

fn is_assignment(name: &str) -> bool {
    matches!(name, "asgn" | "assign" | "assignment")
}

/// One entry of the stash (operand stack)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct StashItem {
    pub value: RawValue,
}

impl StashItem {
    pub fn new(value: RawValue) -> Self {
        StashItem { value }
    }

    pub fn display_text(&self) -> String {
        self.value.display_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_text() {
        let item: ControlItem =
            serde_json::from_str(r#"{ "kind": "instruction", "name": "asgn", "symbol": "x" }"#)
                .unwrap();
        assert_eq!(item.display_text(), "asgn x");
        assert_eq!(item.assigned_symbol(), Some("x"));
        assert_eq!(item.looked_up_symbol(), None);
    }

    #[test]
    fn test_identifier_expression() {
        let item: ControlItem =
            serde_json::from_str(r#"{ "kind": "expression", "text": "n", "identifier": "n" }"#)
                .unwrap();
        assert_eq!(item.looked_up_symbol(), Some("n"));
        assert!(!item.is_instruction());
    }

    #[test]
    fn test_stash_item_is_transparent() {
        let item: StashItem =
            serde_json::from_str(r#"{ "kind": "boolean", "value": true }"#).unwrap();
        assert_eq!(item.display_text(), "true");
    }
}
