//! Error types
//!
//! Three families, one per concern:
//!
//! - [`LayoutError`]: structural invariant violations in a snapshot. These are
//!   fatal for the snapshot being laid out and are surfaced to the viewer's
//!   error state, never replaced by a default.
//! - [`AnimationError`]: recoverable by the caller (draw before animating).
//! - [`TraceError`]: loading a trace file.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// A name that must be bound somewhere in the environment chain is not
    #[error("binding '{name}' not found in environment chain [{}]", chain.join(" -> "))]
    MissingBinding { name: String, chain: Vec<String> },

    /// An environment names a parent that is not part of the snapshot
    #[error("environment '{env}' has unknown parent '{parent}'")]
    UnknownParent { env: String, parent: String },

    /// Following parent links from an environment returned to it
    #[error("environment '{env}' is part of a parent cycle")]
    CyclicEnvironment { env: String },

    #[error("environment id '{env}' appears more than once")]
    DuplicateEnvironment { env: String },

    /// A `ref` value points at a heap object never defined in the snapshot
    #[error("reference to undefined heap object #{id}")]
    UnknownHeapRef { id: u64 },

    #[error("environment '{env}' is not part of the snapshot")]
    UnknownEnvironment { env: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationError {
    /// The proxy's scene node has not been drawn yet
    #[error("cannot animate '{entity}': it has not been drawn yet, call draw() before animating")]
    NodeNotDrawn { entity: String },
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed trace: {0}")]
    Json(#[from] serde_json::Error),

    #[error("trace contains no snapshots")]
    Empty,

    #[error("snapshot history limit exceeded: {current} + {requested} > {limit} bytes")]
    HistoryLimitExceeded {
        current: usize,
        requested: usize,
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binding_message_lists_chain() {
        let err = LayoutError::MissingBinding {
            name: "x".to_string(),
            chain: vec!["f".to_string(), "program".to_string(), "global".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "binding 'x' not found in environment chain [f -> program -> global]"
        );
    }

    #[test]
    fn test_not_drawn_message_mentions_draw() {
        let err = AnimationError::NodeNotDrawn {
            entity: "frame f".to_string(),
        };
        assert!(err.to_string().contains("draw()"));
    }
}
