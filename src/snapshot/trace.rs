//! Trace files
//!
//! A trace is the JSON record of a whole run:
//!
//! ```text
//! {
//!   "config": { "frame_margin_x": 40 },      // optional LayoutConfig overrides
//!   "snapshots": [ { "environments": [...], "current_env": "3",
//!                    "control": [...], "stash": [...] }, ... ]
//! }
//! ```

use super::Snapshot;
use crate::config::LayoutConfig;
use crate::error::TraceError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub config: LayoutConfig,
    pub snapshots: Vec<Snapshot>,
}

impl Trace {
    pub fn from_json(source: &str) -> Result<Self, TraceError> {
        let trace: Trace = serde_json::from_str(source)?;
        if trace.snapshots.is_empty() {
            return Err(TraceError::Empty);
        }
        tracing::debug!(snapshots = trace.snapshots.len(), "parsed trace");
        Ok(trace)
    }

    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let source = fs::read_to_string(path)?;
        Self::from_json(&source)
    }
}
