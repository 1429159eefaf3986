// Snapshot management for stepping through a recorded trace

pub mod env;
pub mod machine;
pub mod raw;
pub mod trace;

pub use env::{EnvId, EnvNode, EnvTree, RawBinding};
pub use machine::{ControlItem, StashItem};
pub use raw::{HeapId, RawValue};
pub use trace::Trace;

use crate::error::TraceError;
use serde::Deserialize;

/// Machine state at one step of execution
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snapshot {
    pub environments: Vec<EnvNode>,
    /// Environment the machine is currently evaluating in
    #[serde(default)]
    pub current_env: Option<EnvId>,
    #[serde(default)]
    pub control: Vec<ControlItem>,
    #[serde(default)]
    pub stash: Vec<StashItem>,
}

impl Snapshot {
    pub fn new(environments: Vec<EnvNode>) -> Self {
        Snapshot {
            environments,
            current_env: None,
            control: Vec::new(),
            stash: Vec::new(),
        }
    }

    /// Estimate the memory usage of this snapshot in bytes
    pub fn estimated_size(&self) -> usize {
        // This is a rough estimate
        // Bindings: assume 64 bytes per binding on average
        let binding_size: usize = self
            .environments
            .iter()
            .map(|env| 96 + env.bindings.len() * 64)
            .sum();

        // Control and stash: assume 48 bytes per item on average
        let machine_size = (self.control.len() + self.stash.len()) * 48;

        binding_size + machine_size
    }
}

/// Manages the history of snapshots the viewer steps through
#[derive(Debug)]
pub struct SnapshotManager {
    snapshots: Vec<Snapshot>,
    max_memory: usize,
    current_memory: usize,
}

impl SnapshotManager {
    pub fn new(max_memory: usize) -> Self {
        SnapshotManager {
            snapshots: Vec::new(),
            max_memory,
            current_memory: 0,
        }
    }

    /// Build a history from a loaded trace
    pub fn from_trace(trace: Trace, max_memory: usize) -> Result<Self, TraceError> {
        if trace.snapshots.is_empty() {
            return Err(TraceError::Empty);
        }
        let mut manager = SnapshotManager::new(max_memory);
        for snapshot in trace.snapshots {
            manager.push(snapshot)?;
        }
        Ok(manager)
    }

    /// Add a snapshot to history
    pub fn push(&mut self, snapshot: Snapshot) -> Result<(), TraceError> {
        let snapshot_size = snapshot.estimated_size();

        if self.current_memory + snapshot_size > self.max_memory {
            return Err(TraceError::HistoryLimitExceeded {
                current: self.current_memory,
                requested: snapshot_size,
                limit: self.max_memory,
            });
        }

        self.current_memory += snapshot_size;
        self.snapshots.push(snapshot);
        Ok(())
    }

    /// Get a snapshot by index
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// Get the number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Get current memory usage
    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    /// Get max memory limit
    pub fn memory_limit(&self) -> usize {
        self.max_memory
    }
}
