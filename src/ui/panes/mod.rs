//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`diagram`]: the laid-out scene, painted into terminal cells
//! - [`status`]: Status bar with keybindings and stepping state
//!
//! Each pane module exports a primary `render_*` function that draws into a
//! given area and keeps no state of its own.

pub mod diagram;
pub mod status;

// Re-export render functions for convenience
pub use diagram::{render_diagram_pane, SceneWidget};
pub use status::{render_status_bar, StatusRenderData};
