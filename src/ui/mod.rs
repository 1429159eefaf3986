//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: application state, keyboard event loop, stepping, auto play
//!   and the animation driver (clock ticks plus a local executor)
//! - **[`panes`]**: stateless render functions for the diagram and the
//!   status bar
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a
//! [`SnapshotManager`] and call [`App::run`] to start the event loop.
//!
//! [`SnapshotManager`]: crate::snapshot::SnapshotManager
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
