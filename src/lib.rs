//! # Introduction
//!
//! envtty lays out snapshots of an environment/control/stash machine as
//! non-overlapping 2D diagrams and animates the change from one snapshot to
//! the next. A terminal viewer built with [ratatui](https://docs.rs/ratatui)
//! steps through a recorded trace.
//!
//! ## Pipeline
//!
//! ```text
//! Trace JSON → Snapshot → Diagram → Layout → Scene → Transition → TUI
//! ```
//!
//! 1. [`snapshot`]: the input model. Environments, raw values with heap
//!    identities, control and stash items, plus the trace file and history.
//! 2. [`diagram`]: frames, bindings and values built from a snapshot, with
//!    one value per heap object no matter how many places refer to it.
//! 3. [`layout`]: places the diagram on a grid of frame and array levels,
//!    lays out the control column and stash row, and routes arrows through
//!    per-margin lanes.
//! 4. [`scene`]: a retained node tree every laid-out entity draws itself
//!    into.
//! 5. [`animation`]: an explicit clock, completion futures and the proxies
//!    and transitions built on them.
//! 6. [`ui`]: the terminal viewer; not part of the stable library API.
//!
//! Configuration lives in [`config`], error types in [`error`].

pub mod animation;
pub mod config;
pub mod diagram;
pub mod error;
pub mod layout;
pub mod scene;
pub mod snapshot;
pub mod ui;
