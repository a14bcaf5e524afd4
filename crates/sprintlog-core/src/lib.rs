//! sprintlog-core library.
//!
//! Stores the history of a project board as an append-only log of
//! snapshots: one full baseline followed by minimal change records.
//!
//! - [`diff`] computes change records between two full states.
//! - [`merge`] applies one change record to one item.
//! - [`replay`] rebuilds the full state from a snapshot log.
//! - [`log`] loads, saves, and extends snapshot log files.
//!
//! # Conventions
//!
//! - **Errors**: one `thiserror` enum per module, each mapping to a stable
//!   [`error::ErrorCode`]; `anyhow::Result` for configuration glue.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod burndown;
pub mod config;
pub mod diff;
pub mod error;
pub mod lock;
pub mod log;
pub mod merge;
pub mod model;
pub mod observe;
pub mod replay;

pub use diff::compute_changes;
pub use merge::apply_change;
pub use replay::{ReplayError, reconstruct};
