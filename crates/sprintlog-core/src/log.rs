//! Snapshot log files.
//!
//! Each sprint has one log file: a JSON array of [`Snapshot`] objects where
//! the first element is the baseline and every later element holds only
//! changes.
//!
//! # Layout
//!
//! ```text
//! snapshots/
//!   Sprint-7.json        # log for sprint "Sprint 7"
//!   Sprint-7.json.lock   # advisory lock held while a run updates the log
//! ```
//!
//! # Invariants
//!
//! - A run appends at most one snapshot and never appends an empty one.
//! - Saves go to a sibling temp file that is renamed over the log, so a
//!   reader never observes a partially written file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::diff::compute_changes;
use crate::error::ErrorCode;
use crate::model::{Item, LogEntry, Snapshot};
use crate::replay::{ReplayError, reconstruct};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors reading or writing a snapshot log.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The log exists but could not be read.
    #[error("failed to read snapshot log {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    /// The log is not a valid JSON array of snapshots.
    #[error("failed to parse snapshot log {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The log could not be serialized.
    #[error("failed to serialize snapshot log: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The log could not be written.
    #[error("failed to write snapshot log {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

impl LogError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::LogReadFailed,
            Self::Write { .. } => ErrorCode::LogWriteFailed,
            Self::Parse { .. } => ErrorCode::MalformedLog,
            Self::Serialize(_) => ErrorCode::InternalUnexpected,
        }
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Normalize a sprint name for use as a file stem: trim, then replace
/// spaces with `-`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().replace(' ', "-")
}

/// Path of the log file for `sprint` under `dir`.
#[must_use]
pub fn log_path(dir: &Path, sprint: &str) -> PathBuf {
    dir.join(format!("{}.json", normalize_name(sprint)))
}

// ---------------------------------------------------------------------------
// SnapshotLog
// ---------------------------------------------------------------------------

/// Ordered snapshots of one sprint's board.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotLog {
    snapshots: Vec<Snapshot>,
}

impl SnapshotLog {
    #[must_use]
    pub const fn new(snapshots: Vec<Snapshot>) -> Self {
        Self { snapshots }
    }

    #[must_use]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Load the log at `path`.
    ///
    /// Returns `Ok(None)` when there is no history yet: the file is missing
    /// or holds an empty array.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Read`] if the file exists but cannot be read, or
    /// [`LogError::Parse`] if it is not a valid log.
    pub fn load(path: &Path) -> Result<Option<Self>, LogError> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot log yet");
                return Ok(None);
            }
            Err(source) => {
                return Err(LogError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let log: Self = serde_json::from_slice(&data).map_err(|source| LogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), snapshots = log.len(), "loaded snapshot log");
        Ok((!log.is_empty()).then_some(log))
    }

    /// Write the log to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Write`] on any filesystem failure.
    pub fn save(&self, path: &Path) -> Result<(), LogError> {
        let write_err = |source| LogError::Write {
            path: path.to_path_buf(),
            source,
        };

        let data = serde_json::to_vec_pretty(self).map_err(LogError::Serialize)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, data).map_err(write_err)?;
        fs::rename(&tmp_path, path).map_err(write_err)?;

        debug!(path = %path.display(), snapshots = self.len(), "saved snapshot log");
        Ok(())
    }

    /// Full state after every snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::EmptyLog`] if the log has no snapshots.
    pub fn current_state(&self) -> Result<Vec<Item>, ReplayError> {
        reconstruct(&self.snapshots)
    }

    /// Full state after snapshot `index` (0 = baseline).
    ///
    /// An index past the end yields the current state.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::EmptyLog`] if the log has no snapshots.
    pub fn state_at(&self, index: usize) -> Result<Vec<Item>, ReplayError> {
        let end = index.saturating_add(1).min(self.snapshots.len());
        reconstruct(&self.snapshots[..end])
    }

    /// Full state as of `at`: every snapshot with `timestamp <= at`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::EmptyLog`] if no snapshot is that old.
    pub fn state_as_of(&self, at: DateTime<Utc>) -> Result<Vec<Item>, ReplayError> {
        let end = self.snapshots.partition_point(|s| s.timestamp <= at);
        reconstruct(&self.snapshots[..end])
    }

    fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }
}

// ---------------------------------------------------------------------------
// Observation pipeline
// ---------------------------------------------------------------------------

/// What a run did to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No history existed; the observation became the baseline.
    Baseline { items: usize },
    /// A snapshot with these changes was appended.
    Appended { changes: Vec<LogEntry> },
    /// Nothing changed; the log must not be rewritten.
    Unchanged,
}

impl Outcome {
    /// True when the log changed and should be persisted.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Fold one observation into the log.
///
/// With no history, `observed` becomes the baseline verbatim. Otherwise the
/// previous state is reconstructed and diffed against `observed`; a new
/// snapshot is appended only if something changed.
///
/// # Errors
///
/// Returns [`ReplayError`] if a present log cannot be replayed.
pub fn record_observation(
    log: Option<SnapshotLog>,
    observed: Vec<Item>,
    now: DateTime<Utc>,
) -> Result<(SnapshotLog, Outcome), ReplayError> {
    let Some(mut log) = log.filter(|log| !log.is_empty()) else {
        let items = observed.len();
        info!(items, "recording baseline snapshot");
        let log = SnapshotLog::new(vec![Snapshot::baseline(now, observed)]);
        return Ok((log, Outcome::Baseline { items }));
    };

    let previous = log.current_state()?;
    let changes = compute_changes(&previous, &observed);
    if changes.is_empty() {
        info!("no changes since last snapshot, nothing to append");
        return Ok((log, Outcome::Unchanged));
    }

    info!(changes = changes.len(), "appending snapshot");
    log.push(Snapshot {
        timestamp: now,
        items: changes.clone(),
    });
    Ok((log, Outcome::Appended { changes }))
}
