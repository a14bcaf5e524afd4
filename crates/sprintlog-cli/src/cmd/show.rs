//! `sprintlog show`: print the board state reconstructed from the log.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use sprintlog_core::config::resolve_config;
use sprintlog_core::log::SnapshotLog;
use sprintlog_core::model::Item;
use sprintlog_core::replay::ReplayError;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Sprint whose log to read (defaults to SPRINT_NAME).
    #[arg(long)]
    pub sprint: Option<String>,

    /// Directory of snapshot logs (defaults to SNAPSHOT_PATH or ./snapshots).
    #[arg(long)]
    pub snapshots: Option<PathBuf>,

    /// Replay only snapshots taken at or before this RFC 3339 instant.
    #[arg(long)]
    pub as_of: Option<DateTime<Utc>>,

    /// Replay up to and including snapshot N (0 = baseline).
    #[arg(long, conflicts_with = "as_of")]
    pub at: Option<usize>,
}

/// Load the sprint log at `path`, treating a missing or empty log as an error.
pub(crate) fn load_required(path: &Path) -> Result<SnapshotLog> {
    SnapshotLog::load(path)?
        .ok_or(ReplayError::EmptyLog)
        .with_context(|| format!("no snapshots in {}", path.display()))
}

/// Run `sprintlog show`.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the log is missing,
/// empty, or unreadable.
pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let config = resolve_config(project_root, args.sprint.as_deref(), args.snapshots.as_deref())?;
    let log_path = project_root.join(config.log_path());
    let log = load_required(&log_path)?;

    let state = match (args.at, args.as_of) {
        (Some(index), _) => log.state_at(index),
        (None, Some(at)) => log.state_as_of(at),
        (None, None) => log.current_state(),
    }
    .with_context(|| format!("failed to replay {}", log_path.display()))?;

    render_mode(
        output,
        &state,
        |items, w| {
            for item in items {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}",
                    item.id,
                    item.status.as_deref().unwrap_or("-"),
                    estimate_label(item),
                    item.title
                )?;
            }
            Ok(())
        },
        |items, w| {
            if items.is_empty() {
                return writeln!(w, "Board is empty.");
            }
            for item in items {
                pretty_section(w, &format!("{}  {}", item.id, item.title))?;
                pretty_kv(w, "status", item.status.as_deref().unwrap_or("-"))?;
                pretty_kv(w, "estimate", estimate_label(item))?;
                if let Some(sprint) = item.sprint_title() {
                    pretty_kv(w, "sprint", sprint)?;
                }
                if let Some(number) = item.issue_number() {
                    pretty_kv(w, "issue", format!("#{number}"))?;
                }
                if !item.assignees.is_empty() {
                    pretty_kv(w, "assignees", item.assignees.join(", "))?;
                }
                if !item.labels.is_empty() {
                    pretty_kv(w, "labels", item.labels.join(", "))?;
                }
                writeln!(w)?;
            }
            Ok(())
        },
    )
}

fn estimate_label(item: &Item) -> String {
    item.estimate.map_or_else(|| "-".to_string(), |e| e.to_string())
}
