//! `sprintlog snapshot`: fold the latest board export into the sprint log.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use sprintlog_core::config::resolve_config;
use sprintlog_core::lock::{DEFAULT_LOCK_TIMEOUT, LogLock};
use sprintlog_core::log::{Outcome, SnapshotLog, record_observation};
use sprintlog_core::model::{ChangeType, LogEntry};
use sprintlog_core::observe::load_observed;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// Sprint whose log to update (defaults to SPRINT_NAME).
    #[arg(long)]
    pub sprint: Option<String>,

    /// Board export to read (defaults to `<input_dir>/items.json`).
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Directory holding `comments-<n>.json` files (defaults to the export's directory).
    #[arg(long)]
    pub comments_dir: Option<PathBuf>,

    /// Directory of snapshot logs (defaults to SNAPSHOT_PATH or ./snapshots).
    #[arg(long)]
    pub snapshots: Option<PathBuf>,

    /// Compute the changes without writing the log.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct SnapshotReport {
    sprint: String,
    log: String,
    outcome: &'static str,
    dry_run: bool,
    items: usize,
    added: usize,
    modified: usize,
    removed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    changes: Vec<LogEntry>,
}

impl SnapshotReport {
    fn headline(&self) -> String {
        let verb = if self.dry_run { "Would append" } else { "Appended" };
        match self.outcome {
            "baseline" if self.dry_run => format!("Would create initial snapshot at {}", self.log),
            "baseline" => format!("Created initial snapshot at {}", self.log),
            "appended" => format!("{verb} new snapshot to {}", self.log),
            _ => "No changes since last snapshot, nothing to append.".to_string(),
        }
    }
}

/// Run `sprintlog snapshot`.
///
/// # Errors
///
/// Returns an error if configuration, the board export, or the existing log
/// cannot be loaded, or if the updated log cannot be written.
pub fn run_snapshot(args: &SnapshotArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let config = resolve_config(project_root, args.sprint.as_deref(), args.snapshots.as_deref())?;
    let log_path = project_root.join(config.log_path());
    let items_path = project_root.join(args.input.clone().unwrap_or_else(|| config.items_path()));
    let comments_dir = args.comments_dir.as_ref().map_or_else(
        || items_path.parent().map(Path::to_path_buf).unwrap_or_default(),
        |dir| project_root.join(dir),
    );

    let lock = if args.dry_run {
        None
    } else {
        Some(LogLock::acquire(&log_path, DEFAULT_LOCK_TIMEOUT)?)
    };

    let observation = load_observed(&items_path, &comments_dir)?;
    let previous = SnapshotLog::load(&log_path)?;
    let (log, outcome) = record_observation(previous, observation.items, Utc::now())
        .with_context(|| format!("failed to replay {}", log_path.display()))?;

    if outcome.is_dirty() && !args.dry_run {
        log.save(&log_path)?;
    }
    drop(lock);

    let warnings = observation
        .warnings
        .into_iter()
        .map(|w| format!("comments for issue #{}: {}", w.issue_number, w.reason))
        .collect();
    let report = build_report(&config.sprint, &log_path, outcome, args.dry_run, warnings);

    render_mode(
        output,
        &report,
        |r, w| {
            writeln!(
                w,
                "{}\t{}\t{}\t{}\t{}\t{}",
                r.outcome, r.items, r.added, r.modified, r.removed, r.log
            )
        },
        |r, w| {
            pretty_section(w, &r.headline())?;
            pretty_kv(w, "sprint", &r.sprint)?;
            match r.outcome {
                "baseline" => pretty_kv(w, "items", r.items.to_string())?,
                "appended" => {
                    pretty_kv(w, "added", r.added.to_string())?;
                    pretty_kv(w, "modified", r.modified.to_string())?;
                    pretty_kv(w, "removed", r.removed.to_string())?;
                }
                _ => {}
            }
            for warning in &r.warnings {
                pretty_kv(w, "warning", warning)?;
            }
            Ok(())
        },
    )
}

fn build_report(
    sprint: &str,
    log_path: &Path,
    outcome: Outcome,
    dry_run: bool,
    warnings: Vec<String>,
) -> SnapshotReport {
    let count = |changes: &[LogEntry], kind: ChangeType| {
        changes
            .iter()
            .filter(|c| c.change_type() == Some(kind))
            .count()
    };

    let mut report = SnapshotReport {
        sprint: sprint.to_string(),
        log: log_path.display().to_string(),
        outcome: "unchanged",
        dry_run,
        items: 0,
        added: 0,
        modified: 0,
        removed: 0,
        warnings,
        changes: Vec::new(),
    };

    match outcome {
        Outcome::Baseline { items } => {
            report.outcome = "baseline";
            report.items = items;
        }
        Outcome::Appended { changes } => {
            report.outcome = "appended";
            report.items = changes.len();
            report.added = count(&changes, ChangeType::Added);
            report.modified = count(&changes, ChangeType::Modified);
            report.removed = count(&changes, ChangeType::Removed);
            report.changes = changes;
        }
        Outcome::Unchanged => {}
    }
    report
}
