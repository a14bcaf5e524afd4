//! `sprintlog burndown`: total and remaining estimate for the sprint.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::Args;
use serde::Serialize;
use sprintlog_core::burndown::{BurndownPoint, summarize};
use sprintlog_core::config::resolve_config;
use sprintlog_core::observe::load_observed;

use super::show::load_required;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Clone)]
pub struct BurndownArgs {
    /// Sprint to summarize (defaults to SPRINT_NAME).
    #[arg(long)]
    pub sprint: Option<String>,

    /// Board export to read (defaults to `<input_dir>/items.json`).
    #[arg(long, conflicts_with = "from_log")]
    pub input: Option<PathBuf>,

    /// Directory of snapshot logs (defaults to SNAPSHOT_PATH or ./snapshots).
    #[arg(long)]
    pub snapshots: Option<PathBuf>,

    /// Summarize the state replayed from the sprint log instead of the export.
    #[arg(long)]
    pub from_log: bool,
}

#[derive(Debug, Serialize)]
struct BurndownReport {
    timestamp: DateTime<Utc>,
    sprint: String,
    #[serde(flatten)]
    point: BurndownPoint,
}

/// Run `sprintlog burndown`.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the items cannot be
/// loaded from the export or the log.
pub fn run_burndown(args: &BurndownArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let config = resolve_config(project_root, args.sprint.as_deref(), args.snapshots.as_deref())?;

    let items = if args.from_log {
        let log_path = project_root.join(config.log_path());
        load_required(&log_path)?
            .current_state()
            .with_context(|| format!("failed to replay {}", log_path.display()))?
    } else {
        let items_path =
            project_root.join(args.input.clone().unwrap_or_else(|| config.items_path()));
        let comments_dir = items_path.parent().map(Path::to_path_buf).unwrap_or_default();
        load_observed(&items_path, &comments_dir)?.items
    };

    let report = BurndownReport {
        timestamp: Utc::now(),
        point: summarize(&items, &config.sprint, &config.project.burndown.done_statuses),
        sprint: config.sprint,
    };

    render_mode(
        output,
        &report,
        |r, w| {
            writeln!(
                w,
                "{}\t{}\t{}\t{}\t{}",
                r.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                r.sprint,
                r.point.total,
                r.point.remaining,
                r.point.items
            )
        },
        |r, w| {
            if r.point.is_empty() {
                return writeln!(w, "No items found for sprint {}", r.sprint);
            }
            pretty_section(w, &format!("Burndown for {}", r.sprint))?;
            pretty_kv(w, "total", r.point.total.to_string())?;
            pretty_kv(w, "remaining", r.point.remaining.to_string())?;
            pretty_kv(w, "done", (r.point.total - r.point.remaining).to_string())?;
            pretty_kv(w, "items", r.point.items.to_string())
        },
    )
}
