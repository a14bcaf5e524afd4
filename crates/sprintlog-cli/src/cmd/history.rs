//! `sprintlog history`: list the snapshots recorded in a sprint log.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use clap::Args;
use serde::Serialize;
use sprintlog_core::config::resolve_config;
use sprintlog_core::model::{ChangeType, Snapshot};

use super::show::load_required;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Sprint whose log to read (defaults to SPRINT_NAME).
    #[arg(long)]
    pub sprint: Option<String>,

    /// Directory of snapshot logs (defaults to SNAPSHOT_PATH or ./snapshots).
    #[arg(long)]
    pub snapshots: Option<PathBuf>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HistoryRow {
    index: usize,
    timestamp: DateTime<Utc>,
    baseline: usize,
    added: usize,
    modified: usize,
    removed: usize,
}

impl HistoryRow {
    fn of(index: usize, snapshot: &Snapshot) -> Self {
        Self {
            index,
            timestamp: snapshot.timestamp,
            baseline: snapshot.count(None),
            added: snapshot.count(Some(ChangeType::Added)),
            modified: snapshot.count(Some(ChangeType::Modified)),
            removed: snapshot.count(Some(ChangeType::Removed)),
        }
    }
}

/// Run `sprintlog history`.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the log is missing,
/// empty, or unreadable.
pub fn run_history(args: &HistoryArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let config = resolve_config(project_root, args.sprint.as_deref(), args.snapshots.as_deref())?;
    let log = load_required(&project_root.join(config.log_path()))?;

    let rows: Vec<HistoryRow> = log
        .snapshots()
        .iter()
        .enumerate()
        .map(|(index, snapshot)| HistoryRow::of(index, snapshot))
        .collect();

    render_mode(
        output,
        &rows,
        |rows, w| {
            for r in rows {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    r.index,
                    r.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                    r.baseline,
                    r.added,
                    r.modified,
                    r.removed
                )?;
            }
            Ok(())
        },
        |rows, w| {
            pretty_section(w, &format!("{} snapshot(s) for {}", rows.len(), config.sprint))?;
            for r in rows {
                let stamp = r.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
                let summary = if r.index == 0 {
                    format!("baseline, {} item(s)", r.baseline)
                } else {
                    format!("+{} ~{} -{}", r.added, r.modified, r.removed)
                };
                pretty_kv(w, &format!("#{}", r.index), format!("{stamp}  {summary}"))?;
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sprintlog_core::model::{ChangeRecord, Item, LogEntry, Tombstone};

    #[test]
    fn row_counts_each_entry_kind() {
        let snapshot = Snapshot {
            timestamp: Utc.with_ymd_and_hms(2026, 1, 6, 9, 0, 0).unwrap(),
            items: vec![
                LogEntry::Added(Item::with_id("c")),
                LogEntry::Modified(ChangeRecord {
                    title: Some("x".into()),
                    ..ChangeRecord::new("a")
                }),
                LogEntry::Removed(Tombstone::of(&Item::with_id("b"))),
            ],
        };
        let row = HistoryRow::of(1, &snapshot);
        assert_eq!(
            (row.baseline, row.added, row.modified, row.removed),
            (0, 1, 1, 1)
        );
    }

    #[test]
    fn baseline_row_counts_items() {
        let snapshot = Snapshot::baseline(
            Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
            vec![Item::with_id("a"), Item::with_id("b")],
        );
        assert_eq!(HistoryRow::of(0, &snapshot).baseline, 2);
    }
}
