//! Integration tests: observation → diff → snapshot → replay.
//!
//! Covers the end-to-end recording scenarios:
//!   - status change produces a single minimal `modified` record
//!   - disappearing items produce a titled tombstone
//!   - clearing an estimate round-trips through the log
//!   - first run writes an untagged baseline
//!   - replay over a saved and reloaded log file

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use sprintlog_core::log::{Outcome, SnapshotLog, log_path, record_observation};
use sprintlog_core::model::{Item, LogEntry, Patch};
use sprintlog_core::{apply_change, compute_changes, reconstruct};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_767_225_600 + secs, 0)
        .single()
        .expect("valid timestamp")
}

fn item(id: &str, title: &str) -> Item {
    Item {
        id: id.into(),
        title: title.into(),
        ..Item::default()
    }
}

fn fix_bug(status: &str) -> Item {
    Item {
        estimate: Some(3),
        status: Some(status.into()),
        ..item("1", "Fix bug")
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn status_change_is_a_minimal_modified_record() {
    let changes = compute_changes(&[fix_bug("Todo")], &[fix_bug("Done")]);

    assert_eq!(changes.len(), 1);
    let wire = serde_json::to_value(&changes[0]).expect("serialize");
    assert_eq!(
        wire,
        json!({"id": "1", "status": "Done", "changeType": "modified"})
    );
}

#[test]
fn missing_item_becomes_tombstone_with_old_title() {
    let old = vec![item("1", "Keep"), item("2", "Drop me")];
    let new = vec![item("1", "Keep")];

    let changes = compute_changes(&old, &new);
    assert_eq!(changes.len(), 1);
    let wire = serde_json::to_value(&changes[0]).expect("serialize");
    assert_eq!(
        wire,
        json!({"id": "2", "title": "Drop me", "changeType": "removed"})
    );
}

#[test]
fn cleared_estimate_round_trips() {
    let before = Item {
        estimate: Some(5),
        ..item("1", "Sized")
    };
    let after = item("1", "Sized");

    let changes = compute_changes(std::slice::from_ref(&before), std::slice::from_ref(&after));
    let [LogEntry::Modified(record)] = changes.as_slice() else {
        panic!("expected one modified record, got {changes:?}");
    };
    assert_eq!(record.estimate, Patch::Cleared);
    assert_eq!(
        serde_json::to_value(&changes[0]).expect("serialize"),
        json!({"id": "1", "estimate": null, "changeType": "modified"})
    );

    let applied = apply_change(&before, record);
    assert_eq!(applied.estimate, None);
    assert_eq!(applied, after);
}

#[test]
fn first_run_writes_untagged_baseline() {
    let dir = TempDir::new().expect("tempdir");
    let path = log_path(dir.path(), "Sprint 1");
    let observed = vec![fix_bug("Todo"), item("2", "Docs")];

    let (log, outcome) =
        record_observation(SnapshotLog::load(&path).expect("load"), observed.clone(), ts(0))
            .expect("record");
    assert_eq!(outcome, Outcome::Baseline { items: 2 });
    log.save(&path).expect("save");

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("valid json");
    let snapshots = raw.as_array().expect("array");
    assert_eq!(snapshots.len(), 1);
    let items = snapshots[0]["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    for (entry, expected) in items.iter().zip(&observed) {
        assert!(entry.get("changeType").is_none());
        assert_eq!(entry, &serde_json::to_value(expected).expect("serialize"));
    }
}

#[test]
fn repeated_runs_accumulate_only_real_changes() {
    let dir = TempDir::new().expect("tempdir");
    let path = log_path(dir.path(), "Sprint 1");

    let runs = [
        vec![fix_bug("Todo"), item("2", "Docs")],
        vec![fix_bug("Todo"), item("2", "Docs")],
        vec![fix_bug("Doing"), item("2", "Docs"), item("3", "New")],
        vec![fix_bug("Done"), item("3", "New")],
        vec![fix_bug("Done"), item("3", "New")],
    ];

    let mut outcomes = Vec::new();
    for (n, observed) in runs.iter().enumerate() {
        let previous = SnapshotLog::load(&path).expect("load");
        let secs = i64::try_from(n).expect("small index") * 60;
        let (log, outcome) =
            record_observation(previous, observed.clone(), ts(secs)).expect("record");
        if outcome.is_dirty() {
            log.save(&path).expect("save");
        }
        outcomes.push(outcome);
    }

    assert!(matches!(outcomes[0], Outcome::Baseline { items: 2 }));
    assert_eq!(outcomes[1], Outcome::Unchanged);
    assert!(matches!(&outcomes[2], Outcome::Appended { changes } if changes.len() == 2));
    assert!(matches!(&outcomes[3], Outcome::Appended { changes } if changes.len() == 2));
    assert_eq!(outcomes[4], Outcome::Unchanged);

    let log = SnapshotLog::load(&path).expect("load").expect("present");
    assert_eq!(log.len(), 3);
    assert_eq!(
        reconstruct(log.snapshots()).expect("replay"),
        vec![fix_bug("Done"), item("3", "New")]
    );
    assert_eq!(
        log.state_at(1).expect("replay"),
        vec![fix_bug("Doing"), item("2", "Docs"), item("3", "New")]
    );
}
