//! Change computation between two full board states.
//!
//! [`compute_changes`] walks the new state in input order and emits one
//! entry per item that was added or modified, then one tombstone per item
//! that disappeared, in ascending id order. Items that did not change emit
//! nothing, so re-observing an unchanged board never grows the log.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::model::{ChangeRecord, ContentPatch, Item, LogEntry, Patch, Tombstone};

/// Diff `old` against `new` and return the entries that turn one into the
/// other.
#[must_use]
pub fn compute_changes(old: &[Item], new: &[Item]) -> Vec<LogEntry> {
    let old_by_id: BTreeMap<&str, &Item> = old.iter().map(|item| (item.id.as_str(), item)).collect();
    let new_by_id: HashMap<&str, &Item> = new.iter().map(|item| (item.id.as_str(), item)).collect();

    let mut changes = Vec::new();
    for item in new {
        match old_by_id.get(item.id.as_str()) {
            None => {
                debug!(id = %item.id, "item added");
                changes.push(LogEntry::Added(item.clone()));
            }
            Some(previous) => {
                if let Some(record) = diff_item(previous, item) {
                    changes.push(LogEntry::Modified(record));
                }
            }
        }
    }

    for (id, previous) in old_by_id {
        if !new_by_id.contains_key(id) {
            debug!(id, "item removed");
            changes.push(LogEntry::Removed(Tombstone::of(previous)));
        }
    }

    changes
}

/// Field-by-field delta of one item, or `None` when nothing changed.
#[must_use]
pub fn diff_item(old: &Item, new: &Item) -> Option<ChangeRecord> {
    let mut record = ChangeRecord::new(new.id.clone());
    record.issue_number = new.issue_number();

    if old.assignees != new.assignees {
        record.assignees = Some(new.assignees.clone());
    }

    let content = ContentPatch {
        body: (old.content_body() != new.content_body()).then(|| new.content_body().to_string()),
        title: (old.content_title() != new.content_title())
            .then(|| new.content_title().to_string()),
    };
    if !content.is_empty() {
        record.content = Some(content);
    }

    record.estimate = Patch::between(old.estimate.as_ref(), new.estimate.as_ref(), |a, b| a == b);

    if old.labels != new.labels {
        record.labels = Some(new.labels.clone());
    }

    record.milestone = Patch::between(old.milestone.as_ref(), new.milestone.as_ref(), |a, b| {
        a.title == b.title
    });
    record.sprint =
        Patch::between(old.sprint.as_ref(), new.sprint.as_ref(), |a, b| a.title == b.title);
    record.status = Patch::between(old.status.as_ref(), new.status.as_ref(), |a, b| a == b);

    if old.title != new.title {
        record.title = Some(new.title.clone());
    }

    if old.comments != new.comments {
        record.comments = Some(new.comments.clone());
    }

    if record.is_empty() {
        return None;
    }

    debug!(id = %record.id, change = ?record, "item modified");
    Some(record)
}
