//! Snapshot log replay.
//!
//! Reconstructs the full board state from a baseline snapshot followed by
//! incremental snapshots.
//!
//! # Algorithm
//!
//! 1. Seed an id-ordered map from the first snapshot. Every entry there is a
//!    full item, whatever its tag says.
//! 2. For every later snapshot, in order, and every entry in it:
//!    - skip entries with an empty id;
//!    - `removed` deletes the id;
//!    - `added` inserts the item unless the id is already present;
//!    - `modified` applies the record to the current item;
//!    - an untagged full item overlays its populated fields.
//! 3. Return the map's values, ordered by id.
//!
//! A `modified` record (or untagged item) for an id that is not present is
//! applied to an empty item with that id, so the result contains exactly
//! the fields the record carries. This is logged as a warning because a
//! well-formed log never produces it.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::ErrorCode;
use crate::merge::apply_change;
use crate::model::{ChangeRecord, Item, LogEntry, Snapshot};

/// Errors from snapshot replay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// No snapshots to replay.
    #[error("snapshot log is empty; record a baseline before reconstructing")]
    EmptyLog,
}

impl ReplayError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyLog => ErrorCode::EmptyLog,
        }
    }
}

/// Replay `snapshots` and return the resulting items, sorted by id.
///
/// # Errors
///
/// Returns [`ReplayError::EmptyLog`] if `snapshots` is empty.
pub fn reconstruct(snapshots: &[Snapshot]) -> Result<Vec<Item>, ReplayError> {
    let (baseline, rest) = snapshots.split_first().ok_or(ReplayError::EmptyLog)?;

    let mut state: BTreeMap<String, Item> = baseline
        .items
        .iter()
        .cloned()
        .map(|entry| {
            let item = entry.into_full_item();
            (item.id.clone(), item)
        })
        .collect();

    for snapshot in rest {
        for entry in &snapshot.items {
            apply_entry(&mut state, entry);
        }
    }

    debug!(
        snapshots = snapshots.len(),
        items = state.len(),
        "reconstructed state"
    );
    Ok(state.into_values().collect())
}

fn apply_entry(state: &mut BTreeMap<String, Item>, entry: &LogEntry) {
    if entry.id().is_empty() {
        debug!(?entry, "skipping entry without id");
        return;
    }

    match entry {
        LogEntry::Removed(tombstone) => {
            if state.remove(&tombstone.id).is_none() {
                debug!(id = %tombstone.id, "tombstone for unknown item");
            }
        }
        LogEntry::Added(item) => {
            state.entry(item.id.clone()).or_insert_with(|| item.clone());
        }
        LogEntry::Modified(record) => merge_into(state, record),
        LogEntry::Baseline(item) => merge_into(state, &ChangeRecord::overlay(item)),
    }
}

fn merge_into(state: &mut BTreeMap<String, Item>, record: &ChangeRecord) {
    let merged = match state.get(&record.id) {
        Some(current) => apply_change(current, record),
        None => {
            warn!(id = %record.id, "change for unknown item; treating it as an add");
            apply_change(&Item::with_id(record.id.clone()), record)
        }
    };
    state.insert(record.id.clone(), merged);
}
