use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::change::{ChangeType, ClearEncoding, LogEntry};
use super::item::Item;

/// Snapshot format written by this crate. Snapshots without a `format` key
/// predate it and use [`ClearEncoding::Sentinel`].
pub const SNAPSHOT_FORMAT: u32 = 2;

/// One observation run: either the full baseline or the changes since the
/// previous run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub items: Vec<LogEntry>,
}

impl Snapshot {
    /// Full-copy snapshot of an observed board.
    #[must_use]
    pub fn baseline(timestamp: DateTime<Utc>, items: Vec<Item>) -> Self {
        Self {
            timestamp,
            items: items.into_iter().map(LogEntry::Baseline).collect(),
        }
    }

    /// Number of entries of the given kind (`None` counts baseline items).
    #[must_use]
    pub fn count(&self, kind: Option<ChangeType>) -> usize {
        self.items
            .iter()
            .filter(|entry| entry.change_type() == kind)
            .count()
    }
}

#[derive(Serialize)]
struct SnapshotOut<'a> {
    timestamp: &'a DateTime<Utc>,
    format: u32,
    items: &'a [LogEntry],
}

#[derive(Deserialize)]
struct SnapshotIn {
    timestamp: DateTime<Utc>,
    #[serde(default)]
    format: Option<u32>,
    #[serde(default)]
    items: Option<Vec<Value>>,
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SnapshotOut {
            timestamp: &self.timestamp,
            format: SNAPSHOT_FORMAT,
            items: &self.items,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = SnapshotIn::deserialize(deserializer)?;
        let encoding = match raw.format {
            None | Some(1) => ClearEncoding::Sentinel,
            Some(_) => ClearEncoding::Null,
        };
        let items = raw
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|value| LogEntry::from_value(value, encoding))
            .collect::<Result<_, _>>()
            .map_err(D::Error::custom)?;
        Ok(Self {
            timestamp: raw.timestamp,
            items,
        })
    }
}
