//! Change records and snapshot log entries.
//!
//! A snapshot holds a list of [`LogEntry`] values. The entry kind is the
//! closed set `Baseline | Added | Modified | Removed`; on the wire it is the
//! optional `changeType` field of each JSON object (absent for baseline
//! items).
//!
//! Optional fields of a [`ChangeRecord`] use [`Patch`], which distinguishes
//! "unchanged" (key absent) from "cleared" (`null`) from "set" (a value), so
//! a legitimate zero estimate never collides with a clear.
//!
//! Older logs mark clears with empty values instead: `""` for a status, an
//! untitled milestone or sprint, and `0` for an estimate. The first three
//! always decode as [`Patch::Cleared`], since decoded items never hold those
//! values. A zero estimate only means "cleared" under
//! [`ClearEncoding::Sentinel`], which snapshots without a format marker use
//! (see [`crate::model::Snapshot`]).

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::item::{Comment, Item, Milestone, Sprint, Titled};

/// JSON key carrying the entry kind.
pub const CHANGE_TYPE_KEY: &str = "changeType";

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Three-state delta for an optional field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Field is the same as in the base item.
    #[default]
    Unchanged,
    /// Field was removed from the item.
    Cleared,
    /// Field now holds this value.
    Set(T),
}

impl<T> Patch<T> {
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Compute the patch that turns `old` into `new`.
    ///
    /// `same` decides whether two present values count as equal; milestones
    /// and sprints compare by title only.
    pub fn between(old: Option<&T>, new: Option<&T>, same: impl FnOnce(&T, &T) -> bool) -> Self
    where
        T: Clone,
    {
        match (old, new) {
            (None, Some(value)) => Self::Set(value.clone()),
            (Some(_), None) => Self::Cleared,
            (Some(before), Some(after)) if !same(before, after) => Self::Set(after.clone()),
            _ => Self::Unchanged,
        }
    }

    /// Turn a `Set` whose value is a clear marker into `Cleared`.
    #[must_use]
    pub fn clear_if(self, is_marker: impl FnOnce(&T) -> bool) -> Self {
        match self {
            Self::Set(value) if is_marker(&value) => Self::Cleared,
            other => other,
        }
    }

    /// Apply this patch to an optional slot in place.
    pub fn apply_to(&self, slot: &mut Option<T>)
    where
        T: Clone,
    {
        match self {
            Self::Unchanged => {}
            Self::Cleared => *slot = None,
            Self::Set(value) => *slot = Some(value.clone()),
        }
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Unchanged fields are skipped by the containing struct.
            Self::Unchanged | Self::Cleared => serializer.serialize_none(),
            Self::Set(value) => serializer.serialize_some(value),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|value| value.map_or(Self::Cleared, Self::Set))
    }
}

fn blank_clears<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Patch<String>, D::Error> {
    Patch::<String>::deserialize(deserializer).map(|patch| patch.clear_if(String::is_empty))
}

fn untitled_clears<'de, D, T>(deserializer: D) -> Result<Patch<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Titled,
{
    Patch::<T>::deserialize(deserializer).map(|patch| patch.clear_if(|v| v.title().is_empty()))
}

/// How `modified` records in a snapshot mark a cleared estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearEncoding {
    /// `0` clears the estimate. Snapshots without a format marker.
    Sentinel,
    /// `null` clears the estimate and `0` is a real value.
    Null,
}

// ---------------------------------------------------------------------------
// ChangeRecord
// ---------------------------------------------------------------------------

/// Leaf-level delta of an item's linked content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ContentPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.body.is_none() && self.title.is_none()
    }
}

/// Minimal delta describing how one item changed between two observations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangeRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentPatch>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub estimate: Patch<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(
        skip_serializing_if = "Patch::is_unchanged",
        deserialize_with = "untitled_clears"
    )]
    pub milestone: Patch<Milestone>,
    #[serde(
        skip_serializing_if = "Patch::is_unchanged",
        deserialize_with = "untitled_clears"
    )]
    pub sprint: Patch<Sprint>,
    #[serde(
        skip_serializing_if = "Patch::is_unchanged",
        deserialize_with = "blank_clears"
    )]
    pub status: Patch<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl ChangeRecord {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// True when the record changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignees.is_none()
            && self.content.as_ref().is_none_or(ContentPatch::is_empty)
            && self.estimate.is_unchanged()
            && self.labels.is_none()
            && self.milestone.is_unchanged()
            && self.sprint.is_unchanged()
            && self.status.is_unchanged()
            && self.title.is_none()
            && self.comments.is_none()
    }

    /// Record that overlays every populated field of a full item.
    ///
    /// Used when a full (untagged) item shows up after the baseline: empty
    /// sequences and absent optionals leave the base untouched.
    #[must_use]
    pub fn overlay(item: &Item) -> Self {
        let non_empty = |values: &Vec<String>| (!values.is_empty()).then(|| values.clone());
        let content = item.content.as_ref().map(|c| ContentPatch {
            body: (!c.body.is_empty()).then(|| c.body.clone()),
            title: (!c.title.is_empty()).then(|| c.title.clone()),
        });

        Self {
            id: item.id.clone(),
            issue_number: item.issue_number(),
            assignees: non_empty(&item.assignees),
            content: content.filter(|c| !c.is_empty()),
            estimate: item.estimate.map_or(Patch::Unchanged, Patch::Set),
            labels: non_empty(&item.labels),
            milestone: item.milestone.clone().map_or(Patch::Unchanged, Patch::Set),
            sprint: item.sprint.clone().map_or(Patch::Unchanged, Patch::Set),
            status: item.status.clone().map_or(Patch::Unchanged, Patch::Set),
            title: (!item.title.is_empty()).then(|| item.title.clone()),
            comments: (!item.comments.is_empty()).then(|| item.comments.clone()),
        }
    }
}

/// Removal marker; keeps the title so the log stays readable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tombstone {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
}

impl Tombstone {
    #[must_use]
    pub fn of(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            issue_number: item.issue_number(),
            title: item.title.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// LogEntry
// ---------------------------------------------------------------------------

/// Wire value of `changeType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
}

impl ChangeType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a snapshot's `items` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// Full item copy without a change tag.
    Baseline(Item),
    /// Item seen for the first time.
    Added(Item),
    /// Delta against the reconstructed item.
    Modified(ChangeRecord),
    /// Item no longer observed.
    Removed(Tombstone),
}

impl LogEntry {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Baseline(item) | Self::Added(item) => &item.id,
            Self::Modified(record) => &record.id,
            Self::Removed(tombstone) => &tombstone.id,
        }
    }

    /// Entry kind, `None` for untagged baseline items.
    #[must_use]
    pub const fn change_type(&self) -> Option<ChangeType> {
        match self {
            Self::Baseline(_) => None,
            Self::Added(_) => Some(ChangeType::Added),
            Self::Modified(_) => Some(ChangeType::Modified),
            Self::Removed(_) => Some(ChangeType::Removed),
        }
    }

    /// Interpret the entry as a full item, ignoring its tag.
    ///
    /// The first snapshot of a log is always read this way.
    #[must_use]
    pub fn into_full_item(self) -> Item {
        match self {
            Self::Baseline(item) | Self::Added(item) => item,
            Self::Modified(record) => {
                crate::merge::apply_change(&Item::with_id(record.id.clone()), &record)
            }
            Self::Removed(tombstone) => Item {
                id: tombstone.id,
                title: tombstone.title,
                ..Item::default()
            },
        }
    }

    fn payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Baseline(item) | Self::Added(item) => serde_json::to_value(item),
            Self::Modified(record) => serde_json::to_value(record),
            Self::Removed(tombstone) => serde_json::to_value(tombstone),
        }
    }
}

impl Serialize for LogEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = self.payload().map_err(serde::ser::Error::custom)?;
        if let (Some(kind), Some(map)) = (self.change_type(), value.as_object_mut()) {
            map.insert(CHANGE_TYPE_KEY.to_string(), Value::from(kind.as_str()));
        }
        value.serialize(serializer)
    }
}

impl LogEntry {
    /// Decode one snapshot entry written with `encoding`.
    ///
    /// # Errors
    ///
    /// Fails if the entry is not an object, carries an unknown
    /// `changeType`, or its fields do not match the tagged kind.
    pub fn from_value(mut value: Value, encoding: ClearEncoding) -> Result<Self, serde_json::Error> {
        use serde_json::Error;

        let Some(map) = value.as_object_mut() else {
            return Err(Error::custom("snapshot entry must be a JSON object"));
        };

        let kind = match map.remove(CHANGE_TYPE_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(tag)) if tag.is_empty() => None,
            Some(tag) => Some(serde_json::from_value::<ChangeType>(tag)?),
        };

        let entry = match kind {
            None => Self::Baseline(serde_json::from_value(value)?),
            Some(ChangeType::Added) => Self::Added(serde_json::from_value(value)?),
            Some(ChangeType::Modified) => {
                let mut record: ChangeRecord = serde_json::from_value(value)?;
                if encoding == ClearEncoding::Sentinel {
                    record.estimate = record.estimate.clear_if(|&points| points == 0);
                }
                Self::Modified(record)
            }
            Some(ChangeType::Removed) => Self::Removed(serde_json::from_value(value)?),
        };
        Ok(entry)
    }
}

impl<'de> Deserialize<'de> for LogEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value, ClearEncoding::Null).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_between_covers_all_cases() {
        let eq = |a: &u32, b: &u32| a == b;
        assert_eq!(Patch::between(None, Some(&3), eq), Patch::Set(3));
        assert_eq!(Patch::between(Some(&3), None, eq), Patch::<u32>::Cleared);
        assert_eq!(Patch::between(Some(&3), Some(&5), eq), Patch::Set(5));
        assert_eq!(Patch::between(Some(&3), Some(&3), eq), Patch::Unchanged);
        assert_eq!(Patch::<u32>::between(None, None, eq), Patch::Unchanged);
    }

    #[test]
    fn patch_wire_format_distinguishes_clear_from_unchanged() {
        let mut record = ChangeRecord::new("1");
        record.estimate = Patch::Cleared;
        record.status = Patch::Set("Done".into());

        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json, json!({"id": "1", "estimate": null, "status": "Done"}));

        let back: ChangeRecord = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.estimate, Patch::Cleared);
        assert_eq!(back.status, Patch::Set("Done".into()));
        assert_eq!(back.milestone, Patch::Unchanged);
    }

    #[test]
    fn zero_estimate_is_a_value_not_a_clear() {
        let record: ChangeRecord =
            serde_json::from_value(json!({"id": "1", "estimate": 0})).expect("deserialize");
        assert_eq!(record.estimate, Patch::Set(0));
    }

    #[test]
    fn empty_record_detection() {
        let mut record = ChangeRecord::new("1");
        record.issue_number = Some(9);
        record.content = Some(ContentPatch::default());
        assert!(record.is_empty());

        record.labels = Some(vec![]);
        assert!(!record.is_empty());
    }

    #[test]
    fn entry_tag_round_trips() {
        let removed = LogEntry::Removed(Tombstone {
            id: "2".into(),
            issue_number: None,
            title: "Old".into(),
        });
        let json = serde_json::to_value(&removed).expect("serialize");
        assert_eq!(json, json!({"id": "2", "title": "Old", "changeType": "removed"}));
        let back: LogEntry = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, removed);
    }

    #[test]
    fn untagged_entry_is_baseline() {
        let entry: LogEntry =
            serde_json::from_value(json!({"id": "1", "title": "T"})).expect("deserialize");
        assert_eq!(entry.change_type(), None);
        assert!(matches!(entry, LogEntry::Baseline(ref item) if item.title == "T"));

        let blank_tag: LogEntry =
            serde_json::from_value(json!({"id": "1", "changeType": ""})).expect("deserialize");
        assert!(matches!(blank_tag, LogEntry::Baseline(_)));
    }

    #[test]
    fn baseline_entry_serializes_without_tag() {
        let json = serde_json::to_value(LogEntry::Baseline(Item::with_id("1"))).expect("serialize");
        assert_eq!(json, json!({"id": "1"}));
    }

    #[test]
    fn unknown_change_type_is_rejected() {
        let err = serde_json::from_value::<LogEntry>(json!({"id": "1", "changeType": "renamed"}))
            .expect_err("unknown tag must fail");
        assert!(err.to_string().contains("renamed"));
    }

    #[test]
    fn non_object_entry_is_rejected() {
        assert!(serde_json::from_value::<LogEntry>(json!(["1"])).is_err());
    }

    #[test]
    fn overlay_skips_empty_fields() {
        let item = Item {
            id: "1".into(),
            title: "T".into(),
            status: Some("Todo".into()),
            ..Item::default()
        };
        let record = ChangeRecord::overlay(&item);
        assert_eq!(record.title.as_deref(), Some("T"));
        assert_eq!(record.status, Patch::Set("Todo".into()));
        assert!(record.labels.is_none());
        assert!(record.estimate.is_unchanged());
        assert!(record.content.is_none());
    }

    #[test]
    fn tombstone_tagged_first_snapshot_entry_becomes_item() {
        let entry = LogEntry::Removed(Tombstone {
            id: "5".into(),
            issue_number: None,
            title: "Gone".into(),
        });
        let item = entry.into_full_item();
        assert_eq!(item.id, "5");
        assert_eq!(item.title, "Gone");
    }

    #[test]
    fn empty_status_and_untitled_values_decode_as_clears() {
        let record: ChangeRecord = serde_json::from_value(
            json!({"id": "1", "status": "", "milestone": {}, "sprint": {"iterationId": "x"}}),
        )
        .expect("deserialize");
        assert_eq!(record.status, Patch::Cleared);
        assert_eq!(record.milestone, Patch::Cleared);
        assert_eq!(record.sprint, Patch::Cleared);
        assert!(!record.is_empty());
    }

    #[test]
    fn zero_estimate_clears_only_under_sentinel_encoding() {
        let wire = json!({"id": "1", "estimate": 0, "changeType": "modified"});

        let legacy = LogEntry::from_value(wire.clone(), ClearEncoding::Sentinel).expect("decode");
        assert!(matches!(legacy, LogEntry::Modified(ref r) if r.estimate == Patch::Cleared));

        let current = LogEntry::from_value(wire, ClearEncoding::Null).expect("decode");
        assert!(matches!(current, LogEntry::Modified(ref r) if r.estimate == Patch::Set(0)));
    }

    #[test]
    fn sentinel_encoding_leaves_full_items_alone() {
        let wire = json!({"id": "1", "estimate": 0, "changeType": "added"});
        let entry = LogEntry::from_value(wire, ClearEncoding::Sentinel).expect("decode");
        assert!(matches!(entry, LogEntry::Added(ref item) if item.estimate == Some(0)));
    }
}
