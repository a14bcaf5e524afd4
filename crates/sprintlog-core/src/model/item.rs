use serde::{Deserialize, Deserializer, Serialize};

/// Content type reported by the board for linked issues.
pub const ISSUE_KIND: &str = "Issue";

/// One project-board entry as observed (or reconstructed).
///
/// Field names follow the board export (`camelCase`). Empty sequences and
/// absent optionals are omitted when serialized so baseline snapshots stay
/// compact.
///
/// Exports written by older tooling use `null` for empty lists and empty
/// values (`""`, `{}`) for unset fields; both decode to the empty/absent
/// form here, so an empty status or an untitled milestone or sprint never
/// appears on a decoded item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<u32>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_empty"
    )]
    pub labels: Vec<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "untitled_as_none"
    )]
    pub milestone: Option<Milestone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "untitled_as_none"
    )]
    pub sprint: Option<Sprint>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_as_none"
    )]
    pub status: Option<String>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_empty"
    )]
    pub assignees: Vec<String>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_empty"
    )]
    pub comments: Vec<Comment>,
}

impl Item {
    /// An item carrying only its identifier.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Issue number of the linked content, if any.
    #[must_use]
    pub fn issue_number(&self) -> Option<u64> {
        self.content.as_ref().and_then(|c| c.number)
    }

    /// True when the linked content is a repository issue (and so may
    /// carry comments).
    #[must_use]
    pub fn is_issue(&self) -> bool {
        self.content.as_ref().is_some_and(|c| c.kind == ISSUE_KIND)
    }

    /// Body of the linked content, or `""` when there is none.
    #[must_use]
    pub fn content_body(&self) -> &str {
        self.content.as_ref().map_or("", |c| c.body.as_str())
    }

    /// Title of the linked content, or `""` when there is none.
    #[must_use]
    pub fn content_title(&self) -> &str {
        self.content.as_ref().map_or("", |c| c.title.as_str())
    }

    /// Title of the sprint the item belongs to, if any.
    #[must_use]
    pub fn sprint_title(&self) -> Option<&str> {
        self.sprint.as_ref().map(|s| s.title.as_str())
    }
}

/// The artifact an item links to (issue, pull request, or draft).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Content {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub repository: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Milestone {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub due_on: String,
    pub title: String,
}

/// Iteration field value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Sprint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub iteration_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub start_date: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub author: Author,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub login: String,
}

/// Board values identified by their title; an empty title means unset.
pub(crate) trait Titled {
    fn title(&self) -> &str;
}

impl Titled for Milestone {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Titled for Sprint {
    fn title(&self) -> &str {
        &self.title
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(deserializer).map(|value| value.filter(|s| !s.is_empty()))
}

fn untitled_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Titled,
{
    Option::<T>::deserialize(deserializer).map(|value| value.filter(|v| !v.title().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_board_export_shape() {
        let json = r#"{
            "id": "PVTI_1",
            "title": "Fix login",
            "content": {"body": "b", "number": 42, "repository": "org/app", "title": "Fix login", "type": "Issue", "url": "https://example.test/42"},
            "estimate": 3,
            "labels": ["bug"],
            "milestone": {"title": "v1", "dueOn": "2026-01-01"},
            "sprint": {"title": "Sprint 7", "iterationId": "abc", "startDate": "2026-01-05", "duration": 14},
            "status": "Todo",
            "assignees": ["ana"]
        }"#;

        let item: Item = serde_json::from_str(json).expect("parse item");
        assert_eq!(item.id, "PVTI_1");
        assert_eq!(item.issue_number(), Some(42));
        assert!(item.is_issue());
        assert_eq!(item.estimate, Some(3));
        assert_eq!(item.milestone.as_ref().map(|m| m.due_on.as_str()), Some("2026-01-01"));
        assert_eq!(item.sprint_title(), Some("Sprint 7"));
        assert_eq!(item.sprint.as_ref().and_then(|s| s.duration), Some(14));
        assert!(item.comments.is_empty());
    }

    #[test]
    fn zero_estimate_is_distinct_from_absent() {
        let zero: Item = serde_json::from_str(r#"{"id":"1","estimate":0}"#).expect("parse");
        let none: Item = serde_json::from_str(r#"{"id":"1"}"#).expect("parse");
        assert_eq!(zero.estimate, Some(0));
        assert_eq!(none.estimate, None);
        assert_ne!(zero, none);
    }

    #[test]
    fn empty_fields_are_omitted() {
        let json = serde_json::to_value(Item::with_id("7")).expect("serialize");
        assert_eq!(json, serde_json::json!({"id": "7"}));
    }

    #[test]
    fn content_accessors_default_to_empty() {
        let item = Item::with_id("1");
        assert_eq!(item.content_body(), "");
        assert_eq!(item.content_title(), "");
        assert_eq!(item.issue_number(), None);
        assert!(!item.is_issue());
    }

    #[test]
    fn null_lists_decode_as_empty() {
        let item: Item = serde_json::from_str(
            r#"{"id":"1","labels":null,"assignees":null,"comments":null}"#,
        )
        .expect("parse");
        assert!(item.labels.is_empty());
        assert!(item.assignees.is_empty());
        assert!(item.comments.is_empty());
    }

    #[test]
    fn empty_values_decode_as_unset() {
        let item: Item = serde_json::from_str(
            r#"{"id":"1","status":"","milestone":{},"sprint":{"duration":0}}"#,
        )
        .expect("parse");
        assert_eq!(item.status, None);
        assert_eq!(item.milestone, None);
        assert_eq!(item.sprint, None);

        let null: Item =
            serde_json::from_str(r#"{"id":"1","status":null,"sprint":null}"#).expect("parse");
        assert_eq!(null, Item::with_id("1"));
    }
}
