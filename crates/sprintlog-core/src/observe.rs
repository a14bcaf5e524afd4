//! Loading an observed board export.
//!
//! The export is a JSON object `{"items": [...]}`. Issue comments live in
//! side files named `comments-<issue number>.json` (`{"comments": [...]}`)
//! next to it; they are attached to every item whose content is an issue.
//! Comment lookups never fail the run: a missing file means no comments, a
//! broken one is reported as a [`CommentWarning`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ErrorCode;
use crate::model::{Comment, Item};

/// File name of the board export inside the input directory.
pub const ITEMS_FILE: &str = "items.json";

/// Errors loading the observed items.
#[derive(Debug, thiserror::Error)]
pub enum ObserveError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl ObserveError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } | Self::Parse { .. } => ErrorCode::MalformedInput,
        }
    }
}

/// A comment side file that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentWarning {
    pub issue_number: u64,
    pub reason: String,
}

/// Items of one board export plus any recovered comment failures.
#[derive(Debug, Clone, Default)]
pub struct Observation {
    pub items: Vec<Item>,
    pub warnings: Vec<CommentWarning>,
}

#[derive(Deserialize)]
struct ItemsFile {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Deserialize)]
struct CommentsFile {
    #[serde(default)]
    comments: Vec<Comment>,
}

/// Path of the comments side file for `issue_number`.
#[must_use]
pub fn comments_path(dir: &Path, issue_number: u64) -> PathBuf {
    dir.join(format!("comments-{issue_number}.json"))
}

/// Load the board export at `items_path` and attach issue comments from
/// `comments_dir`.
///
/// # Errors
///
/// Returns [`ObserveError`] if the export cannot be read or parsed. Comment
/// failures are collected in [`Observation::warnings`] instead.
pub fn load_observed(items_path: &Path, comments_dir: &Path) -> Result<Observation, ObserveError> {
    let data = fs::read(items_path).map_err(|source| ObserveError::Io {
        path: items_path.to_path_buf(),
        source,
    })?;
    let parsed: ItemsFile = serde_json::from_slice(&data).map_err(|source| ObserveError::Parse {
        path: items_path.to_path_buf(),
        source,
    })?;

    let mut observation = Observation {
        items: parsed.items,
        warnings: Vec::new(),
    };

    for item in &mut observation.items {
        if !item.is_issue() {
            continue;
        }
        let Some(number) = item.issue_number() else {
            continue;
        };

        match read_comments(&comments_path(comments_dir, number)) {
            Ok(comments) => item.comments = comments,
            Err(reason) => {
                warn!(issue = number, %reason, "skipping comments for issue");
                observation.warnings.push(CommentWarning {
                    issue_number: number,
                    reason,
                });
            }
        }
    }

    debug!(
        path = %items_path.display(),
        items = observation.items.len(),
        warnings = observation.warnings.len(),
        "loaded observed items"
    );
    Ok(observation)
}

fn read_comments(path: &Path) -> Result<Vec<Comment>, String> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(format!("reading {}: {err}", path.display())),
    };
    serde_json::from_slice::<CommentsFile>(&data)
        .map(|file| file.comments)
        .map_err(|err| format!("parsing {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).expect("write fixture");
        path
    }

    const ITEMS: &str = r#"{"items": [
        {"id": "1", "title": "Issue", "content": {"type": "Issue", "number": 10}},
        {"id": "2", "title": "PR", "content": {"type": "PullRequest", "number": 11}},
        {"id": "3", "title": "Draft"}
    ]}"#;

    #[test]
    fn attaches_comments_to_issues_only() {
        let dir = TempDir::new().expect("tempdir");
        let items = write(dir.path(), ITEMS_FILE, ITEMS);
        write(
            dir.path(),
            "comments-10.json",
            r#"{"comments": [{"author": {"login": "ana"}, "body": "on it"}]}"#,
        );
        write(
            dir.path(),
            "comments-11.json",
            r#"{"comments": [{"author": {"login": "bo"}, "body": "ignored"}]}"#,
        );

        let observation = load_observed(&items, dir.path()).expect("load");
        assert!(observation.warnings.is_empty());
        assert_eq!(observation.items.len(), 3);
        assert_eq!(observation.items[0].comments.len(), 1);
        assert_eq!(observation.items[0].comments[0].author.login, "ana");
        assert!(observation.items[1].comments.is_empty());
        assert!(observation.items[2].comments.is_empty());
    }

    #[test]
    fn missing_comment_file_is_silent() {
        let dir = TempDir::new().expect("tempdir");
        let items = write(dir.path(), ITEMS_FILE, ITEMS);
        let observation = load_observed(&items, dir.path()).expect("load");
        assert!(observation.warnings.is_empty());
        assert!(observation.items[0].comments.is_empty());
    }

    #[test]
    fn broken_comment_file_is_a_warning() {
        let dir = TempDir::new().expect("tempdir");
        let items = write(dir.path(), ITEMS_FILE, ITEMS);
        write(dir.path(), "comments-10.json", "not json");

        let observation = load_observed(&items, dir.path()).expect("load");
        assert_eq!(observation.warnings.len(), 1);
        assert_eq!(observation.warnings[0].issue_number, 10);
        assert!(observation.warnings[0].reason.contains("comments-10.json"));
        assert!(observation.items[0].comments.is_empty());
    }

    #[test]
    fn malformed_export_is_fatal() {
        let dir = TempDir::new().expect("tempdir");
        let items = write(dir.path(), ITEMS_FILE, "{\"items\": [");
        let err = load_observed(&items, dir.path()).expect_err("must fail");
        assert!(matches!(err, ObserveError::Parse { .. }));
        assert_eq!(err.code(), ErrorCode::MalformedInput);
    }

    #[test]
    fn missing_export_is_an_io_error() {
        let dir = TempDir::new().expect("tempdir");
        let err = load_observed(&dir.path().join(ITEMS_FILE), dir.path()).expect_err("must fail");
        assert!(matches!(err, ObserveError::Io { .. }));
    }
}
