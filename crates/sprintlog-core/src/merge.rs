//! Apply a [`ChangeRecord`] to a base item.

use crate::model::{ChangeRecord, Content, Item};

/// Return `base` with `record` applied. `base` is not modified.
///
/// Sequences and the title are replaced wholesale when present; a present
/// empty title blanks the base title, since the diff only emits a title
/// that actually changed. Optional
/// fields follow their [`Patch`](crate::model::Patch): cleared fields
/// become absent, set fields take the new value. Content leaves overwrite
/// only the matching leaves of the base content.
#[must_use]
pub fn apply_change(base: &Item, record: &ChangeRecord) -> Item {
    let mut item = base.clone();

    if let Some(assignees) = &record.assignees {
        item.assignees.clone_from(assignees);
    }

    if let Some(patch) = &record.content {
        if !patch.is_empty() {
            let content = item.content.get_or_insert_with(Content::default);
            if let Some(body) = &patch.body {
                content.body.clone_from(body);
            }
            if let Some(title) = &patch.title {
                content.title.clone_from(title);
            }
        }
    }

    record.estimate.apply_to(&mut item.estimate);

    if let Some(labels) = &record.labels {
        item.labels.clone_from(labels);
    }

    record.milestone.apply_to(&mut item.milestone);
    record.sprint.apply_to(&mut item.sprint);
    record.status.apply_to(&mut item.status);

    if let Some(title) = &record.title {
        item.title.clone_from(title);
    }

    if let Some(comments) = &record.comments {
        item.comments.clone_from(comments);
    }

    item
}
