//! Sprint burndown aggregate.

use serde::Serialize;

use crate::model::Item;

/// Statuses counted as finished when none are configured.
pub const DEFAULT_DONE_STATUSES: [&str; 3] = ["✔️Awaiting QA", "Done", "✅ Ready for release"];

/// Estimate totals of one sprint at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BurndownPoint {
    /// Sum of estimates of every item in the sprint.
    pub total: u64,
    /// Sum of estimates of items not in a done status.
    pub remaining: u64,
    /// Number of items in the sprint.
    pub items: usize,
}

impl BurndownPoint {
    /// True when no estimated work belongs to the sprint.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Sum estimates of the items in `sprint`. Items without an estimate count
/// as zero.
#[must_use]
pub fn summarize<S: AsRef<str>>(items: &[Item], sprint: &str, done_statuses: &[S]) -> BurndownPoint {
    let is_done = |status: Option<&str>| {
        status.is_some_and(|status| done_statuses.iter().any(|done| done.as_ref() == status))
    };

    items
        .iter()
        .filter(|item| item.sprint_title() == Some(sprint))
        .fold(BurndownPoint::default(), |mut point, item| {
            let estimate = u64::from(item.estimate.unwrap_or(0));
            point.total += estimate;
            if !is_done(item.status.as_deref()) {
                point.remaining += estimate;
            }
            point.items += 1;
            point
        })
}
