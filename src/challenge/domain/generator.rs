//! Pure fan-out generation of task status rows.
//!
//! This is the combinatorial core of the crate: expanding a day range, a
//! template set, and a member set into one not-started status row per
//! `(user, template, matching day)` triple. It performs no I/O; callers
//! persist the produced rows inside whatever transaction triggered the
//! generation.

use super::{calendar::DayRange, ids::UserId, status::TaskStatus, template::TaskTemplate};
use chrono::Datelike;

/// Generates the status rows for a day range, template set, and member set.
///
/// For each day in the half-open range, each template whose weekday mask
/// covers that day's weekday contributes one [`TaskStatus::fresh`] row per
/// user. Complexity is `O(days × templates × users)`. An empty template or
/// user set produces an empty result.
///
/// Rows are emitted in deterministic (day, template, user) order following
/// the order of the input slices. The generator never deduplicates: callers
/// invoke it only for users without existing coverage, and the persistence
/// layer's `(user, template, date)` unique key rejects any overlap that
/// slips through.
#[must_use]
pub fn generate_statuses(
    range: DayRange,
    templates: &[TaskTemplate],
    users: &[UserId],
) -> Vec<TaskStatus> {
    let mut rows = Vec::new();
    for day in range.days() {
        let weekday = day.weekday();
        for template in templates {
            if !template.weekdays().contains(weekday) {
                continue;
            }
            for user in users {
                rows.push(TaskStatus::fresh(*user, template.id(), day));
            }
        }
    }
    rows
}
