//! Recurrence scheduling.
//!
//! A pure function from (approved chore, approval date) to the draft of its
//! successor. The chore state machine applies the resulting insert inside the
//! approval transaction; nothing here touches the store.

use crate::core::time;
use crate::domain::chores::{Chore, Recurrence};
use chrono::NaiveDate;

/// Draft of the next instance of a recurring chore.
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessorDraft {
    pub title: String,
    pub description: String,
    pub points: i64,
    pub recurrence: Recurrence,
    pub due_date: NaiveDate,
    pub assignee_ids: Vec<String>,
}

/// The successor spawned by approving `chore` on `today`, or `None` for
/// non-recurring chores.
///
/// The successor keeps the source chore's title, description, points,
/// recurrence, and assignees. Its due date steps forward from the source's
/// due date, or from `today` when the source had none. Exactly one successor
/// exists per approval; chores are linked only by this shared metadata.
pub fn successor(chore: &Chore, today: NaiveDate) -> Option<SuccessorDraft> {
    let interval_days = match chore.recurrence {
        Recurrence::None => return None,
        Recurrence::Daily => 1,
        Recurrence::Weekly => 7,
    };
    let base = chore.due_date.unwrap_or(today);
    Some(SuccessorDraft {
        title: chore.title.clone(),
        description: chore.description.clone(),
        points: chore.points,
        recurrence: chore.recurrence,
        due_date: time::add_days(base, interval_days),
        assignee_ids: chore.assignees.clone(),
    })
}
