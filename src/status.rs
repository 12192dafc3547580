//! Epic status aggregation.
//!
//! An epic's status is a pure function of its subtasks' current statuses,
//! recomputed from scratch on every trigger. Precedence, first match wins:
//!
//! 1. no subtasks: `NEW`
//! 2. every subtask `DONE`: `DONE`
//! 3. any subtask `IN_PROGRESS`: `IN_PROGRESS`
//! 4. otherwise: `NEW`
//!
//! Rule 4 covers a mix of `NEW` and `DONE` subtasks. Such an epic reports
//! `NEW`; finished subtasks alone do not count as progress.

use crate::issue::Status;

/// Derive an epic status from its subtasks' statuses.
pub fn aggregate<I>(statuses: I) -> Status
where
    I: IntoIterator<Item = Status>,
{
    let mut any = false;
    let mut all_done = true;
    let mut any_in_progress = false;

    for status in statuses {
        any = true;
        match status {
            Status::Done => {}
            Status::InProgress => {
                all_done = false;
                any_in_progress = true;
            }
            Status::New => all_done = false,
        }
    }

    if !any {
        Status::New
    } else if all_done {
        Status::Done
    } else if any_in_progress {
        Status::InProgress
    } else {
        Status::New
    }
}
