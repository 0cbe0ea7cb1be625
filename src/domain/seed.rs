//! Sample tasks for bootstrapping a store.

use chrono::TimeDelta;

use super::task::{Task, TaskId, TaskStatus, Timestamp};

/// Returns the three sample tasks the application starts with, stamped a few
/// milliseconds before `now` in creation order. The second one is completed.
#[must_use]
pub fn sample_tasks(now: Timestamp) -> Vec<Task> {
    let before = |milliseconds: i64| {
        Timestamp::from_datetime(*now.as_datetime() - TimeDelta::milliseconds(milliseconds))
    };

    vec![
        Task::new(
            TaskId::new(1),
            "Test color picker and searchbar",
            "Implement color picker for completed tasks and search bar for filtering tasks.",
            before(3),
        ),
        Task::new(
            TaskId::new(2),
            "Test edit screen",
            "Allow users to edit title and description.",
            before(2),
        )
        .with_status(TaskStatus::Completed),
        Task::new(
            TaskId::new(3),
            "Test on mobile",
            "Ensure UI works on both iOS and Android devices.",
            before(1),
        ),
    ]
}
