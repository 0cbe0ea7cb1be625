//! Domain model for task records.

mod seed;
mod task;
mod validate;

pub use seed::sample_tasks;
pub use task::{DEFAULT_COMPLETE_COLOR, Settings, Task, TaskId, TaskStatus, Timestamp};
pub use validate::{validate_color, validate_description, validate_title};
