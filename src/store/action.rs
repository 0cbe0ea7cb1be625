//! Actions accepted by the store.

use crate::domain::{Task, TaskId, validate_color, validate_description, validate_title};
use crate::error::ValidationError;

/// A request to change the store.
///
/// The variants can be built directly for trusted input. User input should go
/// through the validating constructors ([`Action::add`], [`Action::update`],
/// [`Action::set_complete_color`]), which trim and check it first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace every record and rebuild the index.
    Seed(Vec<Task>),
    /// Create a pending task at the head of the list.
    Add {
        /// Title of the new task.
        title: String,
        /// Description of the new task.
        description: String,
    },
    /// Replace the title and description of an existing task.
    Update {
        /// Task to edit.
        id: TaskId,
        /// Replacement title.
        title: String,
        /// Replacement description.
        description: String,
    },
    /// Delete a task.
    Delete(TaskId),
    /// Flip a task between pending and completed.
    Toggle(TaskId),
    /// Change the completed-task colour.
    SetCompleteColor(String),
}

impl Action {
    /// Builds a [`Action::Seed`].
    #[must_use]
    pub const fn seed(tasks: Vec<Task>) -> Self {
        Self::Seed(tasks)
    }

    /// Validates input and builds an [`Action::Add`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a blank or overlong title or an
    /// overlong description.
    pub fn add(title: &str, description: &str) -> Result<Self, ValidationError> {
        Ok(Self::Add {
            title: validate_title(title)?,
            description: validate_description(description)?,
        })
    }

    /// Validates input and builds an [`Action::Update`].
    ///
    /// # Errors
    ///
    /// Same as [`Action::add`].
    pub fn update(id: TaskId, title: &str, description: &str) -> Result<Self, ValidationError> {
        Ok(Self::Update {
            id,
            title: validate_title(title)?,
            description: validate_description(description)?,
        })
    }

    /// Builds a [`Action::Delete`].
    #[must_use]
    pub const fn delete(id: TaskId) -> Self {
        Self::Delete(id)
    }

    /// Builds a [`Action::Toggle`].
    #[must_use]
    pub const fn toggle(id: TaskId) -> Self {
        Self::Toggle(id)
    }

    /// Validates a colour and builds an [`Action::SetCompleteColor`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidColor`].
    pub fn set_complete_color(color: &str) -> Result<Self, ValidationError> {
        Ok(Self::SetCompleteColor(validate_color(color)?))
    }

    /// Returns a short name for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Seed(_) => "seed",
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Delete(_) => "delete",
            Self::Toggle(_) => "toggle",
            Self::SetCompleteColor(_) => "set_complete_color",
        }
    }

    /// Returns the task the action targets, if it targets an existing one.
    #[must_use]
    pub const fn target(&self) -> Option<TaskId> {
        match self {
            Self::Update { id, .. } | Self::Delete(id) | Self::Toggle(id) => Some(*id),
            Self::Seed(_) | Self::Add { .. } | Self::SetCompleteColor(_) => None,
        }
    }
}
