//! Task domain model.
//!
//! Tasks are immutable values. Every change produces a new `Task`, and the
//! caller supplies the timestamp so that all functions here stay pure.

use chrono::{DateTime, Utc};

use crate::index::Titled;

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a task.
///
/// Identifiers are minted by the store in increasing order and are never
/// reused within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TaskId(u64);

impl TaskId {
    /// Creates a `TaskId` from its numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the identifier that follows this one, or `None` at `u64::MAX`.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A timestamp wrapper for `DateTime<Utc>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    ///
    /// This is a pure function.
    #[must_use]
    pub const fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Returns the inner `DateTime<Utc>`.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the current time as a `Timestamp`.
    ///
    /// **Note**: This is an impure function (side effect: system clock).
    /// Only [`Store::dispatch`](crate::store::Store::dispatch) calls it; the
    /// reducer receives the result as an argument.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

// =============================================================================
// Enums
// =============================================================================

/// The status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TaskStatus {
    /// Task is still to be done.
    #[default]
    Pending,
    /// Task is done.
    Completed,
}

impl TaskStatus {
    /// Returns the other status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }

    /// Returns `true` if the task is done.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(formatter, "Pending"),
            Self::Completed => write!(formatter, "Completed"),
        }
    }
}

// =============================================================================
// Task
// =============================================================================

/// A task record.
///
/// Owned by the store. The inverted index only ever sees the identifier and
/// the title, through [`Titled`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Task {
    /// Unique identifier for the task.
    pub id: TaskId,
    /// Title of the task. Indexed for search.
    pub title: String,
    /// Free-form description. Not indexed.
    pub description: String,
    /// Current status of the task.
    pub status: TaskStatus,
    /// Timestamp when the task was created.
    pub created_at: Timestamp,
    /// Timestamp when the task was last updated.
    pub updated_at: Timestamp,
}

impl Task {
    /// Creates a pending task whose timestamps are both `timestamp`.
    ///
    /// This is a pure function.
    #[must_use]
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        description: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    // -------------------------------------------------------------------------
    // Builder-style methods (pure immutable updates)
    // -------------------------------------------------------------------------

    /// Returns a new task with the given status.
    ///
    /// Does not touch `updated_at`; used when assembling seed data.
    #[must_use]
    pub fn with_status(self, status: TaskStatus) -> Self {
        Self { status, ..self }
    }

    /// Returns a copy with a new title and description, updated at `now`.
    #[must_use]
    pub fn edited(&self, title: impl Into<String>, description: impl Into<String>, now: Timestamp) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            updated_at: now,
            ..self.clone()
        }
    }

    /// Returns a copy with the status flipped, updated at `now`.
    #[must_use]
    pub fn toggled(&self, now: Timestamp) -> Self {
        Self {
            status: self.status.toggled(),
            updated_at: now,
            ..self.clone()
        }
    }
}

impl Titled for Task {
    type Id = TaskId;

    fn id(&self) -> &TaskId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Default background colour for completed tasks (soft green).
pub const DEFAULT_COMPLETE_COLOR: &str = "#E6F4EA";

/// Cosmetic settings carried in every snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    /// Background colour for completed tasks.
    pub complete_color: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            complete_color: DEFAULT_COMPLETE_COLOR.to_string(),
        }
    }
}
