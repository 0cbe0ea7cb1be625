//! Immutable store state and the reducer that derives the next one.

use std::sync::Arc;

use crate::domain::{Settings, Task, TaskId, Timestamp};
use crate::error::IndexDivergence;
use crate::index::InvertedIndex;
use crate::tokenize::Tokenizer;

use super::Action;

/// Records, title index and settings at one point in time.
///
/// A snapshot is never modified. [`Snapshot::reduce`] builds the next one and
/// changes the records and the index in the same step, so no snapshot ever
/// pairs new records with a stale index.
///
/// Cloning is cheap: records are shared `Arc<Task>`s in a shared slice, and
/// the index is a persistent map.
#[derive(Debug, Clone)]
pub struct Snapshot {
    records: Arc<[Arc<Task>]>,
    index: InvertedIndex<TaskId>,
    settings: Settings,
    next_id: Option<TaskId>,
}

static_assertions::assert_impl_all!(Snapshot: Send, Sync);

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new(tokenizer: Tokenizer, settings: Settings) -> Self {
        Self {
            records: Arc::from(Vec::new()),
            index: InvertedIndex::new(tokenizer),
            settings,
            next_id: Some(TaskId::new(1)),
        }
    }

    /// Returns the records, most recently added first.
    #[must_use]
    pub fn records(&self) -> &[Arc<Task>] {
        &self.records
    }

    /// Returns the title index.
    #[must_use]
    pub const fn index(&self) -> &InvertedIndex<TaskId> {
        &self.index
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the identifier the next added task will get.
    ///
    /// `None` once `u64::MAX` has been used; further adds are ignored.
    #[must_use]
    pub const fn next_id(&self) -> Option<TaskId> {
        self.next_id
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record with identifier `id`.
    #[must_use]
    pub fn select_by_id(&self, id: TaskId) -> Option<&Arc<Task>> {
        self.records.iter().find(|task| task.id == id)
    }

    /// Checks that the index describes exactly the current records.
    ///
    /// # Errors
    ///
    /// Returns the first [`IndexDivergence`] found.
    pub fn check_consistency(&self) -> Result<(), IndexDivergence> {
        self.index.verify(self.records.iter())
    }

    /// Pairs these records with an arbitrary `index`.
    #[cfg(test)]
    pub(crate) fn with_index(&self, index: InvertedIndex<TaskId>) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }

    /// Applies `action` at time `now` and returns the resulting snapshot.
    ///
    /// Pure: the same snapshot, action and time always give the same result.
    /// Actions naming a missing task, and titles that are blank after
    /// trimming, leave the snapshot unchanged.
    #[must_use]
    pub fn reduce(&self, action: &Action, now: Timestamp) -> Self {
        match action {
            Action::Seed(tasks) => self.seed(tasks),
            Action::Add { title, description } => self.add(title, description, now),
            Action::Update {
                id,
                title,
                description,
            } => self.update(*id, title, description, now),
            Action::Delete(id) => self.delete(*id),
            Action::Toggle(id) => self.toggle(*id, now),
            Action::SetCompleteColor(color) => Self {
                settings: Settings {
                    complete_color: color.clone(),
                },
                ..self.clone()
            },
        }
    }

    fn seed(&self, tasks: &[Task]) -> Self {
        let records: Arc<[Arc<Task>]> = tasks.iter().cloned().map(Arc::new).collect();
        let index = InvertedIndex::build(self.index.tokenizer().clone(), records.iter());
        let next_id = self.next_id.and_then(|floor| {
            records
                .iter()
                .try_fold(floor, |next, task| task.id.next().map(|after| after.max(next)))
        });

        tracing::info!(
            records = records.len(),
            tokens = index.token_count(),
            next_id = ?next_id,
            "Seeded store"
        );

        Self {
            records,
            index,
            settings: self.settings.clone(),
            next_id,
        }
    }

    fn add(&self, title: &str, description: &str, now: Timestamp) -> Self {
        let title = title.trim();
        if title.is_empty() {
            tracing::warn!(action = "add", "Ignoring blank title");
            return self.clone();
        }

        let Some(id) = self.next_id else {
            tracing::warn!(action = "add", "Identifier space exhausted; no-op");
            return self.clone();
        };
        let task = Arc::new(Task::new(id, title, description.trim(), now));
        let index = self.index.add(&id, title);

        tracing::debug!(action = "add", task_id = %id, tokens = index.token_count(), "Added task");

        Self {
            records: std::iter::once(task)
                .chain(self.records.iter().cloned())
                .collect(),
            index,
            settings: self.settings.clone(),
            next_id: id.next(),
        }
    }

    fn update(&self, id: TaskId, title: &str, description: &str, now: Timestamp) -> Self {
        let title = title.trim();
        if title.is_empty() {
            tracing::warn!(action = "update", task_id = %id, "Ignoring blank title");
            return self.clone();
        }
        let Some(position) = self.position_of(id) else {
            tracing::debug!(action = "update", task_id = %id, "Task not found; no-op");
            return self.clone();
        };

        let previous = &self.records[position];
        let edited = Arc::new(previous.edited(title, description.trim(), now));
        let index = self.index.update(&id, &previous.title, &edited.title);

        tracing::debug!(action = "update", task_id = %id, tokens = index.token_count(), "Updated task");

        Self {
            records: self.replaced_at(position, edited),
            index,
            ..self.clone()
        }
    }

    fn delete(&self, id: TaskId) -> Self {
        let Some(position) = self.position_of(id) else {
            tracing::debug!(action = "delete", task_id = %id, "Task not found; no-op");
            return self.clone();
        };

        let index = self.index.remove(&id, &self.records[position].title);

        tracing::debug!(action = "delete", task_id = %id, tokens = index.token_count(), "Deleted task");

        Self {
            records: self
                .records
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != position)
                .map(|(_, task)| Arc::clone(task))
                .collect(),
            index,
            ..self.clone()
        }
    }

    fn toggle(&self, id: TaskId, now: Timestamp) -> Self {
        let Some(position) = self.position_of(id) else {
            tracing::debug!(action = "toggle", task_id = %id, "Task not found; no-op");
            return self.clone();
        };

        let toggled = Arc::new(self.records[position].toggled(now));

        tracing::debug!(action = "toggle", task_id = %id, status = %toggled.status, "Toggled task");

        Self {
            records: self.replaced_at(position, toggled),
            ..self.clone()
        }
    }

    fn position_of(&self, id: TaskId) -> Option<usize> {
        self.records.iter().position(|task| task.id == id)
    }

    fn replaced_at(&self, position: usize, task: Arc<Task>) -> Arc<[Arc<Task>]> {
        let mut records = self.records.to_vec();
        records[position] = task;
        Arc::from(records)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Snapshot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        struct Records<'a>(&'a [Arc<Task>]);

        impl serde::Serialize for Records<'_> {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_seq(self.0.iter().map(|task| &**task))
            }
        }

        let mut state = serializer.serialize_struct("Snapshot", 4)?;
        state.serialize_field("records", &Records(&self.records))?;
        state.serialize_field("index", &self.index)?;
        state.serialize_field("settings", &self.settings)?;
        state.serialize_field("next_id", &self.next_id)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};

    fn at(seconds: i64) -> Timestamp {
        Timestamp::from_datetime(Utc.timestamp_opt(seconds, 0).single().expect("valid timestamp"))
    }

    #[fixture]
    fn empty() -> Snapshot {
        Snapshot::new(Tokenizer::default(), Settings::default())
    }

    #[rstest]
    fn test_add_mints_increasing_ids(empty: Snapshot) {
        let first = empty.reduce(&Action::add("One", "").expect("valid"), at(1));
        let second = first.reduce(&Action::add("Two", "").expect("valid"), at(2));
        let ids: Vec<TaskId> = second.records().iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![TaskId::new(2), TaskId::new(1)]);
        assert_eq!(second.next_id(), Some(TaskId::new(3)));
    }

    #[rstest]
    fn test_blank_title_reaching_reducer_is_noop(empty: Snapshot) {
        let action = Action::Add {
            title: "   ".to_string(),
            description: String::new(),
        };
        let next = empty.reduce(&action, at(1));
        assert!(next.is_empty());
        assert!(next.index().ptr_eq(empty.index()));
        assert_eq!(next.next_id(), empty.next_id());
    }

    #[rstest]
    fn test_toggle_leaves_index_untouched(empty: Snapshot) {
        let added = empty.reduce(&Action::add("Buy milk", "").expect("valid"), at(1));
        let toggled = added.reduce(&Action::toggle(TaskId::new(1)), at(2));
        assert!(toggled.index().ptr_eq(added.index()));
        assert!(toggled.records()[0].status.is_completed());
        assert_eq!(toggled.records()[0].updated_at, at(2));
    }

    #[rstest]
    fn test_untouched_records_are_shared(empty: Snapshot) {
        let seeded = empty.reduce(
            &Action::seed(vec![
                Task::new(TaskId::new(1), "Alpha", "", at(0)),
                Task::new(TaskId::new(2), "Beta", "", at(0)),
            ]),
            at(0),
        );
        let toggled = seeded.reduce(&Action::toggle(TaskId::new(2)), at(1));
        assert!(Arc::ptr_eq(&seeded.records()[0], &toggled.records()[0]));
        assert!(!Arc::ptr_eq(&seeded.records()[1], &toggled.records()[1]));
    }

    #[rstest]
    fn test_seeding_max_id_exhausts_generator(empty: Snapshot) {
        let maximum = TaskId::new(u64::MAX);
        let seeded = empty.reduce(&Action::seed(vec![Task::new(maximum, "Buy milk", "", at(0))]), at(0));
        assert_eq!(seeded.next_id(), None);

        let added = seeded.reduce(&Action::add("Buy bread", "").expect("valid"), at(1));
        assert_eq!(added.len(), 1);
        assert!(added.index().ptr_eq(seeded.index()));
        assert_eq!(
            added.select_by_id(maximum).map(|task| task.title.as_str()),
            Some("Buy milk")
        );

        let deleted = added.reduce(&Action::delete(maximum), at(2));
        assert!(deleted.is_empty());
        assert_eq!(deleted.check_consistency(), Ok(()));
    }

    #[rstest]
    fn test_exhausted_generator_survives_reseed(empty: Snapshot) {
        let exhausted = empty.reduce(
            &Action::seed(vec![Task::new(TaskId::new(u64::MAX), "Last", "", at(0))]),
            at(0),
        );
        let reseeded = exhausted.reduce(&Action::seed(vec![Task::new(TaskId::new(1), "First", "", at(1))]), at(1));
        assert_eq!(reseeded.next_id(), None);
        let added = reseeded.reduce(&Action::add("Second", "").expect("valid"), at(2));
        assert_eq!(added.len(), 1);
    }
}
