//! Query facade over a snapshot.
//!
//! Queries run against the index and resolve identifiers back to records of
//! the same snapshot. Results follow ascending identifier order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{Task, TaskId};
use crate::store::Snapshot;

/// Returns the records matching `raw` as a token prefix.
///
/// A blank query returns every record in store order.
///
/// # Examples
///
/// ```rust
/// use taskdex::config::StoreConfig;
/// use taskdex::domain::{Task, TaskId, Timestamp};
/// use taskdex::query::search;
/// use taskdex::store::Store;
///
/// let now = Timestamp::now();
/// let store = Store::with_tasks(
///     &StoreConfig::default(),
///     vec![
///         Task::new(TaskId::new(1), "Buy milk", "", now),
///         Task::new(TaskId::new(2), "Buy bread", "", now),
///     ],
/// );
///
/// let state = store.state();
/// assert_eq!(search(&state, "mi").len(), 1);
/// assert_eq!(search(&state, "  ").len(), 2);
/// ```
#[must_use]
pub fn search(snapshot: &Snapshot, raw: &str) -> Vec<Arc<Task>> {
    if raw.trim().is_empty() {
        return snapshot.records().to_vec();
    }
    resolve(snapshot, &snapshot.index().query_prefix(raw), raw)
}

/// Returns the records having `raw` as a whole token. A blank query matches
/// nothing.
#[must_use]
pub fn search_exact(snapshot: &Snapshot, raw: &str) -> Vec<Arc<Task>> {
    resolve(snapshot, &snapshot.index().query_exact(raw), raw)
}

/// Returns the record with identifier `id`.
#[must_use]
pub fn select_by_id(snapshot: &Snapshot, id: TaskId) -> Option<Arc<Task>> {
    snapshot.select_by_id(id).cloned()
}

fn resolve(snapshot: &Snapshot, ids: &[TaskId], query: &str) -> Vec<Arc<Task>> {
    if ids.is_empty() {
        return Vec::new();
    }
    let by_id: HashMap<TaskId, &Arc<Task>> = snapshot
        .records()
        .iter()
        .map(|task| (task.id, task))
        .collect();

    ids.iter()
        .filter_map(|id| {
            let found = by_id.get(id).map(|task| Arc::clone(task));
            if found.is_none() {
                tracing::warn!(task_id = %id, query, "Dropping unresolved search result");
            }
            found
        })
        .collect()
}
