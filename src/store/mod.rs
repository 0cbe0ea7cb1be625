//! Record store.
//!
//! [`Snapshot::reduce`] is the only way state changes. [`Store`] is the
//! handle an application shares: it holds the current snapshot behind an
//! atomic pointer, applies actions one at a time and publishes each result
//! with a single swap.
//!
//! Readers call [`Store::state`] and keep the returned `Arc<Snapshot>` for as
//! long as they like. Writers never touch a published snapshot, so readers
//! need no lock and can never observe records without their matching index.
//!
//! # Examples
//!
//! ```rust
//! use taskdex::config::StoreConfig;
//! use taskdex::store::{Action, Store};
//!
//! let store = Store::new(&StoreConfig::default());
//! store.dispatch(Action::add("Team standup", "").unwrap());
//!
//! let state = store.state();
//! assert_eq!(state.len(), 1);
//! assert_eq!(state.index().query_prefix("team"), vec![state.records()[0].id]);
//! ```

mod action;
mod snapshot;

pub use action::Action;
pub use snapshot::Snapshot;

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::StoreConfig;
use crate::domain::{Settings, Task, Timestamp};
#[cfg(debug_assertions)]
use crate::error::IndexDivergence;

/// Shared handle to the current [`Snapshot`].
///
/// Cloning the handle shares the same store.
#[derive(Clone)]
pub struct Store {
    state: Arc<ArcSwap<Snapshot>>,
}

impl Store {
    /// Creates a store with no records.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        let settings = Settings {
            complete_color: config.complete_color.clone(),
        };
        Self::from_snapshot(Snapshot::new(config.tokenizer(), settings))
    }

    /// Creates a store and seeds it with `tasks`.
    #[must_use]
    pub fn with_tasks(config: &StoreConfig, tasks: Vec<Task>) -> Self {
        let store = Self::new(config);
        store.dispatch(Action::Seed(tasks));
        store
    }

    /// Creates a store publishing `snapshot` as its initial state.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: Arc::new(ArcSwap::from_pointee(snapshot)),
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn state(&self) -> Arc<Snapshot> {
        self.state.load_full()
    }

    /// Applies `action`, timestamped now, and publishes the result.
    pub fn dispatch(&self, action: Action) {
        self.dispatch_at(&action, Timestamp::now());
    }

    /// Applies `action` at time `now`, publishes the result and returns it.
    ///
    /// Concurrent dispatches are serialized: if another writer publishes
    /// first, the reducer runs again on the newer snapshot.
    pub fn dispatch_at(&self, action: &Action, now: Timestamp) -> Arc<Snapshot> {
        let mut published = self.state.load_full();
        self.state.rcu(|current| {
            published = Arc::new(current.reduce(action, now));
            Arc::clone(&published)
        });

        tracing::debug!(
            action = action.kind(),
            records = published.len(),
            tokens = published.index().token_count(),
            "Published snapshot"
        );

        #[cfg(debug_assertions)]
        report_divergence(action, &published);

        published
    }
}

/// Logs the first index divergence of `published`, if any, and returns it.
#[cfg(debug_assertions)]
fn report_divergence(action: &Action, published: &Snapshot) -> Option<IndexDivergence> {
    let divergence = published.check_consistency().err()?;
    tracing::error!(
        action = action.kind(),
        error = %divergence,
        "Index diverged from records"
    );
    Some(divergence)
}

impl fmt::Debug for Store {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.load();
        formatter
            .debug_struct("Store")
            .field("records", &state.len())
            .field("tokens", &state.index().token_count())
            .field("next_id", &state.next_id())
            .finish()
    }
}

static_assertions::assert_impl_all!(Store: Send, Sync, Clone);

#[cfg(all(test, debug_assertions))]
mod tests {
    use super::*;
    use crate::domain::TaskId;
    use crate::index::InvertedIndex;
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};

    fn at(seconds: i64) -> Timestamp {
        Timestamp::from_datetime(Utc.timestamp_opt(seconds, 0).single().expect("valid timestamp"))
    }

    #[fixture]
    fn diverged() -> Snapshot {
        let seeded = Store::with_tasks(
            &StoreConfig::default(),
            vec![Task::new(TaskId::new(1), "Buy milk", "", at(0))],
        )
        .state();
        let stale = InvertedIndex::build(
            seeded.index().tokenizer().clone(),
            &[(TaskId::new(1), "Buy milk"), (TaskId::new(2), "Buy bread")],
        );
        seeded.with_index(stale)
    }

    #[rstest]
    fn test_consistent_dispatch_reports_nothing() {
        let store = Store::new(&StoreConfig::default());
        let action = Action::add("Buy milk", "").expect("valid");
        let published = store.dispatch_at(&action, at(1));
        assert_eq!(report_divergence(&action, &published), None);
    }

    #[rstest]
    fn test_diverged_snapshot_is_reported_without_panicking(diverged: Snapshot) {
        let store = Store::from_snapshot(diverged);
        let action = Action::toggle(TaskId::new(1));
        let published = store.dispatch_at(&action, at(1));

        assert!(published.records()[0].status.is_completed());
        assert!(matches!(
            report_divergence(&action, &published),
            Some(IndexDivergence::StalePosting { .. })
        ));
    }
}
