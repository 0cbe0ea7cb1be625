//! # taskdex
//!
//! A task store whose title search index can never drift from its records.
//!
//! ## Overview
//!
//! - **Tokenizer**: Unicode word segmentation with locale-aware case folding
//! - **Inverted Index**: persistent token to posting-set map with exact and
//!   prefix lookup, updated copy-on-write one touched bucket at a time
//! - **Record Store**: a pure reducer producing immutable snapshots that pair
//!   the records with their index, published through an atomic pointer swap
//! - **Query Facade**: resolves search strings to records of one snapshot
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize` for snapshots and indexes, `Serialize`/`Deserialize`
//!   for domain types
//! - `fxhash`: hash index keys with `FxHasher` instead of SipHash
//!
//! ## Example
//!
//! ```rust
//! use taskdex::prelude::*;
//!
//! let store = Store::with_tasks(&StoreConfig::default(), sample_tasks(Timestamp::now()));
//! store.dispatch(Action::add("Test search on tablet", "").unwrap());
//!
//! let state = store.state();
//! let titles: Vec<String> = search(&state, "test")
//!     .iter()
//!     .map(|task| task.title.clone())
//!     .collect();
//! assert_eq!(titles.len(), 4);
//! assert!(search(&state, "mobile").iter().all(|task| task.title == "Test on mobile"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use taskdex::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::StoreConfig;
    pub use crate::domain::{Settings, Task, TaskId, TaskStatus, Timestamp, sample_tasks};
    pub use crate::error::{ConfigurationError, IndexDivergence, ValidationError};
    pub use crate::index::{InvertedIndex, TitleChange, Titled, Token};
    pub use crate::query::{search, search_exact, select_by_id};
    pub use crate::store::{Action, Snapshot, Store};
    pub use crate::tokenize::{Locale, Tokenizer, TokenizerMode, tokenize};
}

pub mod config;
pub mod domain;
pub mod error;
pub mod index;
pub mod persistent;
pub mod query;
pub mod store;
pub mod tokenize;
