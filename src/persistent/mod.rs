//! Persistent (immutable) data structures.
//!
//! The containers in this module never change after construction. Every
//! update returns a new value that shares the untouched parts of its source:
//!
//! - [`PersistentHashMap`]: Persistent hash map (HAMT)
//! - [`PostingSet`]: Sorted identifier set used as an index bucket
//!
//! # Structural Sharing
//!
//! Updating one key of a [`PersistentHashMap`] copies the nodes on the path to
//! that key and nothing else. Values are cloned only when their node is copied,
//! so storing values behind a reference counter makes every untouched value
//! pointer-identical between the old and the new map.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use taskdex::persistent::{PersistentHashMap, PostingSet};
//!
//! let milk = Arc::new(PostingSet::singleton(1_u64));
//! let map = PersistentHashMap::new()
//!     .insert("milk".to_string(), Arc::clone(&milk))
//!     .insert("bread".to_string(), Arc::new(PostingSet::singleton(2)));
//!
//! // Structural sharing: the untouched bucket is the same allocation
//! let updated = map.insert("eggs".to_string(), Arc::new(PostingSet::singleton(3)));
//! assert!(Arc::ptr_eq(updated.get("milk").unwrap(), &milk));
//! assert_eq!(map.len(), 2);     // Original unchanged
//! assert_eq!(updated.len(), 3); // New version
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// Snapshots are read from many threads, so nodes are always shared with
/// `std::sync::Arc`.
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

mod hashmap;
mod posting_set;

pub use hashmap::PersistentHashMap;
pub use hashmap::PersistentHashMapIterator;
pub use posting_set::PostingSet;

static_assertions::assert_impl_all!(PersistentHashMap<String, ReferenceCounter<PostingSet<u64>>>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================
