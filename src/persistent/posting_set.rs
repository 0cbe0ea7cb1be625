//! Sorted identifier set used as an inverted-index bucket.
//!
//! [`PostingSet`] keeps its identifiers sorted and deduplicated in a
//! `SmallVec`, so the common case of a handful of records per token stays
//! inline without a heap allocation. Like the other containers in this module
//! it is immutable: `insert` and `remove` return new sets.
//!
//! # Time Complexity
//!
//! | Operation      | Complexity          |
//! |----------------|---------------------|
//! | `insert`       | O(n) copy, O(log n) search |
//! | `remove`       | O(n) copy, O(log n) search |
//! | `contains`     | O(log n)            |
//! | `len`          | O(1)                |
//! | `iter`         | O(n), ascending     |
//!
//! # Examples
//!
//! ```rust
//! use taskdex::persistent::PostingSet;
//!
//! let set = PostingSet::singleton(3).insert(1).insert(2);
//! assert_eq!(set.as_slice(), &[1, 2, 3]);
//!
//! // Inserting a present id changes nothing
//! assert_eq!(set.insert(2), set);
//!
//! let smaller = set.remove(&1);
//! assert_eq!(set.len(), 3);
//! assert_eq!(smaller.as_slice(), &[2, 3]);
//! ```

use smallvec::SmallVec;

/// Number of identifiers stored inline before spilling to the heap.
const INLINE_CAPACITY: usize = 8;

/// An immutable, ascending set of identifiers.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PostingSet<T> {
    ids: SmallVec<[T; INLINE_CAPACITY]>,
}

impl<T> PostingSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: SmallVec::new(),
        }
    }

    /// Creates a set holding exactly one identifier.
    #[must_use]
    pub fn singleton(id: T) -> Self {
        let mut ids = SmallVec::new();
        ids.push(id);
        Self { ids }
    }

    /// Returns the number of identifiers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if the set holds no identifiers.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the identifiers in ascending order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.ids
    }

    /// Returns an iterator over the identifiers in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.ids.iter()
    }

    /// Returns `true` if the set has spilled its identifiers to the heap.
    #[inline]
    #[must_use]
    pub fn spilled(&self) -> bool {
        self.ids.spilled()
    }
}

impl<T: Ord + Clone> PostingSet<T> {
    /// Returns `true` if `id` is in the set.
    #[must_use]
    pub fn contains(&self, id: &T) -> bool {
        self.ids.binary_search(id).is_ok()
    }

    /// Returns a new set that also contains `id`.
    ///
    /// Returns an equal set when `id` is already present.
    #[must_use]
    pub fn insert(&self, id: T) -> Self {
        match self.ids.binary_search(&id) {
            Ok(_) => self.clone(),
            Err(position) => {
                let mut ids = self.ids.clone();
                ids.insert(position, id);
                Self { ids }
            }
        }
    }

    /// Returns a new set without `id`.
    ///
    /// Returns an equal set when `id` is absent.
    #[must_use]
    pub fn remove(&self, id: &T) -> Self {
        match self.ids.binary_search(id) {
            Ok(position) => {
                let mut ids = self.ids.clone();
                ids.remove(position);
                Self { ids }
            }
            Err(_) => self.clone(),
        }
    }

    /// Returns the identifiers as a vector in ascending order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.ids.to_vec()
    }
}

impl<T> Default for PostingSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> FromIterator<T> for PostingSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut ids: SmallVec<[T; INLINE_CAPACITY]> = iter.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }
}

impl<'a, T> IntoIterator for &'a PostingSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for PostingSet<T> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_set().entries(self.ids.iter()).finish()
    }
}

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for PostingSet<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.ids.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec![3, 1, 2], vec![1, 2, 3])]
    #[case(vec![5, 5, 5], vec![5])]
    #[case(vec![], vec![])]
    fn test_from_iter_sorts_and_dedups(#[case] input: Vec<u32>, #[case] expected: Vec<u32>) {
        let set: PostingSet<u32> = input.into_iter().collect();
        assert_eq!(set.to_vec(), expected);
    }

    #[rstest]
    fn test_insert_keeps_original() {
        let original = PostingSet::singleton(10);
        let extended = original.insert(5);
        assert_eq!(original.as_slice(), &[10]);
        assert_eq!(extended.as_slice(), &[5, 10]);
    }

    #[rstest]
    fn test_remove_absent_is_equal() {
        let set: PostingSet<u32> = [1, 2].into_iter().collect();
        assert_eq!(set.remove(&7), set);
    }

    #[rstest]
    fn test_spills_past_inline_capacity() {
        let inline: PostingSet<u32> = (0..8).collect();
        assert!(!inline.spilled());
        let spilled = inline.insert(8);
        assert!(spilled.spilled());
        assert_eq!(spilled.len(), 9);
        assert!(spilled.contains(&8));
    }
}
