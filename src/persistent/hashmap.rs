//! Persistent hash map based on a Hash Array Mapped Trie.
//!
//! [`PersistentHashMap`] is the backing store of the inverted index. Every
//! update returns a new map that shares all untouched nodes (and therefore all
//! untouched values) with the map it was derived from, so the cost of an
//! `insert` or `remove` is proportional to the depth of the trie and never to
//! the number of entries.
//!
//! # Layout
//!
//! - 32-way branching (5 hash bits per level)
//! - The root is always a bitmap node; an empty map is a root with no bits set
//! - Entries remember their full hash so splitting a slot never rehashes
//! - Keys whose 64-bit hashes are equal live together in a collision leaf
//!
//! # Examples
//!
//! ```rust
//! use taskdex::persistent::PersistentHashMap;
//!
//! let map = PersistentHashMap::new()
//!     .insert("milk".to_string(), 1)
//!     .insert("bread".to_string(), 2);
//!
//! let updated = map.insert("milk".to_string(), 10);
//! assert_eq!(map.get("milk"), Some(&1));
//! assert_eq!(updated.get("milk"), Some(&10));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::ReferenceCounter;

// =============================================================================
// Constants
// =============================================================================

/// Bits of the hash consumed per trie level.
const BITS_PER_LEVEL: usize = 5;

/// Bit mask for extracting a slot index within a node.
const MASK: u64 = (1 << BITS_PER_LEVEL) - 1;

// =============================================================================
// Hash computation
// =============================================================================

#[cfg(not(feature = "fxhash"))]
type KeyHasher = std::collections::hash_map::DefaultHasher;

#[cfg(feature = "fxhash")]
type KeyHasher = rustc_hash::FxHasher;

/// Hashes a key with a fixed-key hasher, so the same key always lands in the
/// same slot across processes and runs.
fn compute_hash<K: Hash + ?Sized>(key: &K) -> u64 {
    let mut hasher = KeyHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

#[inline]
const fn hash_index(hash: u64, depth: usize) -> usize {
    ((hash >> (depth * BITS_PER_LEVEL)) & MASK) as usize
}

#[inline]
const fn slot_position(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

// =============================================================================
// Node Definition
// =============================================================================

enum Node<K, V> {
    Bitmap {
        bitmap: u32,
        children: ReferenceCounter<[Child<K, V>]>,
    },
    /// All entries share `hash`. Never used as the root.
    Collision {
        hash: u64,
        entries: ReferenceCounter<[(K, V)]>,
    },
}

enum Child<K, V> {
    Entry { hash: u64, key: K, value: V },
    Node(ReferenceCounter<Node<K, V>>),
}

impl<K: Clone, V: Clone> Clone for Child<K, V> {
    fn clone(&self) -> Self {
        match self {
            Self::Entry { hash, key, value } => Self::Entry {
                hash: *hash,
                key: key.clone(),
                value: value.clone(),
            },
            Self::Node(node) => Self::Node(ReferenceCounter::clone(node)),
        }
    }
}

impl<K, V> Node<K, V> {
    fn empty_bitmap() -> Self {
        Self::Bitmap {
            bitmap: 0,
            children: ReferenceCounter::from(Vec::new()),
        }
    }
}

// =============================================================================
// PersistentHashMap Definition
// =============================================================================

/// A persistent (immutable) hash map with structural sharing.
///
/// # Time Complexity
///
/// | Operation      | Complexity        |
/// |----------------|-------------------|
/// | `new`          | O(1)              |
/// | `get`          | O(log32 N)        |
/// | `insert`       | O(log32 N)        |
/// | `remove`       | O(log32 N)        |
/// | `len`          | O(1)              |
/// | `iter`         | O(N) traversal    |
/// | `ptr_eq`       | O(1)              |
///
/// Iteration order follows the trie layout. It is stable for a given set of
/// keys but otherwise unspecified.
pub struct PersistentHashMap<K, V> {
    root: ReferenceCounter<Node<K, V>>,
    length: usize,
}

impl<K, V> Clone for PersistentHashMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: ReferenceCounter::clone(&self.root),
            length: self.length,
        }
    }
}

impl<K, V> PersistentHashMap<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use taskdex::persistent::PersistentHashMap;
    ///
    /// let map: PersistentHashMap<String, i32> = PersistentHashMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: ReferenceCounter::new(Node::empty_bitmap()),
            length: 0,
        }
    }

    /// Returns the number of entries in the map.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns `true` if both maps are the same version, i.e. they share
    /// their root node.
    ///
    /// A `true` result implies equal contents. A `false` result says nothing
    /// about contents.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use taskdex::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().insert(1, "one");
    /// let unchanged = map.remove(&2);
    /// assert!(map.ptr_eq(&unchanged));
    /// ```
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.root, &other.root)
    }

    /// Returns an iterator over the entries of the map.
    #[must_use]
    pub fn iter(&self) -> PersistentHashMapIterator<'_, K, V> {
        PersistentHashMapIterator {
            stack: vec![Frame::of(&self.root)],
            remaining: self.length,
        }
    }

    /// Returns an iterator over the keys of the map.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }
}

impl<K: Clone + Hash + Eq, V: Clone> PersistentHashMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use taskdex::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().insert("hello".to_string(), 42);
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = compute_hash(key);
        let mut node: &Node<K, V> = &self.root;
        let mut depth = 0;

        loop {
            match node {
                Node::Bitmap { bitmap, children } => {
                    let bit = 1u32 << hash_index(hash, depth);
                    if bitmap & bit == 0 {
                        return None;
                    }
                    match &children[slot_position(*bitmap, bit)] {
                        Child::Entry {
                            hash: entry_hash,
                            key: entry_key,
                            value,
                        } => {
                            return (*entry_hash == hash && Borrow::<Q>::borrow(entry_key) == key)
                                .then_some(value);
                        }
                        Child::Node(subnode) => {
                            node = &**subnode;
                            depth += 1;
                        }
                    }
                }
                Node::Collision {
                    hash: collision_hash,
                    entries,
                } => {
                    if *collision_hash != hash {
                        return None;
                    }
                    return entries
                        .iter()
                        .find(|(entry_key, _)| Borrow::<Q>::borrow(entry_key) == key)
                        .map(|(_, value)| value);
                }
            }
        }
    }

    /// Returns `true` if the map contains a value for the key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Inserts a key-value pair, returning a new map.
    ///
    /// If the key is present its value is replaced. Only the nodes on the path
    /// to the key are copied.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use taskdex::persistent::PersistentHashMap;
    ///
    /// let first = PersistentHashMap::new().insert("key".to_string(), 1);
    /// let second = first.insert("key".to_string(), 2);
    ///
    /// assert_eq!(first.get("key"), Some(&1));
    /// assert_eq!(second.get("key"), Some(&2));
    /// assert_eq!(second.len(), 1);
    /// ```
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        let hash = compute_hash(&key);
        let (root, added) = Self::insert_into(&self.root, hash, key, value, 0);
        Self {
            root: ReferenceCounter::new(root),
            length: if added { self.length + 1 } else { self.length },
        }
    }

    /// Returns `(new_node, added)`.
    fn insert_into(node: &Node<K, V>, hash: u64, key: K, value: V, depth: usize) -> (Node<K, V>, bool) {
        match node {
            Node::Bitmap { bitmap, children } => {
                let bit = 1u32 << hash_index(hash, depth);
                let position = slot_position(*bitmap, bit);
                let mut new_children = children.to_vec();

                if bitmap & bit == 0 {
                    new_children.insert(position, Child::Entry { hash, key, value });
                    return (
                        Node::Bitmap {
                            bitmap: bitmap | bit,
                            children: ReferenceCounter::from(new_children),
                        },
                        true,
                    );
                }

                let (replacement, added) = match &children[position] {
                    Child::Entry {
                        hash: entry_hash,
                        key: entry_key,
                        value: entry_value,
                    } => {
                        if *entry_hash == hash && *entry_key == key {
                            (Child::Entry { hash, key, value }, false)
                        } else if *entry_hash == hash {
                            let collision = Node::Collision {
                                hash,
                                entries: ReferenceCounter::from(vec![
                                    (entry_key.clone(), entry_value.clone()),
                                    (key, value),
                                ]),
                            };
                            (Child::Node(ReferenceCounter::new(collision)), true)
                        } else {
                            let existing = Child::Entry {
                                hash: *entry_hash,
                                key: entry_key.clone(),
                                value: entry_value.clone(),
                            };
                            let joined = Self::join(
                                existing,
                                *entry_hash,
                                Child::Entry { hash, key, value },
                                hash,
                                depth + 1,
                            );
                            (Child::Node(ReferenceCounter::new(joined)), true)
                        }
                    }
                    Child::Node(subnode) => {
                        let (new_subnode, added) =
                            Self::insert_into(subnode, hash, key, value, depth + 1);
                        (Child::Node(ReferenceCounter::new(new_subnode)), added)
                    }
                };

                new_children[position] = replacement;
                (
                    Node::Bitmap {
                        bitmap: *bitmap,
                        children: ReferenceCounter::from(new_children),
                    },
                    added,
                )
            }
            Node::Collision {
                hash: collision_hash,
                entries,
            } => {
                if *collision_hash == hash {
                    let mut new_entries = entries.to_vec();
                    let added = match new_entries.iter_mut().find(|(entry_key, _)| *entry_key == key) {
                        Some(entry) => {
                            entry.1 = value;
                            false
                        }
                        None => {
                            new_entries.push((key, value));
                            true
                        }
                    };
                    (
                        Node::Collision {
                            hash,
                            entries: ReferenceCounter::from(new_entries),
                        },
                        added,
                    )
                } else {
                    let existing = Child::Node(ReferenceCounter::new(Node::Collision {
                        hash: *collision_hash,
                        entries: ReferenceCounter::clone(entries),
                    }));
                    let joined = Self::join(
                        existing,
                        *collision_hash,
                        Child::Entry { hash, key, value },
                        hash,
                        depth,
                    );
                    (joined, true)
                }
            }
        }
    }

    /// Builds the smallest bitmap subtree holding two leaves with distinct
    /// hashes. A leaf is either an entry or a collision node.
    fn join(left: Child<K, V>, left_hash: u64, right: Child<K, V>, right_hash: u64, depth: usize) -> Node<K, V> {
        let left_index = hash_index(left_hash, depth);
        let right_index = hash_index(right_hash, depth);

        if left_index == right_index {
            let subnode = Self::join(left, left_hash, right, right_hash, depth + 1);
            return Node::Bitmap {
                bitmap: 1u32 << left_index,
                children: ReferenceCounter::from(vec![Child::Node(ReferenceCounter::new(subnode))]),
            };
        }

        let children = if left_index < right_index {
            vec![left, right]
        } else {
            vec![right, left]
        };
        Node::Bitmap {
            bitmap: (1u32 << left_index) | (1u32 << right_index),
            children: ReferenceCounter::from(children),
        }
    }

    /// Removes a key, returning a new map.
    ///
    /// If the key is absent the returned map shares its root with `self`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use taskdex::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new()
    ///     .insert("a".to_string(), 1)
    ///     .insert("b".to_string(), 2);
    /// let removed = map.remove("a");
    ///
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(removed.len(), 1);
    /// assert_eq!(removed.get("a"), None);
    /// ```
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = compute_hash(key);
        Self::remove_from(&self.root, hash, key, 0).map_or_else(
            || self.clone(),
            |root| Self {
                root: ReferenceCounter::new(root),
                length: self.length - 1,
            },
        )
    }

    /// Returns `None` when the key is absent.
    fn remove_from<Q>(node: &Node<K, V>, hash: u64, key: &Q, depth: usize) -> Option<Node<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match node {
            Node::Bitmap { bitmap, children } => {
                let bit = 1u32 << hash_index(hash, depth);
                if bitmap & bit == 0 {
                    return None;
                }
                let position = slot_position(*bitmap, bit);

                let replacement = match &children[position] {
                    Child::Entry {
                        hash: entry_hash,
                        key: entry_key,
                        ..
                    } => {
                        if *entry_hash != hash || entry_key.borrow() != key {
                            return None;
                        }
                        None
                    }
                    Child::Node(subnode) => {
                        let new_subnode = Self::remove_from(subnode, hash, key, depth + 1)?;
                        Self::collapse(new_subnode)
                    }
                };

                let mut new_children = children.to_vec();
                let new_bitmap = match replacement {
                    Some(child) => {
                        new_children[position] = child;
                        *bitmap
                    }
                    None => {
                        new_children.remove(position);
                        bitmap & !bit
                    }
                };
                Some(Node::Bitmap {
                    bitmap: new_bitmap,
                    children: ReferenceCounter::from(new_children),
                })
            }
            Node::Collision {
                hash: collision_hash,
                entries,
            } => {
                if *collision_hash != hash {
                    return None;
                }
                let found = entries
                    .iter()
                    .position(|(entry_key, _)| Borrow::<Q>::borrow(entry_key) == key)?;
                let mut new_entries = entries.to_vec();
                new_entries.remove(found);
                Some(Node::Collision {
                    hash: *collision_hash,
                    entries: ReferenceCounter::from(new_entries),
                })
            }
        }
    }

    /// Turns a shrunk subnode back into the child that should occupy its slot.
    ///
    /// Empty subnodes vanish, and a subnode left holding a single entry is
    /// pulled up into the parent.
    fn collapse(node: Node<K, V>) -> Option<Child<K, V>> {
        match &node {
            Node::Bitmap { children, .. } => match children.len() {
                0 => None,
                1 if matches!(children[0], Child::Entry { .. }) => Some(children[0].clone()),
                _ => Some(Child::Node(ReferenceCounter::new(node))),
            },
            Node::Collision { hash, entries } => match entries.len() {
                0 => None,
                1 => {
                    let (key, value) = entries[0].clone();
                    Some(Child::Entry {
                        hash: *hash,
                        key,
                        value,
                    })
                }
                _ => Some(Child::Node(ReferenceCounter::new(node))),
            },
        }
    }
}

// =============================================================================
// Iterator
// =============================================================================

enum Frame<'a, K, V> {
    Children(std::slice::Iter<'a, Child<K, V>>),
    Collision(std::slice::Iter<'a, (K, V)>),
}

impl<'a, K, V> Frame<'a, K, V> {
    fn of(node: &'a Node<K, V>) -> Self {
        match node {
            Node::Bitmap { children, .. } => Self::Children(children.iter()),
            Node::Collision { entries, .. } => Self::Collision(entries.iter()),
        }
    }
}

/// Borrowing iterator over the entries of a [`PersistentHashMap`].
pub struct PersistentHashMapIterator<'a, K, V> {
    stack: Vec<Frame<'a, K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for PersistentHashMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let descend = match self.stack.last_mut()? {
                Frame::Children(children) => match children.next() {
                    Some(Child::Entry { key, value, .. }) => {
                        self.remaining -= 1;
                        return Some((key, value));
                    }
                    Some(Child::Node(node)) => Some(Frame::of(node)),
                    None => None,
                },
                Frame::Collision(entries) => match entries.next() {
                    Some((key, value)) => {
                        self.remaining -= 1;
                        return Some((key, value));
                    }
                    None => None,
                },
            };
            match descend {
                Some(frame) => self.stack.push(frame),
                None => {
                    self.stack.pop();
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for PersistentHashMapIterator<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a PersistentHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = PersistentHashMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<K, V> Default for PersistentHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> FromIterator<(K, V)> for PersistentHashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |map, (key, value)| map.insert(key, value))
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> PartialEq for PersistentHashMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.length == other.length
                && self
                    .iter()
                    .all(|(key, value)| other.get(key) == Some(value)))
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Eq> Eq for PersistentHashMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// A key whose hash is chosen by the test, to force collisions.
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct FixedHashKey {
        name: &'static str,
        hash: u64,
    }

    impl Hash for FixedHashKey {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.hash.hash(state);
        }
    }

    #[rstest]
    fn test_new_creates_empty() {
        let map: PersistentHashMap<String, i32> = PersistentHashMap::new();
        assert!(map.is_empty());
        assert_eq!(map.iter().count(), 0);
    }

    #[rstest]
    fn test_insert_and_get_many() {
        let map: PersistentHashMap<u32, u32> = (0..2_000).map(|index| (index, index * 3)).collect();
        assert_eq!(map.len(), 2_000);
        for index in 0..2_000 {
            assert_eq!(map.get(&index), Some(&(index * 3)));
        }
        assert_eq!(map.get(&2_000), None);
    }

    #[rstest]
    fn test_remove_every_key_leaves_empty_map() {
        let map: PersistentHashMap<u32, u32> = (0..500).map(|index| (index, index)).collect();
        let emptied = (0..500).fold(map.clone(), |current, index| current.remove(&index));
        assert!(emptied.is_empty());
        assert_eq!(emptied.iter().count(), 0);
        assert_eq!(map.len(), 500);
    }

    #[rstest]
    fn test_remove_absent_key_shares_root() {
        let map = PersistentHashMap::new().insert(1, "one").insert(2, "two");
        assert!(map.remove(&3).ptr_eq(&map));
    }

    #[rstest]
    fn test_colliding_keys_are_kept_apart() {
        let first = FixedHashKey { name: "first", hash: 7 };
        let second = FixedHashKey { name: "second", hash: 7 };
        let third = FixedHashKey { name: "third", hash: 7 + (1 << 5) };

        let map = PersistentHashMap::new()
            .insert(first.clone(), 1)
            .insert(second.clone(), 2)
            .insert(third.clone(), 3);

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&first), Some(&1));
        assert_eq!(map.get(&second), Some(&2));
        assert_eq!(map.get(&third), Some(&3));

        let without_first = map.remove(&first);
        assert_eq!(without_first.len(), 2);
        assert_eq!(without_first.get(&first), None);
        assert_eq!(without_first.get(&second), Some(&2));
        assert_eq!(without_first.iter().count(), 2);

        let only_third = without_first.remove(&second);
        assert_eq!(only_third.len(), 1);
        assert_eq!(only_third.get(&third), Some(&3));
        assert_eq!(first.name, "first");
    }

    #[rstest]
    fn test_insert_shares_untouched_values() {
        let shared = ReferenceCounter::new(vec![1, 2, 3]);
        let map = PersistentHashMap::new()
            .insert("kept".to_string(), ReferenceCounter::clone(&shared))
            .insert("other".to_string(), ReferenceCounter::new(vec![9]));

        let updated = map.insert("new".to_string(), ReferenceCounter::new(vec![4]));

        let before = map.get("kept").expect("kept is present");
        let after = updated.get("kept").expect("kept is present");
        assert!(ReferenceCounter::ptr_eq(before, after));
        assert!(ReferenceCounter::ptr_eq(after, &shared));
    }

    #[rstest]
    fn test_iter_visits_each_entry_once() {
        let map: PersistentHashMap<u32, u32> = (0..300).map(|index| (index, index)).collect();
        let mut keys: Vec<u32> = map.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..300).collect::<Vec<_>>());
        assert_eq!(map.iter().len(), 300);
    }

    #[rstest]
    fn test_eq_ignores_insertion_order() {
        let forward: PersistentHashMap<u32, u32> = (0..50).map(|index| (index, index)).collect();
        let backward: PersistentHashMap<u32, u32> =
            (0..50).rev().map(|index| (index, index)).collect();
        assert_eq!(forward, backward);
        assert_ne!(forward, backward.remove(&10));
    }
}
