//! Inverted index over record titles.
//!
//! [`InvertedIndex`] maps every token of every indexed title to the set of
//! record identifiers whose title produced it. It is a persistent value:
//! `add`, `remove` and `update` return a new index and leave `self` untouched.
//!
//! # Copy-on-write granularity
//!
//! Buckets are stored as `Arc<PostingSet<I>>` inside a [`PersistentHashMap`].
//! An update allocates new buckets only for the tokens whose posting set
//! actually changes, and copies only the trie path to those tokens. Every other
//! bucket is the same allocation in the old and the new index, which
//! [`InvertedIndex::shares_bucket`] makes observable.
//!
//! # Invariants
//!
//! For the records an index was derived from:
//!
//! - every token of a record's current title lists that record
//! - every listed identifier belongs to a record whose title has that token
//! - no token maps to an empty posting set
//!
//! [`InvertedIndex::verify`] checks all three.
//!
//! # Examples
//!
//! ```rust
//! use taskdex::index::InvertedIndex;
//! use taskdex::tokenize::Tokenizer;
//!
//! let records = [(1_u64, "Buy milk"), (2, "Buy bread")];
//! let index = InvertedIndex::build(Tokenizer::default(), &records);
//!
//! assert_eq!(index.query_prefix("bu"), vec![1, 2]);
//! assert_eq!(index.query_exact("milk"), vec![1]);
//!
//! let renamed = index.update(&1, "Buy milk", "Sell milk");
//! assert_eq!(renamed.query_exact("buy"), vec![2]);
//! assert!(renamed.shares_bucket(&index, "milk"));
//! ```

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::domain::TaskId;
use crate::error::IndexDivergence;
use crate::persistent::{PersistentHashMap, PostingSet};
use crate::tokenize::Tokenizer;

// =============================================================================
// Token
// =============================================================================

/// A normalized index key.
///
/// Cheap to clone; hashes and compares like the `str` it holds, so the index
/// can be probed with a plain `&str`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(Arc<str>);

impl Token {
    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for Token {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(text: &str) -> Self {
        Self(Arc::from(text))
    }
}

impl From<String> for Token {
    fn from(text: String) -> Self {
        Self(Arc::from(text))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, formatter)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

// =============================================================================
// Titled
// =============================================================================

/// A record that can be indexed by its title.
pub trait Titled {
    /// Identifier type.
    type Id: Ord + Clone;

    /// Returns the record identifier.
    fn id(&self) -> &Self::Id;

    /// Returns the current title.
    fn title(&self) -> &str;
}

impl<T: Titled + ?Sized> Titled for Arc<T> {
    type Id = T::Id;

    fn id(&self) -> &Self::Id {
        (**self).id()
    }

    fn title(&self) -> &str {
        (**self).title()
    }
}

impl<I: Ord + Clone, S: AsRef<str>> Titled for (I, S) {
    type Id = I;

    fn id(&self) -> &I {
        &self.0
    }

    fn title(&self) -> &str {
        self.1.as_ref()
    }
}

// =============================================================================
// TitleChange
// =============================================================================

/// A single title-level change, as produced by a record mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleChange<I> {
    /// A record was created.
    Add {
        /// Identifier of the new record.
        id: I,
        /// Its title.
        title: String,
    },
    /// A record was renamed.
    Update {
        /// Identifier of the renamed record.
        id: I,
        /// Title before the rename.
        old_title: String,
        /// Title after the rename.
        new_title: String,
    },
    /// A record was deleted.
    Remove {
        /// Identifier of the deleted record.
        id: I,
        /// Title it was indexed under.
        title: String,
    },
}

// =============================================================================
// InvertedIndex
// =============================================================================

type Bucket<I> = Arc<PostingSet<I>>;

/// Persistent token to posting-set mapping.
pub struct InvertedIndex<I = TaskId> {
    tokenizer: Tokenizer,
    postings: PersistentHashMap<Token, Bucket<I>>,
}

impl<I> Clone for InvertedIndex<I> {
    fn clone(&self) -> Self {
        Self {
            tokenizer: self.tokenizer.clone(),
            postings: self.postings.clone(),
        }
    }
}

impl<I> InvertedIndex<I> {
    /// Creates an empty index that tokenizes with `tokenizer`.
    #[must_use]
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            postings: PersistentHashMap::new(),
        }
    }

    /// Returns the tokenizer used for titles and query terms.
    #[must_use]
    pub const fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Returns the number of distinct tokens.
    #[must_use]
    pub const fn token_count(&self) -> usize {
        self.postings.len()
    }

    /// Returns `true` if no token is indexed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Returns an iterator over the indexed tokens, in unspecified order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(Token::as_str)
    }

    /// Returns the indexed tokens in ascending order.
    #[must_use]
    pub fn sorted_tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.tokens().collect();
        tokens.sort_unstable();
        tokens
    }

    /// Returns `true` if both indexes are the same version.
    ///
    /// Holds after any operation that changed no posting.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.postings.ptr_eq(&other.postings)
    }
}

impl<I: Ord + Clone> InvertedIndex<I> {
    /// Builds an index from scratch over `records`.
    ///
    /// Postings are gathered in a transient map first and frozen into the
    /// persistent map once, so every bucket is allocated exactly once.
    #[must_use]
    pub fn build<'a, R>(tokenizer: Tokenizer, records: impl IntoIterator<Item = &'a R>) -> Self
    where
        R: Titled<Id = I> + 'a,
    {
        let mut collected: HashMap<String, Vec<I>> = HashMap::new();
        let mut record_count = 0_usize;

        for record in records {
            record_count += 1;
            for token in tokenizer.unique_tokens(record.title()) {
                collected.entry(token).or_default().push(record.id().clone());
            }
        }

        let postings = collected
            .into_iter()
            .map(|(token, ids)| (Token::from(token), Arc::new(ids.into_iter().collect())))
            .collect::<PersistentHashMap<Token, Bucket<I>>>();

        tracing::debug!(
            records = record_count,
            tokens = postings.len(),
            "Built inverted index"
        );

        Self {
            tokenizer,
            postings,
        }
    }

    /// Indexes `title` under `id`.
    ///
    /// Tokens absent from `title` keep their buckets.
    #[must_use]
    pub fn add(&self, id: &I, title: &str) -> Self {
        let tokens = self.tokenizer.unique_tokens(title);
        self.with_postings(
            tokens
                .iter()
                .fold(self.postings.clone(), |postings, token| {
                    Self::insert_posting(&postings, token, id)
                }),
        )
    }

    /// Removes `id` from every token of `title`.
    ///
    /// Buckets that become empty are dropped from the mapping.
    #[must_use]
    pub fn remove(&self, id: &I, title: &str) -> Self {
        let tokens = self.tokenizer.unique_tokens(title);
        self.with_postings(
            tokens
                .iter()
                .fold(self.postings.clone(), |postings, token| {
                    Self::remove_posting(&postings, token, id)
                }),
        )
    }

    /// Re-indexes `id` after its title changed from `old_title` to
    /// `new_title`.
    ///
    /// Identical titles return `self` unchanged. Otherwise only the tokens in
    /// exactly one of the two titles are touched, so a token shared by both
    /// keeps its bucket and never loses the posting.
    #[must_use]
    pub fn update(&self, id: &I, old_title: &str, new_title: &str) -> Self {
        if old_title == new_title {
            return self.clone();
        }

        let old_tokens: HashSet<String> = self.tokenizer.unique_tokens(old_title).into_iter().collect();
        let new_tokens = self.tokenizer.unique_tokens(new_title);

        let removed = old_tokens
            .iter()
            .filter(|token| !new_tokens.contains(*token))
            .fold(self.postings.clone(), |postings, token| {
                Self::remove_posting(&postings, token, id)
            });
        let postings = new_tokens
            .iter()
            .filter(|token| !old_tokens.contains(*token))
            .fold(removed, |postings, token| {
                Self::insert_posting(&postings, token, id)
            });

        self.with_postings(postings)
    }

    /// Applies a [`TitleChange`].
    #[must_use]
    pub fn apply_change(&self, change: &TitleChange<I>) -> Self {
        match change {
            TitleChange::Add { id, title } => self.add(id, title),
            TitleChange::Update {
                id,
                old_title,
                new_title,
            } => self.update(id, old_title, new_title),
            TitleChange::Remove { id, title } => self.remove(id, title),
        }
    }

    /// Returns the identifiers indexed under exactly `term`, ascending.
    ///
    /// The term is trimmed and case folded first. A blank term matches
    /// nothing.
    #[must_use]
    pub fn query_exact(&self, term: &str) -> Vec<I> {
        let normalized = self.tokenizer.normalize_term(term);
        if normalized.is_empty() {
            return Vec::new();
        }
        self.postings
            .get(normalized.as_str())
            .map_or_else(Vec::new, |bucket| bucket.to_vec())
    }

    /// Returns the identifiers indexed under any token starting with `term`,
    /// ascending and without duplicates.
    ///
    /// The term is trimmed and case folded first. A blank term matches
    /// nothing.
    ///
    /// # Complexity
    ///
    /// O(V) over the vocabulary: every token is compared with the prefix.
    #[must_use]
    pub fn query_prefix(&self, term: &str) -> Vec<I> {
        let normalized = self.tokenizer.normalize_term(term);
        if normalized.is_empty() {
            return Vec::new();
        }
        self.postings
            .iter()
            .filter(|(token, _)| token.starts_with(normalized.as_str()))
            .flat_map(|(_, bucket)| bucket.iter().cloned())
            .collect::<BTreeSet<I>>()
            .into_iter()
            .collect()
    }

    /// Returns the posting set stored under the exact (already normalized)
    /// `token`.
    #[must_use]
    pub fn postings(&self, token: &str) -> Option<&PostingSet<I>> {
        self.postings.get(token).map(|bucket| &**bucket)
    }

    /// Returns `true` if `token` has a posting set.
    #[must_use]
    pub fn contains_token(&self, token: &str) -> bool {
        self.postings.contains_key(token)
    }

    /// Returns `true` if both indexes hold the very same bucket allocation for
    /// `token`.
    #[must_use]
    pub fn shares_bucket(&self, other: &Self, token: &str) -> bool {
        match (self.postings.get(token), other.postings.get(token)) {
            (Some(mine), Some(theirs)) => Arc::ptr_eq(mine, theirs),
            _ => false,
        }
    }

    /// Checks that this index describes exactly `records`.
    ///
    /// # Errors
    ///
    /// Returns the first [`IndexDivergence`] found, in token order: a title
    /// token missing its posting, a posting not backed by a current title, or
    /// an empty bucket.
    pub fn verify<'a, R>(&self, records: impl IntoIterator<Item = &'a R>) -> Result<(), IndexDivergence>
    where
        R: Titled<Id = I> + 'a,
        I: fmt::Debug,
    {
        let mut expected: BTreeMap<String, BTreeSet<I>> = BTreeMap::new();
        for record in records {
            for token in self.tokenizer.unique_tokens(record.title()) {
                expected.entry(token).or_default().insert(record.id().clone());
            }
        }

        for (token, ids) in &expected {
            for id in ids {
                let indexed = self
                    .postings
                    .get(token.as_str())
                    .is_some_and(|bucket| bucket.contains(id));
                if !indexed {
                    return Err(IndexDivergence::MissingPosting {
                        token: token.clone(),
                        id: format!("{id:?}"),
                    });
                }
            }
        }

        let mut actual: Vec<(&Token, &Bucket<I>)> = self.postings.iter().collect();
        actual.sort_unstable_by(|(left, _), (right, _)| left.cmp(right));

        for (token, bucket) in actual {
            if bucket.is_empty() {
                return Err(IndexDivergence::EmptyBucket(token.to_string()));
            }
            let backed = expected.get(token.as_str());
            if let Some(stale) = bucket
                .iter()
                .find(|id| !backed.is_some_and(|ids| ids.contains(*id)))
            {
                return Err(IndexDivergence::StalePosting {
                    token: token.to_string(),
                    id: format!("{stale:?}"),
                });
            }
        }

        Ok(())
    }

    fn with_postings(&self, postings: PersistentHashMap<Token, Bucket<I>>) -> Self {
        Self {
            tokenizer: self.tokenizer.clone(),
            postings,
        }
    }

    fn insert_posting(
        postings: &PersistentHashMap<Token, Bucket<I>>,
        token: &str,
        id: &I,
    ) -> PersistentHashMap<Token, Bucket<I>> {
        match postings.get(token) {
            Some(bucket) if bucket.contains(id) => postings.clone(),
            Some(bucket) => postings.insert(Token::from(token), Arc::new(bucket.insert(id.clone()))),
            None => postings.insert(Token::from(token), Arc::new(PostingSet::singleton(id.clone()))),
        }
    }

    fn remove_posting(
        postings: &PersistentHashMap<Token, Bucket<I>>,
        token: &str,
        id: &I,
    ) -> PersistentHashMap<Token, Bucket<I>> {
        match postings.get(token) {
            Some(bucket) if bucket.contains(id) => {
                let remaining = bucket.remove(id);
                if remaining.is_empty() {
                    postings.remove(token)
                } else {
                    postings.insert(Token::from(token), Arc::new(remaining))
                }
            }
            _ => postings.clone(),
        }
    }
}

impl<I> Default for InvertedIndex<I> {
    fn default() -> Self {
        Self::new(Tokenizer::default())
    }
}

impl<I: fmt::Debug> fmt::Debug for InvertedIndex<I> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(&Token, &Bucket<I>)> = self.postings.iter().collect();
        entries.sort_unstable_by(|(left, _), (right, _)| left.cmp(right));
        formatter
            .debug_struct("InvertedIndex")
            .field("tokenizer", &self.tokenizer)
            .field("postings", &DebugEntries(&entries))
            .finish()
    }
}

struct DebugEntries<'a, I>(&'a [(&'a Token, &'a Bucket<I>)]);

impl<I: fmt::Debug> fmt::Debug for DebugEntries<'_, I> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_map()
            .entries(self.0.iter().map(|(token, bucket)| (token, bucket)))
            .finish()
    }
}

/// Serializes as a map of token to ascending identifiers, sorted by token.
#[cfg(feature = "serde")]
impl<I: serde::Serialize> serde::Serialize for InvertedIndex<I> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<(&Token, &Bucket<I>)> = self.postings.iter().collect();
        entries.sort_unstable_by(|(left, _), (right, _)| left.cmp(right));
        serializer.collect_map(
            entries
                .into_iter()
                .map(|(token, bucket)| (token.as_str(), &**bucket)),
        )
    }
}
