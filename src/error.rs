//! Error types.
//!
//! Three things can go wrong around a task store, and each has its own type:
//!
//! - [`ValidationError`]: user input rejected at the boundary, before an
//!   [`Action`](crate::store::Action) exists.
//! - [`ConfigurationError`]: an invalid value in a
//!   [`StoreConfig`](crate::config::StoreConfig) source.
//! - [`IndexDivergence`]: the inverted index no longer describes the records it
//!   was built from. Only reported by
//!   [`InvertedIndex::verify`](crate::index::InvertedIndex::verify).
//!
//! Acting on an identifier that does not exist is not an error anywhere in
//! this crate. The reducer treats it as a no-op.

use thiserror::Error;

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// Input rejected before it reaches the reducer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is empty after trimming.
    #[error("Title is required")]
    EmptyTitle,

    /// Title exceeds [`MAX_TITLE_LENGTH`] characters.
    #[error("Title must be at most {max} characters, got {actual}")]
    TitleTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Length of the rejected title.
        actual: usize,
    },

    /// Description exceeds [`MAX_DESCRIPTION_LENGTH`] characters.
    #[error("Description must be at most {max} characters, got {actual}")]
    DescriptionTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Length of the rejected description.
        actual: usize,
    },

    /// Colour is not `#RGB` or `#RRGGBB`.
    #[error("Invalid color: '{0}'. Expected '#RGB' or '#RRGGBB'")]
    InvalidColor(String),
}

/// Errors that can occur while loading a store configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid tokenizer mode value.
    #[error("Invalid tokenizer mode: '{0}'. Expected 'word_segmentation' or 'pattern'")]
    InvalidTokenizerMode(String),

    /// Invalid locale tag.
    #[error("Invalid locale: '{0}'. Expected a BCP 47 language tag such as 'en' or 'tr-TR'")]
    InvalidLocale(String),

    /// Invalid default completion colour.
    #[error("Invalid complete color: {0}")]
    InvalidCompleteColor(#[source] ValidationError),

    /// Variable is set but is not valid Unicode.
    #[error("Environment variable {0} is not valid unicode")]
    NotUnicode(String),
}

/// A disagreement between an inverted index and the records it describes.
///
/// Identifiers are carried in their `Debug` rendering so the report does not
/// depend on the identifier type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexDivergence {
    /// A title token of a live record has no posting for that record.
    #[error("Missing posting: token '{token}' does not list record {id}")]
    MissingPosting {
        /// Token the record's title produces.
        token: String,
        /// Record missing from the bucket.
        id: String,
    },

    /// A posting names a record that is gone or whose title lost the token.
    #[error("Stale posting: token '{token}' lists record {id}")]
    StalePosting {
        /// Token whose bucket is stale.
        token: String,
        /// Record listed without a matching title.
        id: String,
    },

    /// A token maps to an empty posting set.
    #[error("Empty bucket for token '{0}'")]
    EmptyBucket(String),
}
