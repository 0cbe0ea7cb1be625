//! Title tokenization.
//!
//! Free text is case folded and then split into word-like tokens. Two
//! segmentation strategies are available:
//!
//! - [`TokenizerMode::WordSegmentation`] (preferred): Unicode word boundaries
//!   (UAX #29), keeping only word-like segments.
//! - [`TokenizerMode::Pattern`]: runs of letters and digits, allowing a single
//!   `-` or `'` *between* runs, so `co-op` and `don't` stay whole.
//!
//! Tokenization is a pure function of the text, the locale and the mode.
//!
//! # Examples
//!
//! ```rust
//! use taskdex::tokenize::{tokenize, Locale, Tokenizer, TokenizerMode};
//!
//! let locale = Locale::default();
//! assert_eq!(tokenize("Buy MILK, then bread!", &locale), vec!["buy", "milk", "then", "bread"]);
//!
//! let pattern = Tokenizer::new(locale, TokenizerMode::Pattern);
//! assert_eq!(pattern.tokenize("Co-op meeting"), vec!["co-op", "meeting"]);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::ConfigurationError;

/// Letter/digit runs joined by single inner hyphens or apostrophes.
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['-][\p{L}\p{N}]+)*").expect("Invalid token pattern")
});

// =============================================================================
// Locale
// =============================================================================

/// A BCP 47 language tag such as `en`, `tr-TR` or `pt-BR`.
///
/// The locale only changes case folding: Turkic languages (`tr`, `az`) fold
/// dotted and dotless I differently from every other language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale(String);

impl Locale {
    /// Parses a language tag. Underscores are accepted as separators and
    /// normalized to hyphens.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidLocale`] if the primary subtag is
    /// not 2 to 8 ASCII letters or a later subtag is not 1 to 8 ASCII
    /// alphanumerics.
    pub fn parse(tag: &str) -> Result<Self, ConfigurationError> {
        let normalized = tag.trim().replace('_', "-");
        let mut subtags = normalized.split('-');

        let primary_is_valid = subtags.next().is_some_and(|primary| {
            (2..=8).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic())
        });
        let rest_is_valid = subtags.all(|subtag| {
            (1..=8).contains(&subtag.len()) && subtag.chars().all(|c| c.is_ascii_alphanumeric())
        });

        if primary_is_valid && rest_is_valid {
            Ok(Self(normalized))
        } else {
            Err(ConfigurationError::InvalidLocale(tag.to_string()))
        }
    }

    /// Returns the tag as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the primary language subtag, lowercased.
    #[must_use]
    pub fn language(&self) -> String {
        self.0
            .split('-')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    /// Returns `true` for languages with Turkic dotted/dotless I casing.
    #[must_use]
    pub fn is_turkic(&self) -> bool {
        matches!(self.language().as_str(), "tr" | "az")
    }

    /// Lowercases `text` according to this locale.
    #[must_use]
    pub fn fold_case(&self, text: &str) -> String {
        if self.is_turkic() {
            text.replace('I', "ı").replace('İ', "i").to_lowercase()
        } else {
            text.to_lowercase()
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self("en".to_string())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl FromStr for Locale {
    type Err = ConfigurationError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::parse(tag)
    }
}

// =============================================================================
// TokenizerMode
// =============================================================================

/// Segmentation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenizerMode {
    /// Unicode word segmentation (UAX #29).
    #[default]
    WordSegmentation,
    /// Regular-expression letter/digit runs.
    Pattern,
}

impl TokenizerMode {
    /// Returns the configuration name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WordSegmentation => "word_segmentation",
            Self::Pattern => "pattern",
        }
    }
}

impl fmt::Display for TokenizerMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for TokenizerMode {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "word_segmentation" => Ok(Self::WordSegmentation),
            "pattern" => Ok(Self::Pattern),
            _ => Err(ConfigurationError::InvalidTokenizerMode(value.to_string())),
        }
    }
}

// =============================================================================
// Tokenizer
// =============================================================================

/// A configured tokenizer: locale plus segmentation mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tokenizer {
    locale: Locale,
    mode: TokenizerMode,
}

impl Tokenizer {
    /// Creates a tokenizer.
    #[must_use]
    pub const fn new(locale: Locale, mode: TokenizerMode) -> Self {
        Self { locale, mode }
    }

    /// Returns the locale.
    #[must_use]
    pub const fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Returns the segmentation mode.
    #[must_use]
    pub const fn mode(&self) -> TokenizerMode {
        self.mode
    }

    /// Splits `text` into normalized tokens, in order of appearance.
    ///
    /// Tokens may repeat. Empty input, or input with no word-like content,
    /// yields an empty vector.
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let folded = self.locale.fold_case(text);
        match self.mode {
            TokenizerMode::WordSegmentation => folded.unicode_words().map(str::to_owned).collect(),
            TokenizerMode::Pattern => TOKEN_PATTERN
                .find_iter(&folded)
                .map(|found| found.as_str().to_owned())
                .collect(),
        }
    }

    /// Like [`tokenize`](Self::tokenize), keeping only the first occurrence of
    /// each token.
    #[must_use]
    pub fn unique_tokens(&self, text: &str) -> Vec<String> {
        let mut tokens = self.tokenize(text);
        let mut seen = std::collections::HashSet::with_capacity(tokens.len());
        tokens.retain(|token| seen.insert(token.clone()));
        tokens
    }

    /// Normalizes a query term: trim, then case fold.
    #[must_use]
    pub fn normalize_term(&self, term: &str) -> String {
        self.locale.fold_case(term.trim())
    }
}

/// Tokenizes `text` with the preferred segmentation for `locale`.
#[must_use]
pub fn tokenize(text: &str, locale: &Locale) -> Vec<String> {
    Tokenizer::new(locale.clone(), TokenizerMode::default()).tokenize(text)
}

/// Trims and case folds a query term for `locale`.
#[must_use]
pub fn normalize_term(term: &str, locale: &Locale) -> String {
    locale.fold_case(term.trim())
}
