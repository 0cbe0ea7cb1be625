//! Store configuration.
//!
//! # Environment Variables
//!
//! - `TASKDEX_LOCALE`: BCP 47 tag used for case folding (default `en`)
//! - `TASKDEX_TOKENIZER`: `word_segmentation` (default) | `pattern`
//! - `TASKDEX_COMPLETE_COLOR`: `#RGB` or `#RRGGBB` (default `#E6F4EA`)
//!
//! Unset or blank variables fall back to the default.
//!
//! # Example
//!
//! ```rust
//! use taskdex::config::StoreConfig;
//! use taskdex::tokenize::TokenizerMode;
//!
//! let config = StoreConfig::builder()
//!     .locale_tag("tr")
//!     .tokenizer_mode(TokenizerMode::Pattern)
//!     .complete_color("#FFF")
//!     .build()
//!     .unwrap();
//! assert!(config.locale.is_turkic());
//! ```

use std::env;

use crate::domain::{DEFAULT_COMPLETE_COLOR, validate_color};
use crate::error::ConfigurationError;
use crate::tokenize::{Locale, Tokenizer, TokenizerMode};

/// Locale variable name.
pub const LOCALE_VARIABLE: &str = "TASKDEX_LOCALE";
/// Tokenizer mode variable name.
pub const TOKENIZER_VARIABLE: &str = "TASKDEX_TOKENIZER";
/// Completion colour variable name.
pub const COMPLETE_COLOR_VARIABLE: &str = "TASKDEX_COMPLETE_COLOR";

/// Configuration for a [`Store`](crate::store::Store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Locale used to case fold titles and queries.
    pub locale: Locale,
    /// Title segmentation strategy.
    pub tokenizer_mode: TokenizerMode,
    /// Initial background colour for completed tasks.
    pub complete_color: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            tokenizer_mode: TokenizerMode::default(),
            complete_color: DEFAULT_COMPLETE_COLOR.to_string(),
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a variable is not valid Unicode or
    /// holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| env::var(name))
    }

    /// Creates a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let read = |name: &str| -> Result<Option<String>, ConfigurationError> {
            match lookup(name) {
                Ok(value) => Ok(Some(value.trim().to_string()).filter(|value| !value.is_empty())),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(env::VarError::NotUnicode(_)) => Err(ConfigurationError::NotUnicode(name.to_string())),
            }
        };

        let mut builder = Self::builder();
        if let Some(tag) = read(LOCALE_VARIABLE)? {
            builder = builder.locale(tag.parse()?);
        }
        if let Some(mode) = read(TOKENIZER_VARIABLE)? {
            builder = builder.tokenizer_mode(mode.parse()?);
        }
        if let Some(color) = read(COMPLETE_COLOR_VARIABLE)? {
            builder = builder.complete_color(color);
        }
        builder.build()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidCompleteColor`] for a malformed
    /// colour.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_color(&self.complete_color)
            .map(|_| ())
            .map_err(ConfigurationError::InvalidCompleteColor)
    }

    /// Returns the tokenizer described by this configuration.
    #[must_use]
    pub fn tokenizer(&self) -> Tokenizer {
        Tokenizer::new(self.locale.clone(), self.tokenizer_mode)
    }
}

/// Builder for `StoreConfig`.
#[derive(Debug, Clone, Default)]
pub struct StoreConfigBuilder {
    locale: Option<Locale>,
    locale_tag: Option<String>,
    tokenizer_mode: TokenizerMode,
    complete_color: Option<String>,
}

impl StoreConfigBuilder {
    /// Sets the locale.
    #[must_use]
    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self.locale_tag = None;
        self
    }

    /// Sets the locale from a tag, parsed in [`build`](Self::build).
    #[must_use]
    pub fn locale_tag(mut self, tag: impl Into<String>) -> Self {
        self.locale_tag = Some(tag.into());
        self.locale = None;
        self
    }

    /// Sets the tokenizer mode.
    #[must_use]
    pub const fn tokenizer_mode(mut self, mode: TokenizerMode) -> Self {
        self.tokenizer_mode = mode;
        self
    }

    /// Sets the completion colour.
    #[must_use]
    pub fn complete_color(mut self, color: impl Into<String>) -> Self {
        self.complete_color = Some(color.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the locale tag or the colour is
    /// invalid.
    pub fn build(self) -> Result<StoreConfig, ConfigurationError> {
        let locale = match (self.locale, self.locale_tag) {
            (_, Some(tag)) => Locale::parse(&tag)?,
            (Some(locale), None) => locale,
            (None, None) => Locale::default(),
        };
        let complete_color = match self.complete_color {
            Some(color) => validate_color(&color).map_err(ConfigurationError::InvalidCompleteColor)?,
            None => DEFAULT_COMPLETE_COLOR.to_string(),
        };

        Ok(StoreConfig {
            locale,
            tokenizer_mode: self.tokenizer_mode,
            complete_color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.locale.as_str(), "en");
        assert_eq!(config.tokenizer_mode, TokenizerMode::WordSegmentation);
        assert_eq!(config.complete_color, "#E6F4EA");
        assert!(config.validate().is_ok());
    }

    #[rstest]
    fn test_builder_rejects_bad_color() {
        let result = StoreConfig::builder().complete_color("green").build();
        assert!(matches!(result, Err(ConfigurationError::InvalidCompleteColor(_))));
    }

    #[rstest]
    fn test_builder_last_locale_wins() {
        let config = StoreConfig::builder()
            .locale_tag("tr")
            .locale(Locale::default())
            .build()
            .expect("valid config");
        assert_eq!(config.locale, Locale::default());
    }
}
