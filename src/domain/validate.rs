//! Boundary validation for user input.
//!
//! These checks run before an action is constructed. Each returns the
//! normalized value on success.

use crate::error::{MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, ValidationError};

/// Trims a title and checks that it is non-empty and not too long.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyTitle`] or
/// [`ValidationError::TitleTooLong`].
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let length = trimmed.chars().count();
    if length > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong {
            max: MAX_TITLE_LENGTH,
            actual: length,
        });
    }
    Ok(trimmed.to_string())
}

/// Trims a description and checks its length. Empty is allowed.
///
/// # Errors
///
/// Returns [`ValidationError::DescriptionTooLong`].
pub fn validate_description(description: &str) -> Result<String, ValidationError> {
    let trimmed = description.trim();
    let length = trimmed.chars().count();
    if length > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION_LENGTH,
            actual: length,
        });
    }
    Ok(trimmed.to_string())
}

/// Checks that a colour is `#RGB` or `#RRGGBB` hex, returning it trimmed.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidColor`].
pub fn validate_color(color: &str) -> Result<String, ValidationError> {
    let trimmed = color.trim();
    let is_valid = trimmed.strip_prefix('#').is_some_and(|digits| {
        matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
    });
    if is_valid {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidColor(color.to_string()))
    }
}
