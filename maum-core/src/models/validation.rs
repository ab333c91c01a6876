//! Validation error types and the field checks shared by request models

use serde::{Deserialize, Deserializer};

/// Validation error for request models
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Field is empty (or missing) when it shouldn't be
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Field is shorter than the minimum length
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    /// Field exceeds maximum length
    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Number outside the allowed inclusive range
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    /// String doesn't match required format
    #[error("{field}: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// Invalid enum variant
    #[error("invalid {field} value: '{value}'")]
    InvalidVariant { field: &'static str, value: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field }
            | Self::TooShort { field, .. }
            | Self::TooLong { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::InvalidFormat { field, .. }
            | Self::InvalidVariant { field, .. } => field,
        }
    }
}

/// Trim and bound a free-text field. Lengths count characters, not bytes.
pub(crate) fn text(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    let len = trimmed.chars().count();
    if len < min {
        return Err(ValidationError::TooShort { field, min });
    }
    if len > max {
        return Err(ValidationError::TooLong { field, max });
    }

    Ok(trimmed.to_owned())
}

/// Check an integer against an inclusive range.
pub(crate) fn int_in_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<i32, ValidationError> {
    if !(min..=max).contains(&value) {
        return Err(ValidationError::OutOfRange { field, min, max });
    }
    // Ranges used by the models all fit in i32.
    Ok(value as i32)
}

/// Deserialize a field that must be present but may be `null`.
///
/// Combined with `#[serde(default)]` the outer `Option` is `None` only when
/// the key is missing.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "title",
            max: 50,
        };
        assert_eq!(err.to_string(), "title exceeds maximum length of 50 characters");

        let err = ValidationError::OutOfRange {
            field: "grade",
            min: 1,
            max: 6,
        };
        assert_eq!(err.to_string(), "grade must be between 1 and 6");
    }

    #[test]
    fn text_trims_and_counts_chars() {
        assert_eq!(text("name", "  김민수 ", 1, 3).unwrap(), "김민수");
        assert!(matches!(
            text("name", "가나다라", 1, 3),
            Err(ValidationError::TooLong { max: 3, .. })
        ));
        assert!(matches!(
            text("name", "   ", 1, 3),
            Err(ValidationError::Empty { field: "name" })
        ));
    }

    #[test]
    fn int_range_is_inclusive() {
        assert_eq!(int_in_range("grade", 1, 1, 6).unwrap(), 1);
        assert_eq!(int_in_range("grade", 6, 1, 6).unwrap(), 6);
        assert!(int_in_range("grade", 0, 1, 6).is_err());
        assert!(int_in_range("grade", 7, 1, 6).is_err());
    }
}
