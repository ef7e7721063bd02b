//! Input validation rules shared by create inputs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Upper bound accepted for `Employee::age`.
pub const MAX_AGE: u32 = 150;

/// Rejection reason for a malformed create input.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required text field is empty after trimming.
    EmptyField(&'static str),
    /// Money field is negative or not a finite number.
    InvalidAmount { field: &'static str, value: f64 },
    /// Age exceeds `MAX_AGE`.
    AgeOutOfRange(u32),
    /// Email does not look like `local@domain.tld`.
    InvalidEmail(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "field `{field}` must not be empty"),
            Self::InvalidAmount { field, value } => {
                write!(f, "field `{field}` must be a non-negative number, got {value}")
            }
            Self::AgeOutOfRange(age) => write!(f, "age {age} is outside 0..={MAX_AGE}"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

pub(crate) fn require_amount(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidAmount { field, value });
    }
    Ok(())
}

pub(crate) fn require_email(value: &str) -> Result<(), ValidationError> {
    if !EMAIL_RE.is_match(value) {
        return Err(ValidationError::InvalidEmail(value.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{require_amount, require_email, require_text, ValidationError};

    #[test]
    fn amount_rejects_negative_and_nan() {
        assert!(require_amount("budget", 0.0).is_ok());
        assert!(matches!(
            require_amount("budget", -1.0),
            Err(ValidationError::InvalidAmount { field: "budget", .. })
        ));
        assert!(require_amount("budget", f64::NAN).is_err());
    }

    #[test]
    fn email_requires_domain_part() {
        assert!(require_email("ada@example.com").is_ok());
        assert!(require_email("ada@example").is_err());
        assert!(require_email("not an email").is_err());
        assert!(require_email("ada lovelace@example.com").is_err());
        assert!(require_email("ada@@example.com").is_err());
    }

    #[test]
    fn text_rejects_whitespace_only() {
        assert_eq!(
            require_text("name", "   "),
            Err(ValidationError::EmptyField("name"))
        );
    }
}
