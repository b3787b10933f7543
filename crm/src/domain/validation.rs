//! Contact-detail checks shared by collaborators and clients.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Rejected email address or phone number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactValidationError {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("'{0}' is not a valid phone number (10 to 15 digits, optional leading +)")]
    InvalidPhone(String),
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_SEPARATORS_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[a-zA-Z0-9._%+-]+@(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn phone_separators_regex() -> &'static Regex {
    PHONE_SEPARATORS_RE.get_or_init(|| {
        Regex::new(r"[\s\-().]")
            .unwrap_or_else(|error| panic!("phone separator regex failed to compile: {error}"))
    })
}

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        // Separators are stripped first; this only constrains the digits.
        Regex::new(r"^\+?[0-9]{10,15}$")
            .unwrap_or_else(|error| panic!("phone regex failed to compile: {error}"))
    })
}

/// Check an email address is well formed.
pub fn validate_email(raw: &str) -> Result<(), ContactValidationError> {
    if email_regex().is_match(raw.trim()) {
        Ok(())
    } else {
        Err(ContactValidationError::InvalidEmail(raw.trim().to_owned()))
    }
}

/// Check a phone number once spaces, dashes, dots and parentheses are removed.
pub fn validate_phone(raw: &str) -> Result<(), ContactValidationError> {
    let compact = phone_separators_regex().replace_all(raw.trim(), "");
    if phone_regex().is_match(&compact) {
        Ok(())
    } else {
        Err(ContactValidationError::InvalidPhone(raw.trim().to_owned()))
    }
}
