//! Typed failures shared by every service.
//!
//! The console prints [`DomainError::message`] and keeps running; [`ErrorCode`]
//! decides whether the failure is also logged as a system fault.

use thiserror::Error;

/// Failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Input failed validation or conflicts with stored records.
    InvalidRequest,
    /// Credentials missing or wrong.
    Unauthorized,
    /// The policy refused the operation.
    Forbidden,
    NotFound,
    /// Storage or the session file could not be reached.
    ServiceUnavailable,
    InternalError,
}

impl ErrorCode {
    /// Short lowercase name, used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::ServiceUnavailable => "service_unavailable",
            Self::InternalError => "internal_error",
        }
    }

    /// Infrastructure failures, as opposed to operator mistakes or refusals.
    pub const fn is_system(self) -> bool {
        matches!(self, Self::ServiceUnavailable | Self::InternalError)
    }

    const fn fallback_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid request",
            Self::Unauthorized => "authentication required",
            Self::Forbidden => "access denied",
            Self::NotFound => "not found",
            Self::ServiceUnavailable => "service unavailable",
            Self::InternalError => "internal error",
        }
    }
}

/// A failed domain operation.
///
/// The message is never blank.
///
/// # Examples
/// ```
/// use crm::domain::{DomainError, ErrorCode};
///
/// let err = DomainError::forbidden("commercials cannot delete collaborators");
/// assert_eq!(err.code(), ErrorCode::Forbidden);
/// assert!(!err.is_system());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DomainError {
    code: ErrorCode,
    message: String,
}

impl DomainError {
    /// Build an error; a blank message is replaced by one describing `code`.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.fallback_message().to_owned()
        } else {
            message
        };
        Self { code, message }
    }

    /// Failure category.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Text shown to the operator.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// See [`ErrorCode::is_system`].
    pub fn is_system(&self) -> bool {
        self.code.is_system()
    }

    /// Rejected input.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Missing or bad credentials.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Refused by the permission policy.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Missing record.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Storage or terminal could not be reached.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Unexpected fault.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

#[cfg(test)]
mod tests;
