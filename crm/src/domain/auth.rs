//! Login credentials and the claims carried by a resumable session.
//!
//! The terminal adapter builds [`LoginCredentials`] from prompt input; the
//! session gate issues and checks [`SessionClaims`].

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use super::UserId;

/// How long a stored session stays valid after it is issued.
pub const SESSION_TTL: TimeDelta = TimeDelta::hours(24);

/// Login prompt answers that cannot be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoginValidationError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Username and password from the login prompt.
///
/// The username is trimmed; the password is kept as typed and wiped on drop.
///
/// ```
/// use crm::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" carl ", "password1").expect("complete input");
/// assert_eq!(creds.username(), "carl");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Build credentials from raw prompt input. The username is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`LoginValidationError`] when either part is empty.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        match (username.trim(), password) {
            ("", _) => Err(LoginValidationError::EmptyUsername),
            (_, "") => Err(LoginValidationError::EmptyPassword),
            (username, password) => Ok(Self {
                username: username.to_owned(),
                password: Zeroizing::new(password.to_owned()),
            }),
        }
    }

    /// Trimmed username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password exactly as typed.
    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Payload of a stored session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    /// Claims for `user_id` issued at `now`.
    pub fn issue(user_id: UserId, username: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            username: username.to_owned(),
            expires_at: now + SESSION_TTL,
        }
    }

    /// Whether the claims have lapsed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyUsername)]
    #[case("   ", "pw", LoginValidationError::EmptyUsername)]
    #[case("user", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(username, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn password_whitespace_is_preserved() {
        let creds = LoginCredentials::try_from_parts("sam", " spaced ").expect("valid input");
        assert_eq!(creds.password(), " spaced ");
    }

    #[rstest]
    #[case(TimeDelta::hours(23), false)]
    #[case(TimeDelta::hours(24), true)]
    #[case(TimeDelta::hours(30), true)]
    fn claims_expire_after_a_day(#[case] elapsed: TimeDelta, #[case] expired: bool) {
        let issued = Utc
            .with_ymd_and_hms(2024, 3, 1, 10, 0, 0)
            .single()
            .expect("valid timestamp");
        let claims = SessionClaims::issue(UserId::new(1), "admin", issued);
        assert_eq!(claims.is_expired(issued + elapsed), expired);
    }
}
