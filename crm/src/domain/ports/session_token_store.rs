//! Port for the locally stored session token.
//!
//! Adapters own the on-disk format and its signature. They hand back claims
//! only when the signature checks out; expiry is judged by the session gate.

use crate::domain::SessionClaims;

use super::define_port_error;

define_port_error! {
    /// Errors raised by session token adapters.
    pub enum SessionTokenError {
        /// The token file could not be read or written.
        Io { message } => "session token i/o failed: {message}",
        /// The token could not be decoded.
        Corrupt { message } => "session token is corrupt: {message}",
        /// The token signature does not match its payload.
        BadSignature => "session token signature is invalid",
    }
}

/// Single-slot store for the current session.
#[cfg_attr(test, mockall::automock)]
pub trait SessionTokenStore: Send + Sync {
    /// Read and verify the stored token. `Ok(None)` when no token exists.
    fn load(&self) -> Result<Option<SessionClaims>, SessionTokenError>;

    /// Sign and write `claims`, replacing any previous token.
    fn save(&self, claims: &SessionClaims) -> Result<(), SessionTokenError>;

    /// Delete the token. Returns `false` when there was nothing to delete.
    fn clear(&self) -> Result<bool, SessionTokenError>;
}
