//! Port for the password hashing primitive.

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashError {
        /// Hash computation failed.
        Hashing { message } => "password hashing failed: {message}",
        /// The stored hash could not be parsed.
        MalformedHash { message } => "stored password hash is malformed: {message}",
    }
}

/// Salted slow hash used for staff passwords.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash `password` with a fresh salt.
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Check `password` against a hash produced by [`PasswordHasher::hash`].
    ///
    /// A mismatch is `Ok(false)`; errors are reserved for unreadable hashes.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError>;
}
