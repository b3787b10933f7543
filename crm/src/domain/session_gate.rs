//! Authentication and resumable sessions.
//!
//! The gate checks credentials against the stored password hash and keeps a
//! signed token so the next start-up within [`SESSION_TTL`] skips the login
//! prompt.
//!
//! [`SESSION_TTL`]: crate::domain::SESSION_TTL

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, error, info, warn};

use crate::domain::ports::{CrmStore, PasswordHasher, SessionTokenError, SessionTokenStore};
use crate::domain::unit_of_work::{begin, map_store_error, settle};
use crate::domain::{Collaborator, DomainError, LoginCredentials, SessionClaims};

/// Entry point for authentication.
#[derive(Clone)]
pub struct SessionGate {
    store: Arc<dyn CrmStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn SessionTokenStore>,
    clock: Arc<dyn Clock>,
}

fn map_token_error(error: SessionTokenError) -> DomainError {
    DomainError::service_unavailable(format!("session storage unavailable: {error}"))
}

impl SessionGate {
    /// Create a gate from its collaborators.
    pub fn new(
        store: Arc<dyn CrmStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn SessionTokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            clock,
        }
    }

    /// Check `credentials`. Unknown users and wrong passwords yield `Ok(None)`.
    pub async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<Collaborator>, DomainError> {
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = uow
            .find_user_by_username(credentials.username())
            .await
            .map_err(map_store_error);
        let Some(user) = settle(uow, outcome).await? else {
            debug!(username = credentials.username(), "login for unknown user");
            return Ok(None);
        };
        let matches = self
            .hasher
            .verify(credentials.password(), &user.password_hash)
            .map_err(|err| {
                error!(user_id = %user.id, error = %err, "stored password hash unreadable");
                DomainError::internal(err.to_string())
            })?;
        if matches {
            info!(user_id = %user.id, "login succeeded");
            Ok(Some(user))
        } else {
            warn!(username = credentials.username(), "login failed");
            Ok(None)
        }
    }

    /// Restore the user of a stored, unexpired, correctly signed token.
    ///
    /// Invalid tokens are discarded. Never fails; problems are logged.
    pub async fn resume(&self) -> Option<Collaborator> {
        let claims = match self.tokens.load() {
            Ok(Some(claims)) => claims,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "discarding unreadable session token");
                self.discard();
                return None;
            }
        };
        if claims.is_expired(self.clock.utc()) {
            info!(user_id = %claims.user_id, "session expired");
            self.discard();
            return None;
        }
        let user = match self.lookup(&claims).await {
            Ok(user) => user,
            Err(err) => {
                error!(error = %err, "could not restore session");
                return None;
            }
        };
        match user {
            Some(user) if user.username == claims.username => {
                info!(user_id = %user.id, "session resumed");
                Some(user)
            }
            _ => {
                warn!(user_id = %claims.user_id, "session refers to an unknown user");
                self.discard();
                None
            }
        }
    }

    async fn lookup(&self, claims: &SessionClaims) -> Result<Option<Collaborator>, DomainError> {
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = uow.find_user(claims.user_id).await.map_err(map_store_error);
        settle(uow, outcome).await
    }

    fn discard(&self) {
        if let Err(err) = self.tokens.clear() {
            warn!(error = %err, "failed to remove session token");
        }
    }

    /// Store a freshly signed token for `user`.
    pub fn persist(&self, user: &Collaborator) -> Result<(), DomainError> {
        let claims = SessionClaims::issue(user.id, &user.username, self.clock.utc());
        self.tokens.save(&claims).map_err(map_token_error)
    }

    /// Remove the stored token. Returns `false` when none existed.
    pub fn logout(&self) -> Result<bool, DomainError> {
        let removed = self.tokens.clear().map_err(map_token_error)?;
        if removed {
            info!("session closed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "session_gate_tests.rs"]
mod tests;
