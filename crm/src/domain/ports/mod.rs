//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod password_hasher;
mod session_token_store;
mod store;

#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use session_token_store::MockSessionTokenStore;
pub use session_token_store::{SessionTokenError, SessionTokenStore};
pub use store::{
    ClientQuery, ContractQuery, CrmStore, EventQuery, StoreError, SupportFilter, UnitOfWork,
};
