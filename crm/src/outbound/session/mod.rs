//! Session token persistence.

mod file_token_store;

pub use file_token_store::{FileSessionTokenStore, SessionKey};
