//! PostgreSQL persistence adapter using Diesel ORM.
//!
//! Implements the storage port over `diesel-async` with `bb8` connection
//! pooling. Row structs (`models.rs`) and table definitions (`schema.rs`)
//! are internal and never reach the domain.
//!
//! # Example
//!
//! ```ignore
//! use crm::outbound::persistence::{DbPool, DieselCrmStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/crm")).await?;
//! let store = DieselCrmStore::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_store::DieselCrmStore;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, OwnedConnection, PoolConfig, PoolError};
