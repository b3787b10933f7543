//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: PostgreSQL storage using Diesel ORM
//! - **password**: Argon2id password hashing
//! - **session**: signed session token file
//! - **memory**: in-memory storage for tests and demos (`test-support`)
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod password;
pub mod persistence;
pub mod session;
