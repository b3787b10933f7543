//! CRM staff console library.
//!
//! Hexagonal layout: [`domain`] holds records, the permission policy and
//! services; [`inbound`] is the terminal adapter; [`outbound`] implements the
//! storage, hashing and session-token ports.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::CrmSettings;
