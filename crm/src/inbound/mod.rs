//! Inbound adapters translating operator input into domain service calls.
//!
//! The only transport is the interactive terminal under [`cli`].

pub mod cli;
