//! Integer identifiers for persisted records.
//!
//! Each record kind gets its own newtype so a contract id can never be passed
//! where a client id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Failure to parse an identifier typed at the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdParseError {
    NotANumber(String),
    NotPositive(i32),
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber(raw) => write!(f, "'{raw}' is not a valid identifier"),
            Self::NotPositive(value) => write!(f, "identifier must be positive, got {value}"),
        }
    }
}

impl std::error::Error for IdParseError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database identifier.
            pub const fn new(value: i32) -> Self {
                Self(value)
            }

            /// Raw database identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let trimmed = raw.trim();
                let value: i32 = trimmed
                    .parse()
                    .map_err(|_| IdParseError::NotANumber(trimmed.to_owned()))?;
                if value <= 0 {
                    return Err(IdParseError::NotPositive(value));
                }
                Ok(Self(value))
            }
        }
    };
}

define_id!(
    /// Identifier of a staff account.
    UserId
);
define_id!(
    /// Identifier of a department row.
    DepartmentId
);
define_id!(
    /// Identifier of a client.
    ClientId
);
define_id!(
    /// Identifier of a contract.
    ContractId
);
define_id!(
    /// Identifier of an event.
    EventId
);
