//! Exact money amounts stored as whole cents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Non-negative amount of money in cents.
///
/// # Examples
/// ```
/// use crm::domain::Amount;
///
/// let amount: Amount = "1500.5".parse().expect("valid amount");
/// assert_eq!(amount.cents(), 150_050);
/// assert_eq!(amount.to_string(), "1500.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

/// Rejected amount input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    Empty,
    Malformed(String),
    Negative,
    TooPrecise,
    Overflow,
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "amount must not be empty"),
            Self::Malformed(raw) => write!(f, "'{raw}' is not a valid amount"),
            Self::Negative => write!(f, "amount must not be negative"),
            Self::TooPrecise => write!(f, "amount must have at most two decimal places"),
            Self::Overflow => write!(f, "amount is too large"),
        }
    }
}

impl std::error::Error for AmountError {}

const CENTS_PER_UNIT: i64 = 100;

impl Amount {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Build from a cent count, rejecting negative values.
    pub fn from_cents(cents: i64) -> Result<Self, AmountError> {
        if cents < 0 {
            return Err(AmountError::Negative);
        }
        Ok(Self(cents))
    }

    /// Cent count.
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Whether anything is left to pay.
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }
        if trimmed.starts_with('-') {
            return Err(AmountError::Negative);
        }
        let malformed = || AmountError::Malformed(trimmed.to_owned());
        let (units, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if units.is_empty() || !units.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if fraction.len() > 2 {
            return Err(AmountError::TooPrecise);
        }
        let units: i64 = units.parse().map_err(|_| AmountError::Overflow)?;
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| malformed())? * 10,
            _ => fraction.parse().map_err(|_| malformed())?,
        };
        units
            .checked_mul(CENTS_PER_UNIT)
            .and_then(|value| value.checked_add(cents))
            .map(Self)
            .ok_or(AmountError::Overflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.0.div_euclid(CENTS_PER_UNIT);
        let cents = self.0.rem_euclid(CENTS_PER_UNIT);
        write!(f, "{units}.{cents:02}")
    }
}
