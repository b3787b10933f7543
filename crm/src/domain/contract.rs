//! Contracts between a client and the company.

use std::fmt;

use chrono::{DateTime, Utc};

use super::{Amount, ClientId, ContractId, UserId};

/// Persisted contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    pub id: ContractId,
    pub client_id: ClientId,
    /// Owning commercial.
    pub commercial_id: UserId,
    pub total: Amount,
    pub remaining: Amount,
    pub signed: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl Contract {
    /// Whether a balance is still owed.
    pub fn is_unpaid(&self) -> bool {
        self.remaining.is_positive()
    }
}

/// Amount invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractValidationError {
    RemainingExceedsTotal { remaining: Amount, total: Amount },
}

impl fmt::Display for ContractValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemainingExceedsTotal { remaining, total } => write!(
                f,
                "remaining amount {remaining} exceeds total amount {total}"
            ),
        }
    }
}

impl std::error::Error for ContractValidationError {}

fn check_amounts(total: Amount, remaining: Amount) -> Result<(), ContractValidationError> {
    if remaining > total {
        return Err(ContractValidationError::RemainingExceedsTotal { remaining, total });
    }
    Ok(())
}

/// Raw input for a new contract.
///
/// `commercial_id` is only consulted when the client has no owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDraft {
    pub client_id: ClientId,
    pub total: Amount,
    pub remaining: Amount,
    pub signed: bool,
    pub commercial_id: Option<UserId>,
}

impl ContractDraft {
    /// Check the amounts are coherent.
    pub fn validate(&self) -> Result<(), ContractValidationError> {
        check_amounts(self.total, self.remaining)
    }
}

/// Contract row ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContract {
    pub client_id: ClientId,
    pub commercial_id: UserId,
    pub total: Amount,
    pub remaining: Amount,
    pub signed: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractPatch {
    pub total: Option<Amount>,
    pub remaining: Option<Amount>,
    pub signed: Option<bool>,
}

impl ContractPatch {
    /// Apply set fields to `target`, then re-check the amount invariant.
    ///
    /// `target` is left untouched when the result would be invalid.
    pub fn apply(
        &self,
        target: &mut Contract,
        now: DateTime<Utc>,
    ) -> Result<(), ContractValidationError> {
        let total = self.total.unwrap_or(target.total);
        let remaining = self.remaining.unwrap_or(target.remaining);
        check_amounts(total, remaining)?;
        target.total = total;
        target.remaining = remaining;
        if let Some(signed) = self.signed {
            target.signed = signed;
        }
        target.last_updated_at = now;
        Ok(())
    }
}

/// Canned contract listings offered to commercials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractFilter {
    Unsigned,
    Signed,
    /// Remaining amount above zero.
    Unpaid,
}

impl ContractFilter {
    /// Whether `contract` passes this filter.
    pub fn matches(self, contract: &Contract) -> bool {
        match self {
            Self::Unsigned => !contract.signed,
            Self::Signed => contract.signed,
            Self::Unpaid => contract.is_unpaid(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    fn cents(value: i64) -> Amount {
        Amount::from_cents(value).expect("non-negative")
    }

    #[fixture]
    fn contract() -> Contract {
        let created = Utc
            .with_ymd_and_hms(2024, 1, 10, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        Contract {
            id: ContractId::new(1),
            client_id: ClientId::new(1),
            commercial_id: UserId::new(2),
            total: cents(100_000),
            remaining: cents(40_000),
            signed: false,
            created_at: created,
            last_updated_at: created,
        }
    }

    #[rstest]
    fn omitted_fields_are_unchanged(mut contract: Contract) {
        let now = contract.created_at + chrono::TimeDelta::days(1);
        let patch = ContractPatch {
            remaining: Some(cents(0)),
            ..ContractPatch::default()
        };

        patch.apply(&mut contract, now).expect("valid patch");

        assert_eq!(contract.total, cents(100_000));
        assert_eq!(contract.remaining, cents(0));
        assert!(!contract.signed);
        assert_eq!(contract.last_updated_at, now);
    }

    #[rstest]
    fn invalid_patch_leaves_contract_untouched(mut contract: Contract) {
        let before = contract.clone();
        let patch = ContractPatch {
            total: Some(cents(10_000)),
            signed: Some(true),
            ..ContractPatch::default()
        };

        let result = patch.apply(&mut contract, before.created_at);

        assert!(matches!(
            result,
            Err(ContractValidationError::RemainingExceedsTotal { .. })
        ));
        assert_eq!(contract, before);
    }

    #[rstest]
    #[case(ContractFilter::Unsigned, false, 0, true)]
    #[case(ContractFilter::Unsigned, true, 0, false)]
    #[case(ContractFilter::Signed, true, 0, true)]
    #[case(ContractFilter::Unpaid, true, 1, true)]
    #[case(ContractFilter::Unpaid, false, 0, false)]
    fn filters_match_flags(
        mut contract: Contract,
        #[case] filter: ContractFilter,
        #[case] signed: bool,
        #[case] remaining: i64,
        #[case] expected: bool,
    ) {
        contract.signed = signed;
        contract.remaining = cents(remaining);
        assert_eq!(filter.matches(&contract), expected);
    }

    #[rstest]
    fn draft_rejects_remaining_above_total() {
        let draft = ContractDraft {
            client_id: ClientId::new(1),
            total: cents(100),
            remaining: cents(200),
            signed: false,
            commercial_id: None,
        };
        assert!(draft.validate().is_err());
    }
}
