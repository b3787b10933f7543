//! Contract management.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::client_service::find_client;
use crate::domain::policy::{self, Action, Actor, Entity, Ownership, VisibilityScope};
use crate::domain::ports::{ContractQuery, CrmStore, UnitOfWork};
use crate::domain::role_resolver::role_in;
use crate::domain::unit_of_work::{begin, map_store_error, settle};
use crate::domain::{
    ClientId, Collaborator, Contract, ContractDraft, ContractFilter, ContractId, ContractPatch,
    DomainError, NewContract, Role, UserId,
};

/// Creates, lists, filters and updates contracts.
#[derive(Clone)]
pub struct ContractService {
    store: Arc<dyn CrmStore>,
    clock: Arc<dyn Clock>,
}

impl ContractService {
    /// Create a new service over `store`.
    pub fn new(store: Arc<dyn CrmStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Commercial who will own a contract for `client_id`, if the client has one.
    ///
    /// Lets the terminal skip asking for an owner that will be assigned anyway.
    pub async fn owner_for_client(
        &self,
        actor: &Actor,
        client_id: ClientId,
    ) -> Result<Option<Collaborator>, DomainError> {
        policy::authorize(actor, Entity::Contract, Action::Create, Ownership::Unscoped)?;
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = async {
            let client = find_client(uow.as_mut(), client_id).await?;
            match client.commercial_id {
                Some(owner) => uow.find_user(owner).await.map_err(map_store_error),
                None => Ok(None),
            }
        }
        .await;
        settle(uow, outcome).await
    }

    /// Create a contract.
    ///
    /// The owner is the client's commercial when the client has one; only
    /// otherwise is `draft.commercial_id` used, and it must name a commercial.
    pub async fn create(
        &self,
        actor: &Actor,
        draft: ContractDraft,
    ) -> Result<Contract, DomainError> {
        draft
            .validate()
            .map_err(|err| DomainError::invalid_request(err.to_string()))?;
        policy::authorize(actor, Entity::Contract, Action::Create, Ownership::Unscoped)?;

        let mut uow = begin(self.store.as_ref()).await?;
        let now = self.clock.utc();
        let outcome = async {
            let client = find_client(uow.as_mut(), draft.client_id).await?;
            let commercial_id = match client.commercial_id {
                Some(owner) => owner,
                None => {
                    let requested = draft.commercial_id.ok_or_else(|| {
                        DomainError::invalid_request(format!(
                            "client {} has no commercial; one must be supplied",
                            client.id
                        ))
                    })?;
                    ensure_commercial(uow.as_mut(), requested).await?;
                    requested
                }
            };
            let row = NewContract {
                client_id: client.id,
                commercial_id,
                total: draft.total,
                remaining: draft.remaining,
                signed: draft.signed,
                created_at: now,
            };
            uow.insert_contract(&row).await.map_err(map_store_error)
        }
        .await;
        let contract = settle(uow, outcome).await?;
        info!(
            contract_id = %contract.id,
            client_id = %contract.client_id,
            user_id = %actor.user_id,
            "contract created"
        );
        Ok(contract)
    }

    /// Contracts visible to the requesting user.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Contract>, DomainError> {
        let query = ContractQuery {
            commercial: scoped_owner(actor)?,
            ..ContractQuery::default()
        };
        self.query(&query).await
    }

    /// Visible contracts matching `filter`.
    pub async fn filter(
        &self,
        actor: &Actor,
        filter: ContractFilter,
    ) -> Result<Vec<Contract>, DomainError> {
        let commercial = scoped_owner(actor)?;
        let query = match filter {
            ContractFilter::Unsigned => ContractQuery {
                commercial,
                signed: Some(false),
                unpaid_only: false,
            },
            ContractFilter::Signed => ContractQuery {
                commercial,
                signed: Some(true),
                unpaid_only: false,
            },
            ContractFilter::Unpaid => ContractQuery {
                commercial,
                signed: None,
                unpaid_only: true,
            },
        };
        self.query(&query).await
    }

    async fn query(&self, query: &ContractQuery) -> Result<Vec<Contract>, DomainError> {
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = uow.list_contracts(query).await.map_err(map_store_error);
        settle(uow, outcome).await
    }

    /// Apply `patch` to a contract the requesting user may edit.
    pub async fn update(
        &self,
        actor: &Actor,
        id: ContractId,
        patch: ContractPatch,
    ) -> Result<Contract, DomainError> {
        let mut uow = begin(self.store.as_ref()).await?;
        let now = self.clock.utc();
        let outcome = async {
            let mut contract = find_contract(uow.as_mut(), id).await?;
            let ownership = Ownership::of(actor.user_id, Some(contract.commercial_id));
            policy::authorize(actor, Entity::Contract, Action::Update, ownership)?;
            patch
                .apply(&mut contract, now)
                .map_err(|err| DomainError::invalid_request(err.to_string()))?;
            uow.update_contract(&contract)
                .await
                .map_err(map_store_error)?;
            Ok(contract)
        }
        .await;
        let contract = settle(uow, outcome).await?;
        info!(contract_id = %contract.id, user_id = %actor.user_id, "contract updated");
        Ok(contract)
    }

    /// Fetch one visible contract.
    pub async fn get(&self, actor: &Actor, id: ContractId) -> Result<Contract, DomainError> {
        let owner = scoped_owner(actor)?;
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = async {
            let contract = find_contract(uow.as_mut(), id).await?;
            match owner {
                Some(owner) if contract.commercial_id != owner => {
                    Err(DomainError::not_found(format!("contract {id} not found")))
                }
                _ => Ok(contract),
            }
        }
        .await;
        settle(uow, outcome).await
    }
}

fn scoped_owner(actor: &Actor) -> Result<Option<UserId>, DomainError> {
    match policy::listing_scope(actor, Entity::Contract)? {
        VisibilityScope::OwnedBy(owner) => Ok(Some(owner)),
        _ => Ok(None),
    }
}

pub(crate) async fn find_contract(
    uow: &mut dyn UnitOfWork,
    id: ContractId,
) -> Result<Contract, DomainError> {
    uow.find_contract(id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| DomainError::not_found(format!("contract {id} not found")))
}

async fn ensure_commercial(
    uow: &mut dyn UnitOfWork,
    user_id: UserId,
) -> Result<(), DomainError> {
    let user = uow
        .find_user(user_id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| {
            DomainError::invalid_request(format!("collaborator {user_id} does not exist"))
        })?;
    match role_in(uow, &user).await? {
        Some(Role::Commercial) => Ok(()),
        _ => Err(DomainError::invalid_request(format!(
            "collaborator {user_id} is not a commercial"
        ))),
    }
}

#[cfg(test)]
#[path = "contract_service_tests.rs"]
mod tests;
