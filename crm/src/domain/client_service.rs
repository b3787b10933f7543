//! Client management.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::policy::{self, Action, Actor, Entity, Ownership, VisibilityScope};
use crate::domain::ports::{ClientQuery, CrmStore, UnitOfWork};
use crate::domain::unit_of_work::{begin, map_store_error, settle};
use crate::domain::{Client, ClientDraft, ClientId, ClientPatch, DomainError};

/// Creates, lists, searches and updates clients.
#[derive(Clone)]
pub struct ClientService {
    store: Arc<dyn CrmStore>,
    clock: Arc<dyn Clock>,
}

impl ClientService {
    /// Create a new service over `store`.
    pub fn new(store: Arc<dyn CrmStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Register a client owned by the requesting commercial.
    pub async fn create(&self, actor: &Actor, draft: ClientDraft) -> Result<Client, DomainError> {
        draft
            .validate()
            .map_err(|err| DomainError::invalid_request(err.to_string()))?;
        policy::authorize(actor, Entity::Client, Action::Create, Ownership::Unscoped)?;

        let mut uow = begin(self.store.as_ref()).await?;
        let now = self.clock.utc();
        let outcome = async {
            ensure_email_free(uow.as_mut(), &draft.email, None).await?;
            uow.insert_client(&draft.into_new(actor.user_id, now))
                .await
                .map_err(map_store_error)
        }
        .await;
        let client = settle(uow, outcome).await?;
        info!(client_id = %client.id, user_id = %actor.user_id, "client created");
        Ok(client)
    }

    /// Clients visible to the requesting user.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Client>, DomainError> {
        self.query(actor, None).await
    }

    /// Visible clients whose name contains `fragment`, ignoring case.
    pub async fn search(&self, actor: &Actor, fragment: &str) -> Result<Vec<Client>, DomainError> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Err(DomainError::invalid_request("search text must not be empty"));
        }
        self.query(actor, Some(fragment.to_owned())).await
    }

    async fn query(
        &self,
        actor: &Actor,
        name_contains: Option<String>,
    ) -> Result<Vec<Client>, DomainError> {
        let commercial = match policy::listing_scope(actor, Entity::Client)? {
            VisibilityScope::OwnedBy(owner) => Some(owner),
            _ => None,
        };
        let query = ClientQuery {
            commercial,
            name_contains,
        };
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = uow.list_clients(&query).await.map_err(map_store_error);
        settle(uow, outcome).await
    }

    /// Apply `patch` to a client the requesting user may edit.
    pub async fn update(
        &self,
        actor: &Actor,
        id: ClientId,
        patch: ClientPatch,
    ) -> Result<Client, DomainError> {
        patch
            .validate()
            .map_err(|err| DomainError::invalid_request(err.to_string()))?;

        let mut uow = begin(self.store.as_ref()).await?;
        let now = self.clock.utc();
        let outcome = async {
            let mut client = find_client(uow.as_mut(), id).await?;
            let ownership = Ownership::of(actor.user_id, client.commercial_id);
            policy::authorize(actor, Entity::Client, Action::Update, ownership)?;
            if let Some(email) = &patch.email {
                ensure_email_free(uow.as_mut(), email, Some(id)).await?;
            }
            patch.apply(&mut client, now);
            uow.update_client(&client).await.map_err(map_store_error)?;
            Ok(client)
        }
        .await;
        let client = settle(uow, outcome).await?;
        info!(client_id = %client.id, user_id = %actor.user_id, "client updated");
        Ok(client)
    }

    /// Fetch one visible client.
    pub async fn get(&self, actor: &Actor, id: ClientId) -> Result<Client, DomainError> {
        let scope = policy::listing_scope(actor, Entity::Client)?;
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = async {
            let client = find_client(uow.as_mut(), id).await?;
            match scope {
                VisibilityScope::OwnedBy(owner) if client.commercial_id != Some(owner) => {
                    Err(DomainError::not_found(format!("client {id} not found")))
                }
                _ => Ok(client),
            }
        }
        .await;
        settle(uow, outcome).await
    }
}

pub(crate) async fn find_client(
    uow: &mut dyn UnitOfWork,
    id: ClientId,
) -> Result<Client, DomainError> {
    uow.find_client(id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| DomainError::not_found(format!("client {id} not found")))
}

async fn ensure_email_free(
    uow: &mut dyn UnitOfWork,
    email: &str,
    current: Option<ClientId>,
) -> Result<(), DomainError> {
    let existing = uow
        .find_client_by_email(email.trim())
        .await
        .map_err(map_store_error)?;
    match existing {
        Some(other) if Some(other.id) != current => Err(DomainError::invalid_request(format!(
            "a client with email '{}' already exists",
            email.trim()
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "client_service_tests.rs"]
mod tests;
