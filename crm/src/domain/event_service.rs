//! Event management and support assignment.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::client_service::find_client;
use crate::domain::contract_service::find_contract;
use crate::domain::policy::{self, Action, Actor, Entity, Ownership, VisibilityScope};
use crate::domain::ports::{CrmStore, EventQuery, SupportFilter, UnitOfWork};
use crate::domain::role_resolver::role_in;
use crate::domain::unit_of_work::{begin, map_store_error, settle};
use crate::domain::{
    Collaborator, DomainError, Event, EventDraft, EventId, EventPatch, Role, UserId,
};

/// Creates, lists and updates events, and assigns their support contact.
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn CrmStore>,
    clock: Arc<dyn Clock>,
}

impl EventService {
    /// Create a new service over `store`.
    pub fn new(store: Arc<dyn CrmStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create an event under a signed contract of one of the requester's clients.
    pub async fn create(&self, actor: &Actor, draft: EventDraft) -> Result<Event, DomainError> {
        draft
            .validate()
            .map_err(|err| DomainError::invalid_request(err.to_string()))?;

        let mut uow = begin(self.store.as_ref()).await?;
        let now = self.clock.utc();
        let outcome = async {
            let contract = find_contract(uow.as_mut(), draft.contract_id).await?;
            let client = find_client(uow.as_mut(), contract.client_id).await?;
            let ownership = Ownership::of(actor.user_id, client.commercial_id);
            policy::authorize(actor, Entity::Event, Action::Create, ownership)?;
            if !contract.signed {
                return Err(DomainError::invalid_request(format!(
                    "contract {} is not signed; events need a signed contract",
                    contract.id
                )));
            }
            uow.insert_event(&draft.into_new(now))
                .await
                .map_err(map_store_error)
        }
        .await;
        let event = settle(uow, outcome).await?;
        info!(
            event_id = %event.id,
            contract_id = %event.contract_id,
            user_id = %actor.user_id,
            "event created"
        );
        Ok(event)
    }

    /// Events visible to the requesting user.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Event>, DomainError> {
        let support = match policy::listing_scope(actor, Entity::Event)? {
            VisibilityScope::AssignedTo(user) => SupportFilter::AssignedTo(user),
            _ => SupportFilter::Any,
        };
        self.query(EventQuery { support }).await
    }

    /// Visible events with no support contact.
    pub async fn list_without_support(&self, actor: &Actor) -> Result<Vec<Event>, DomainError> {
        match policy::listing_scope(actor, Entity::Event)? {
            VisibilityScope::AssignedTo(_) => Ok(Vec::new()),
            _ => {
                self.query(EventQuery {
                    support: SupportFilter::Unassigned,
                })
                .await
            }
        }
    }

    async fn query(&self, query: EventQuery) -> Result<Vec<Event>, DomainError> {
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = uow.list_events(&query).await.map_err(map_store_error);
        settle(uow, outcome).await
    }

    /// Apply `patch` to an event the requesting user may edit.
    pub async fn update(
        &self,
        actor: &Actor,
        id: EventId,
        patch: EventPatch,
    ) -> Result<Event, DomainError> {
        let mut uow = begin(self.store.as_ref()).await?;
        let now = self.clock.utc();
        let outcome = async {
            let mut event = find_event(uow.as_mut(), id).await?;
            let ownership = Ownership::of(actor.user_id, event.support_id);
            policy::authorize(actor, Entity::Event, Action::Update, ownership)?;
            patch
                .apply(&mut event, now)
                .map_err(|err| DomainError::invalid_request(err.to_string()))?;
            uow.update_event(&event).await.map_err(map_store_error)?;
            Ok(event)
        }
        .await;
        let event = settle(uow, outcome).await?;
        info!(event_id = %event.id, user_id = %actor.user_id, "event updated");
        Ok(event)
    }

    /// Make `support_id` the support contact of event `id`.
    ///
    /// The target must resolve to the support role; otherwise the event is
    /// left unchanged.
    pub async fn assign_support(
        &self,
        actor: &Actor,
        id: EventId,
        support_id: UserId,
    ) -> Result<Event, DomainError> {
        policy::authorize(actor, Entity::Event, Action::AssignSupport, Ownership::Unscoped)?;

        let mut uow = begin(self.store.as_ref()).await?;
        let now = self.clock.utc();
        let outcome = async {
            let mut event = find_event(uow.as_mut(), id).await?;
            let candidate = uow
                .find_user(support_id)
                .await
                .map_err(map_store_error)?
                .ok_or_else(|| {
                    DomainError::not_found(format!("collaborator {support_id} not found"))
                })?;
            if role_in(uow.as_mut(), &candidate).await? != Some(Role::Support) {
                return Err(DomainError::forbidden(format!(
                    "collaborator {support_id} is not in the support department"
                )));
            }
            event.support_id = Some(candidate.id);
            event.last_updated_at = now;
            uow.update_event(&event).await.map_err(map_store_error)?;
            Ok(event)
        }
        .await;
        let event = settle(uow, outcome).await?;
        info!(
            event_id = %event.id,
            support_id = %support_id,
            user_id = %actor.user_id,
            "support contact assigned"
        );
        Ok(event)
    }

    /// Collaborators who can be assigned to events.
    pub async fn support_staff(&self, actor: &Actor) -> Result<Vec<Collaborator>, DomainError> {
        policy::authorize(actor, Entity::Event, Action::AssignSupport, Ownership::Unscoped)?;
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = async {
            let department = uow
                .find_department_by_name(Role::Support.as_str())
                .await
                .map_err(map_store_error)?;
            match department {
                Some(department) => uow
                    .list_users(Some(department.id))
                    .await
                    .map_err(map_store_error),
                None => Ok(Vec::new()),
            }
        }
        .await;
        settle(uow, outcome).await
    }

    /// Fetch one visible event.
    pub async fn get(&self, actor: &Actor, id: EventId) -> Result<Event, DomainError> {
        let scope = policy::listing_scope(actor, Entity::Event)?;
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = async {
            let event = find_event(uow.as_mut(), id).await?;
            match scope {
                VisibilityScope::AssignedTo(user) if event.support_id != Some(user) => {
                    Err(DomainError::not_found(format!("event {id} not found")))
                }
                _ => Ok(event),
            }
        }
        .await;
        settle(uow, outcome).await
    }
}

async fn find_event(uow: &mut dyn UnitOfWork, id: EventId) -> Result<Event, DomainError> {
    uow.find_event(id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| DomainError::not_found(format!("event {id} not found")))
}

#[cfg(test)]
#[path = "event_service_tests.rs"]
mod tests;
