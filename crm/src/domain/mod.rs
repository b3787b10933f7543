//! Domain primitives, authorization policy and services.
//!
//! Purpose: define the CRM records, the rules deciding who may touch them,
//! and the services that apply those rules inside a unit of work. Nothing in
//! this module performs I/O directly; storage, hashing and token files are
//! reached through [`ports`].
//!
//! Public surface:
//! - DomainError / ErrorCode: typed failure with a stable category.
//! - Role, Department: staff roles derived from department names.
//! - Collaborator, Client, Contract, Event: records with drafts and patches.
//! - policy: `allowed`, `visibility_scope` and `authorize`.
//! - SessionGate, RoleResolver: authentication and role lookup.
//! - CollaboratorService, ClientService, ContractService, EventService.
//! - Initializer: idempotent bootstrap.

pub mod auth;
pub mod client;
pub mod client_service;
pub mod collaborator;
pub mod collaborator_service;
pub mod contract;
pub mod contract_service;
pub mod error;
pub mod event;
pub mod event_service;
pub mod ids;
pub mod initialization;
pub mod money;
pub mod policy;
pub mod ports;
pub mod role;
pub mod role_resolver;
pub mod session_gate;
mod unit_of_work;
pub mod validation;

use std::sync::Arc;

use mockable::Clock;

pub use self::auth::{LoginCredentials, LoginValidationError, SESSION_TTL, SessionClaims};
pub use self::client::{Client, ClientDraft, ClientPatch, ClientValidationError, NewClient};
pub use self::client_service::ClientService;
pub use self::collaborator::{
    Collaborator, CollaboratorDraft, CollaboratorPatch, CollaboratorValidationError,
    NewCollaborator, PASSWORD_MIN, employee_number_from,
};
pub use self::collaborator_service::CollaboratorService;
pub use self::contract::{
    Contract, ContractDraft, ContractFilter, ContractPatch, ContractValidationError, NewContract,
};
pub use self::contract_service::ContractService;
pub use self::error::{DomainError, ErrorCode};
pub use self::event::{
    EVENT_DATE_FORMAT, Event, EventDraft, EventPatch, EventValidationError, NewEvent,
    parse_event_date,
};
pub use self::event_service::EventService;
pub use self::ids::{ClientId, ContractId, DepartmentId, EventId, IdParseError, UserId};
pub use self::initialization::{AdminSeed, InitializationReport, Initializer};
pub use self::money::{Amount, AmountError};
pub use self::policy::{Action, Actor, Entity, Ownership, VisibilityScope};
pub use self::role::{Department, NewDepartment, Role, UnknownRole};
pub use self::role_resolver::RoleResolver;
pub use self::session_gate::SessionGate;

use self::ports::{CrmStore, PasswordHasher};

/// Convenient domain result alias.
pub type DomainResult<T> = Result<T, DomainError>;

/// The four record services, built once over one store.
#[derive(Clone)]
pub struct CrmServices {
    /// Staff accounts.
    pub collaborators: CollaboratorService,
    /// Clients.
    pub clients: ClientService,
    /// Contracts and their filters.
    pub contracts: ContractService,
    /// Events and support assignment.
    pub events: EventService,
}

impl CrmServices {
    /// Wire every service to the same store.
    pub fn new(
        store: Arc<dyn CrmStore>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            collaborators: CollaboratorService::new(Arc::clone(&store), hasher),
            clients: ClientService::new(Arc::clone(&store), Arc::clone(&clock)),
            contracts: ContractService::new(Arc::clone(&store), Arc::clone(&clock)),
            events: EventService::new(store, clock),
        }
    }
}
