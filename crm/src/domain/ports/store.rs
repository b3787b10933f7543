//! Port for transactional CRM storage.
//!
//! Services never hold a connection. Each operation calls
//! [`CrmStore::begin`], works through the returned [`UnitOfWork`] and ends it
//! with [`UnitOfWork::commit`] or [`UnitOfWork::rollback`]. Nothing written
//! through a unit of work is visible to other units until it commits.

use async_trait::async_trait;

use crate::domain::{
    Client, ClientId, Collaborator, Contract, ContractId, Department, DepartmentId, Event,
    EventId, NewClient, NewCollaborator, NewContract, NewDepartment, NewEvent, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by storage adapters.
    pub enum StoreError {
        /// Storage could not be reached.
        Connection { message } => "store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message } => "store query failed: {message}",
        /// A uniqueness or reference constraint rejected the write.
        Conflict { message } => "store constraint violated: {message}",
    }
}

/// Filter for client listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientQuery {
    /// Only clients owned by this commercial.
    pub commercial: Option<UserId>,
    /// Case-insensitive substring of the client name.
    pub name_contains: Option<String>,
}

/// Filter for contract listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractQuery {
    /// Only contracts owned by this commercial.
    pub commercial: Option<UserId>,
    pub signed: Option<bool>,
    /// Only contracts with a remaining balance.
    pub unpaid_only: bool,
}

/// Support-contact filter for event listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SupportFilter {
    #[default]
    Any,
    AssignedTo(UserId),
    Unassigned,
}

/// Filter for event listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub support: SupportFilter,
}

/// Factory for units of work.
#[async_trait]
pub trait CrmStore: Send + Sync {
    /// Open a unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;
}

/// One storage transaction.
///
/// Lookups return `Ok(None)` for missing rows. Updates write every column of
/// the supplied record.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn find_department(
        &mut self,
        id: DepartmentId,
    ) -> Result<Option<Department>, StoreError>;
    async fn find_department_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<Department>, StoreError>;
    async fn insert_department(
        &mut self,
        department: &NewDepartment,
    ) -> Result<Department, StoreError>;

    async fn find_user(&mut self, id: UserId) -> Result<Option<Collaborator>, StoreError>;
    async fn find_user_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Collaborator>, StoreError>;
    async fn find_user_by_email(&mut self, email: &str)
    -> Result<Option<Collaborator>, StoreError>;
    async fn employee_number_taken(&mut self, employee_number: &str) -> Result<bool, StoreError>;
    /// Users ordered by id, optionally restricted to one department.
    async fn list_users(
        &mut self,
        department: Option<DepartmentId>,
    ) -> Result<Vec<Collaborator>, StoreError>;
    async fn insert_user(&mut self, user: &NewCollaborator) -> Result<Collaborator, StoreError>;
    async fn update_user(&mut self, user: &Collaborator) -> Result<(), StoreError>;
    /// Delete a user, detaching the clients and events that reference them.
    ///
    /// Returns `false` when no such user exists. Fails with
    /// [`StoreError::Conflict`] while the user still owns contracts.
    async fn delete_user(&mut self, id: UserId) -> Result<bool, StoreError>;

    async fn find_client(&mut self, id: ClientId) -> Result<Option<Client>, StoreError>;
    async fn find_client_by_email(&mut self, email: &str) -> Result<Option<Client>, StoreError>;
    /// Clients ordered by id.
    async fn list_clients(&mut self, query: &ClientQuery) -> Result<Vec<Client>, StoreError>;
    async fn insert_client(&mut self, client: &NewClient) -> Result<Client, StoreError>;
    async fn update_client(&mut self, client: &Client) -> Result<(), StoreError>;

    async fn find_contract(&mut self, id: ContractId) -> Result<Option<Contract>, StoreError>;
    /// Contracts ordered by id.
    async fn list_contracts(&mut self, query: &ContractQuery)
    -> Result<Vec<Contract>, StoreError>;
    async fn insert_contract(&mut self, contract: &NewContract) -> Result<Contract, StoreError>;
    async fn update_contract(&mut self, contract: &Contract) -> Result<(), StoreError>;

    async fn find_event(&mut self, id: EventId) -> Result<Option<Event>, StoreError>;
    /// Events ordered by start date, then id.
    async fn list_events(&mut self, query: &EventQuery) -> Result<Vec<Event>, StoreError>;
    async fn insert_event(&mut self, event: &NewEvent) -> Result<Event, StoreError>;
    async fn update_event(&mut self, event: &Event) -> Result<(), StoreError>;

    /// Make every write of this unit durable.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    /// Discard every write of this unit.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
