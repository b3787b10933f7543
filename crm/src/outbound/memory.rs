//! In-memory implementation of the storage ports.
//!
//! Each unit of work copies the tables on `begin` and swaps its copy back on
//! `commit`, so uncommitted writes are invisible and rollback is a drop. The
//! constraints mirror the SQL schema: unique names, emails, usernames and
//! employee numbers, detach-on-delete for clients and events, and a
//! restriction on deleting users that still own contracts.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    ClientQuery, ContractQuery, CrmStore, EventQuery, StoreError, SupportFilter, UnitOfWork,
};
use crate::domain::{
    Client, ClientId, Collaborator, Contract, ContractId, Department, DepartmentId, Event,
    EventId, NewClient, NewCollaborator, NewContract, NewDepartment, NewEvent, UserId,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Tables {
    departments: BTreeMap<DepartmentId, Department>,
    users: BTreeMap<UserId, Collaborator>,
    clients: BTreeMap<ClientId, Client>,
    contracts: BTreeMap<ContractId, Contract>,
    events: BTreeMap<EventId, Event>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

/// Committed contents at one point in time, comparable for equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot(Tables);

/// Shared in-memory store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCrmStore {
    tables: Arc<Mutex<Tables>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryCrmStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail with a connection error.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Copy of every committed row.
    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        Ok(StoreSnapshot(lock(&self.tables)?.clone()))
    }

    /// Number of committed rows per table: departments, users, clients,
    /// contracts, events.
    pub fn row_counts(&self) -> Result<[usize; 5], StoreError> {
        let tables = lock(&self.tables)?;
        Ok([
            tables.departments.len(),
            tables.users.len(),
            tables.clients.len(),
            tables.contracts.len(),
            tables.events.len(),
        ])
    }
}

fn lock(tables: &Mutex<Tables>) -> Result<MutexGuard<'_, Tables>, StoreError> {
    tables
        .lock()
        .map_err(|_| StoreError::connection("in-memory store lock poisoned"))
}

#[async_trait]
impl CrmStore for InMemoryCrmStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let working = lock(&self.tables)?.clone();
        Ok(Box::new(InMemoryUnitOfWork {
            working,
            target: Arc::clone(&self.tables),
            fail_commit: Arc::clone(&self.fail_next_commit),
        }))
    }
}

struct InMemoryUnitOfWork {
    working: Tables,
    target: Arc<Mutex<Tables>>,
    fail_commit: Arc<AtomicBool>,
}

fn conflict(what: &str, value: &str) -> StoreError {
    StoreError::conflict(format!("{what} '{value}' already exists"))
}

fn missing(what: &str, id: i32) -> StoreError {
    StoreError::query(format!("{what} {id} does not exist"))
}

impl InMemoryUnitOfWork {
    fn check_user_unique(&self, user: &Collaborator) -> Result<(), StoreError> {
        for other in self.working.users.values().filter(|other| other.id != user.id) {
            if other.username == user.username {
                return Err(conflict("username", &user.username));
            }
            if other.email == user.email {
                return Err(conflict("email", &user.email));
            }
            if other.employee_number == user.employee_number {
                return Err(conflict("employee number", &user.employee_number));
            }
        }
        if let Some(department) = user.department_id {
            if !self.working.departments.contains_key(&department) {
                return Err(StoreError::conflict(format!(
                    "department {department} does not exist"
                )));
            }
        }
        Ok(())
    }

    fn check_client(&self, client: &Client) -> Result<(), StoreError> {
        if self
            .working
            .clients
            .values()
            .any(|other| other.id != client.id && other.email == client.email)
        {
            return Err(conflict("client email", &client.email));
        }
        if let Some(owner) = client.commercial_id {
            if !self.working.users.contains_key(&owner) {
                return Err(StoreError::conflict(format!("user {owner} does not exist")));
            }
        }
        Ok(())
    }

    fn check_contract(&self, contract: &Contract) -> Result<(), StoreError> {
        if !self.working.clients.contains_key(&contract.client_id) {
            return Err(StoreError::conflict(format!(
                "client {} does not exist",
                contract.client_id
            )));
        }
        if !self.working.users.contains_key(&contract.commercial_id) {
            return Err(StoreError::conflict(format!(
                "user {} does not exist",
                contract.commercial_id
            )));
        }
        if contract.remaining > contract.total {
            return Err(StoreError::conflict("remaining amount exceeds total"));
        }
        Ok(())
    }

    fn check_event(&self, event: &Event) -> Result<(), StoreError> {
        if !self.working.contracts.contains_key(&event.contract_id) {
            return Err(StoreError::conflict(format!(
                "contract {} does not exist",
                event.contract_id
            )));
        }
        if let Some(support) = event.support_id {
            if !self.working.users.contains_key(&support) {
                return Err(StoreError::conflict(format!("user {support} does not exist")));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn find_department(
        &mut self,
        id: DepartmentId,
    ) -> Result<Option<Department>, StoreError> {
        Ok(self.working.departments.get(&id).cloned())
    }

    async fn find_department_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<Department>, StoreError> {
        Ok(self
            .working
            .departments
            .values()
            .find(|department| department.name == name)
            .cloned())
    }

    async fn insert_department(
        &mut self,
        department: &NewDepartment,
    ) -> Result<Department, StoreError> {
        if self
            .working
            .departments
            .values()
            .any(|existing| existing.name == department.name)
        {
            return Err(conflict("department", &department.name));
        }
        let row = Department {
            id: DepartmentId::new(self.working.next_id()),
            name: department.name.clone(),
            description: department.description.clone(),
        };
        self.working.departments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_user(&mut self, id: UserId) -> Result<Option<Collaborator>, StoreError> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn find_user_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Collaborator>, StoreError> {
        Ok(self
            .working
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_user_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<Collaborator>, StoreError> {
        Ok(self
            .working
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn employee_number_taken(&mut self, employee_number: &str) -> Result<bool, StoreError> {
        Ok(self
            .working
            .users
            .values()
            .any(|user| user.employee_number == employee_number))
    }

    async fn list_users(
        &mut self,
        department: Option<DepartmentId>,
    ) -> Result<Vec<Collaborator>, StoreError> {
        Ok(self
            .working
            .users
            .values()
            .filter(|user| department.is_none() || user.department_id == department)
            .cloned()
            .collect())
    }

    async fn insert_user(&mut self, user: &NewCollaborator) -> Result<Collaborator, StoreError> {
        let row = Collaborator {
            id: UserId::new(self.working.next_id()),
            employee_number: user.employee_number.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            department_id: user.department_id,
        };
        self.check_user_unique(&row)?;
        self.working.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_user(&mut self, user: &Collaborator) -> Result<(), StoreError> {
        if !self.working.users.contains_key(&user.id) {
            return Err(missing("user", user.id.get()));
        }
        self.check_user_unique(user)?;
        self.working.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&mut self, id: UserId) -> Result<bool, StoreError> {
        if !self.working.users.contains_key(&id) {
            return Ok(false);
        }
        if self
            .working
            .contracts
            .values()
            .any(|contract| contract.commercial_id == id)
        {
            return Err(StoreError::conflict(format!(
                "user {id} still owns contracts"
            )));
        }
        self.working.users.remove(&id);
        for client in self.working.clients.values_mut() {
            if client.commercial_id == Some(id) {
                client.commercial_id = None;
            }
        }
        for event in self.working.events.values_mut() {
            if event.support_id == Some(id) {
                event.support_id = None;
            }
        }
        Ok(true)
    }

    async fn find_client(&mut self, id: ClientId) -> Result<Option<Client>, StoreError> {
        Ok(self.working.clients.get(&id).cloned())
    }

    async fn find_client_by_email(&mut self, email: &str) -> Result<Option<Client>, StoreError> {
        Ok(self
            .working
            .clients
            .values()
            .find(|client| client.email == email)
            .cloned())
    }

    async fn list_clients(&mut self, query: &ClientQuery) -> Result<Vec<Client>, StoreError> {
        let needle = query.name_contains.as_deref().map(str::to_lowercase);
        Ok(self
            .working
            .clients
            .values()
            .filter(|client| {
                query
                    .commercial
                    .is_none_or(|owner| client.commercial_id == Some(owner))
            })
            .filter(|client| {
                needle
                    .as_deref()
                    .is_none_or(|needle| client.name.to_lowercase().contains(needle))
            })
            .cloned()
            .collect())
    }

    async fn insert_client(&mut self, client: &NewClient) -> Result<Client, StoreError> {
        let row = Client {
            id: ClientId::new(self.working.next_id()),
            name: client.name.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
            company_name: client.company_name.clone(),
            commercial_id: Some(client.commercial_id),
            created_at: client.created_at,
            last_updated_at: client.created_at,
        };
        self.check_client(&row)?;
        self.working.clients.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_client(&mut self, client: &Client) -> Result<(), StoreError> {
        if !self.working.clients.contains_key(&client.id) {
            return Err(missing("client", client.id.get()));
        }
        self.check_client(client)?;
        self.working.clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn find_contract(&mut self, id: ContractId) -> Result<Option<Contract>, StoreError> {
        Ok(self.working.contracts.get(&id).cloned())
    }

    async fn list_contracts(
        &mut self,
        query: &ContractQuery,
    ) -> Result<Vec<Contract>, StoreError> {
        Ok(self
            .working
            .contracts
            .values()
            .filter(|contract| {
                query
                    .commercial
                    .is_none_or(|owner| contract.commercial_id == owner)
            })
            .filter(|contract| query.signed.is_none_or(|signed| contract.signed == signed))
            .filter(|contract| !query.unpaid_only || contract.is_unpaid())
            .cloned()
            .collect())
    }

    async fn insert_contract(&mut self, contract: &NewContract) -> Result<Contract, StoreError> {
        let row = Contract {
            id: ContractId::new(self.working.next_id()),
            client_id: contract.client_id,
            commercial_id: contract.commercial_id,
            total: contract.total,
            remaining: contract.remaining,
            signed: contract.signed,
            created_at: contract.created_at,
            last_updated_at: contract.created_at,
        };
        self.check_contract(&row)?;
        self.working.contracts.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_contract(&mut self, contract: &Contract) -> Result<(), StoreError> {
        if !self.working.contracts.contains_key(&contract.id) {
            return Err(missing("contract", contract.id.get()));
        }
        self.check_contract(contract)?;
        self.working.contracts.insert(contract.id, contract.clone());
        Ok(())
    }

    async fn find_event(&mut self, id: EventId) -> Result<Option<Event>, StoreError> {
        Ok(self.working.events.get(&id).cloned())
    }

    async fn list_events(&mut self, query: &EventQuery) -> Result<Vec<Event>, StoreError> {
        let mut events: Vec<Event> = self
            .working
            .events
            .values()
            .filter(|event| match query.support {
                SupportFilter::Any => true,
                SupportFilter::AssignedTo(user) => event.support_id == Some(user),
                SupportFilter::Unassigned => event.support_id.is_none(),
            })
            .cloned()
            .collect();
        events.sort_by_key(|event| (event.starts_at, event.id));
        Ok(events)
    }

    async fn insert_event(&mut self, event: &NewEvent) -> Result<Event, StoreError> {
        let row = Event {
            id: EventId::new(self.working.next_id()),
            name: event.name.clone(),
            contract_id: event.contract_id,
            support_id: None,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            location: event.location.clone(),
            attendees: event.attendees,
            notes: event.notes.clone(),
            created_at: event.created_at,
            last_updated_at: event.created_at,
        };
        self.check_event(&row)?;
        self.working.events.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_event(&mut self, event: &Event) -> Result<(), StoreError> {
        if !self.working.events.contains_key(&event.id) {
            return Err(missing("event", event.id.get()));
        }
        self.check_event(event)?;
        self.working.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if self.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::connection("simulated commit failure"));
        }
        let Self {
            working, target, ..
        } = *self;
        *lock(&target)? = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
