//! PostgreSQL-backed `CrmStore` implementation using Diesel ORM.
//!
//! Every unit of work owns one pooled connection with an open transaction.
//! A unit dropped without `commit` or `rollback` leaves its connection in a
//! broken transaction state, and the pool discards it on return.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};

use crate::domain::ports::{
    ClientQuery, ContractQuery, CrmStore, EventQuery, StoreError, SupportFilter, UnitOfWork,
};
use crate::domain::{
    Client, ClientId, Collaborator, Contract, ContractId, Department, DepartmentId, Event,
    EventId, NewClient, NewCollaborator, NewContract, NewDepartment, NewEvent, UserId,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    ClientColumns, ClientRow, ContractColumns, ContractRow, DepartmentRow, EventColumns,
    EventRow, NewDepartmentRow, UserColumns, UserRow, attendees_column,
};
use super::pool::{DbPool, OwnedConnection};
use super::schema::{clients, contracts, departments, events, users};

/// Diesel-backed implementation of the storage port.
#[derive(Clone)]
pub struct DieselCrmStore {
    pool: DbPool,
}

impl DieselCrmStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrmStore for DieselCrmStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let mut conn = self.pool.get_owned().await.map_err(map_pool_error)?;
        AnsiTransactionManager::begin_transaction(&mut *conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Box::new(DieselUnitOfWork { conn }))
    }
}

struct DieselUnitOfWork {
    conn: OwnedConnection,
}

impl DieselUnitOfWork {
    fn conn(&mut self) -> &mut AsyncPgConnection {
        &mut self.conn
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('%');
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn expect_one_row(updated: usize, what: &str, id: i32) -> Result<(), StoreError> {
    if updated == 0 {
        return Err(StoreError::query(format!("{what} {id} does not exist")));
    }
    Ok(())
}

fn user_columns(user: &NewCollaborator) -> UserColumns<'_> {
    UserColumns {
        employee_number: &user.employee_number,
        name: &user.name,
        email: &user.email,
        username: &user.username,
        password_hash: &user.password_hash,
        department_id: user.department_id.map(DepartmentId::get),
    }
}

fn contract_columns(contract: &Contract) -> ContractColumns {
    ContractColumns {
        client_id: contract.client_id.get(),
        commercial_id: contract.commercial_id.get(),
        total_cents: contract.total.cents(),
        remaining_cents: contract.remaining.cents(),
        signed: contract.signed,
        created_at: contract.created_at,
        last_updated_at: contract.last_updated_at,
    }
}

fn event_columns(event: &Event) -> Result<EventColumns<'_>, StoreError> {
    Ok(EventColumns {
        name: &event.name,
        contract_id: event.contract_id.get(),
        support_id: event.support_id.map(UserId::get),
        starts_at: event.starts_at,
        ends_at: event.ends_at,
        location: &event.location,
        attendees: attendees_column(event.attendees)?,
        notes: event.notes.as_deref(),
        created_at: event.created_at,
        last_updated_at: event.last_updated_at,
    })
}

#[async_trait]
impl UnitOfWork for DieselUnitOfWork {
    async fn find_department(
        &mut self,
        id: DepartmentId,
    ) -> Result<Option<Department>, StoreError> {
        let row: Option<DepartmentRow> = departments::table
            .find(id.get())
            .select(DepartmentRow::as_select())
            .first(self.conn())
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Department::from))
    }

    async fn find_department_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<Department>, StoreError> {
        let row: Option<DepartmentRow> = departments::table
            .filter(departments::name.eq(name))
            .select(DepartmentRow::as_select())
            .first(self.conn())
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Department::from))
    }

    async fn insert_department(
        &mut self,
        department: &NewDepartment,
    ) -> Result<Department, StoreError> {
        let row: DepartmentRow = diesel::insert_into(departments::table)
            .values(&NewDepartmentRow {
                name: &department.name,
                description: department.description.as_deref(),
            })
            .returning(DepartmentRow::as_returning())
            .get_result(self.conn())
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn find_user(&mut self, id: UserId) -> Result<Option<Collaborator>, StoreError> {
        let row: Option<UserRow> = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(self.conn())
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Collaborator::from))
    }

    async fn find_user_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Collaborator>, StoreError> {
        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(self.conn())
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Collaborator::from))
    }

    async fn find_user_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<Collaborator>, StoreError> {
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(self.conn())
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Collaborator::from))
    }

    async fn employee_number_taken(&mut self, employee_number: &str) -> Result<bool, StoreError> {
        diesel::select(exists(
            users::table.filter(users::employee_number.eq(employee_number)),
        ))
        .get_result(self.conn())
        .await
        .map_err(map_diesel_error)
    }

    async fn list_users(
        &mut self,
        department: Option<DepartmentId>,
    ) -> Result<Vec<Collaborator>, StoreError> {
        let mut query = users::table
            .select(UserRow::as_select())
            .order_by(users::id)
            .into_boxed();
        if let Some(department) = department {
            query = query.filter(users::department_id.eq(department.get()));
        }
        let rows: Vec<UserRow> = query.load(self.conn()).await.map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Collaborator::from).collect())
    }

    async fn insert_user(&mut self, user: &NewCollaborator) -> Result<Collaborator, StoreError> {
        let row: UserRow = diesel::insert_into(users::table)
            .values(&user_columns(user))
            .returning(UserRow::as_returning())
            .get_result(self.conn())
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn update_user(&mut self, user: &Collaborator) -> Result<(), StoreError> {
        let columns = UserColumns {
            employee_number: &user.employee_number,
            name: &user.name,
            email: &user.email,
            username: &user.username,
            password_hash: &user.password_hash,
            department_id: user.department_id.map(DepartmentId::get),
        };
        let updated = diesel::update(users::table.find(user.id.get()))
            .set(&columns)
            .execute(self.conn())
            .await
            .map_err(map_diesel_error)?;
        expect_one_row(updated, "user", user.id.get())
    }

    async fn delete_user(&mut self, id: UserId) -> Result<bool, StoreError> {
        let owns_contracts: bool = diesel::select(exists(
            contracts::table.filter(contracts::commercial_id.eq(id.get())),
        ))
        .get_result(self.conn())
        .await
        .map_err(map_diesel_error)?;
        if owns_contracts {
            return Err(StoreError::conflict(format!("user {id} still owns contracts")));
        }
        // Clients and events are detached by ON DELETE SET NULL.
        let deleted = diesel::delete(users::table.find(id.get()))
            .execute(self.conn())
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn find_client(&mut self, id: ClientId) -> Result<Option<Client>, StoreError> {
        let row: Option<ClientRow> = clients::table
            .find(id.get())
            .select(ClientRow::as_select())
            .first(self.conn())
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Client::from))
    }

    async fn find_client_by_email(&mut self, email: &str) -> Result<Option<Client>, StoreError> {
        let row: Option<ClientRow> = clients::table
            .filter(clients::email.eq(email))
            .select(ClientRow::as_select())
            .first(self.conn())
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Client::from))
    }

    async fn list_clients(&mut self, query: &ClientQuery) -> Result<Vec<Client>, StoreError> {
        let mut statement = clients::table
            .select(ClientRow::as_select())
            .order_by(clients::id)
            .into_boxed();
        if let Some(owner) = query.commercial {
            statement = statement.filter(clients::commercial_id.eq(owner.get()));
        }
        if let Some(fragment) = &query.name_contains {
            statement = statement.filter(clients::name.ilike(escape_like(fragment)));
        }
        let rows: Vec<ClientRow> = statement.load(self.conn()).await.map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Client::from).collect())
    }

    async fn insert_client(&mut self, client: &NewClient) -> Result<Client, StoreError> {
        let row: ClientRow = diesel::insert_into(clients::table)
            .values(&ClientColumns {
                name: &client.name,
                email: &client.email,
                phone: client.phone.as_deref(),
                company_name: client.company_name.as_deref(),
                commercial_id: Some(client.commercial_id.get()),
                created_at: client.created_at,
                last_updated_at: client.created_at,
            })
            .returning(ClientRow::as_returning())
            .get_result(self.conn())
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn update_client(&mut self, client: &Client) -> Result<(), StoreError> {
        let updated = diesel::update(clients::table.find(client.id.get()))
            .set(&ClientColumns {
                name: &client.name,
                email: &client.email,
                phone: client.phone.as_deref(),
                company_name: client.company_name.as_deref(),
                commercial_id: client.commercial_id.map(UserId::get),
                created_at: client.created_at,
                last_updated_at: client.last_updated_at,
            })
            .execute(self.conn())
            .await
            .map_err(map_diesel_error)?;
        expect_one_row(updated, "client", client.id.get())
    }

    async fn find_contract(&mut self, id: ContractId) -> Result<Option<Contract>, StoreError> {
        let row: Option<ContractRow> = contracts::table
            .find(id.get())
            .select(ContractRow::as_select())
            .first(self.conn())
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Contract::try_from).transpose()
    }

    async fn list_contracts(
        &mut self,
        query: &ContractQuery,
    ) -> Result<Vec<Contract>, StoreError> {
        let mut statement = contracts::table
            .select(ContractRow::as_select())
            .order_by(contracts::id)
            .into_boxed();
        if let Some(owner) = query.commercial {
            statement = statement.filter(contracts::commercial_id.eq(owner.get()));
        }
        if let Some(signed) = query.signed {
            statement = statement.filter(contracts::signed.eq(signed));
        }
        if query.unpaid_only {
            statement = statement.filter(contracts::remaining_cents.gt(0));
        }
        let rows: Vec<ContractRow> = statement.load(self.conn()).await.map_err(map_diesel_error)?;
        rows.into_iter().map(Contract::try_from).collect()
    }

    async fn insert_contract(&mut self, contract: &NewContract) -> Result<Contract, StoreError> {
        let row: ContractRow = diesel::insert_into(contracts::table)
            .values(&ContractColumns {
                client_id: contract.client_id.get(),
                commercial_id: contract.commercial_id.get(),
                total_cents: contract.total.cents(),
                remaining_cents: contract.remaining.cents(),
                signed: contract.signed,
                created_at: contract.created_at,
                last_updated_at: contract.created_at,
            })
            .returning(ContractRow::as_returning())
            .get_result(self.conn())
            .await
            .map_err(map_diesel_error)?;
        row.try_into()
    }

    async fn update_contract(&mut self, contract: &Contract) -> Result<(), StoreError> {
        let updated = diesel::update(contracts::table.find(contract.id.get()))
            .set(&contract_columns(contract))
            .execute(self.conn())
            .await
            .map_err(map_diesel_error)?;
        expect_one_row(updated, "contract", contract.id.get())
    }

    async fn find_event(&mut self, id: EventId) -> Result<Option<Event>, StoreError> {
        let row: Option<EventRow> = events::table
            .find(id.get())
            .select(EventRow::as_select())
            .first(self.conn())
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Event::try_from).transpose()
    }

    async fn list_events(&mut self, query: &EventQuery) -> Result<Vec<Event>, StoreError> {
        let mut statement = events::table
            .select(EventRow::as_select())
            .order_by((events::starts_at, events::id))
            .into_boxed();
        statement = match query.support {
            SupportFilter::Any => statement,
            SupportFilter::AssignedTo(user) => {
                statement.filter(events::support_id.eq(user.get()))
            }
            SupportFilter::Unassigned => statement.filter(events::support_id.is_null()),
        };
        let rows: Vec<EventRow> = statement.load(self.conn()).await.map_err(map_diesel_error)?;
        rows.into_iter().map(Event::try_from).collect()
    }

    async fn insert_event(&mut self, event: &NewEvent) -> Result<Event, StoreError> {
        let row: EventRow = diesel::insert_into(events::table)
            .values(&EventColumns {
                name: &event.name,
                contract_id: event.contract_id.get(),
                support_id: None,
                starts_at: event.starts_at,
                ends_at: event.ends_at,
                location: &event.location,
                attendees: attendees_column(event.attendees)?,
                notes: event.notes.as_deref(),
                created_at: event.created_at,
                last_updated_at: event.created_at,
            })
            .returning(EventRow::as_returning())
            .get_result(self.conn())
            .await
            .map_err(map_diesel_error)?;
        row.try_into()
    }

    async fn update_event(&mut self, event: &Event) -> Result<(), StoreError> {
        let columns = event_columns(event)?;
        let updated = diesel::update(events::table.find(event.id.get()))
            .set(&columns)
            .execute(self.conn())
            .await
            .map_err(map_diesel_error)?;
        expect_one_row(updated, "event", event.id.get())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut this = self;
        AnsiTransactionManager::commit_transaction(this.conn())
            .await
            .map_err(map_diesel_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let mut this = self;
        AnsiTransactionManager::rollback_transaction(this.conn())
            .await
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("kev", "%kev%")]
    #[case("50%_off", "%50\\%\\_off%")]
    #[case("a\\b", "%a\\\\b%")]
    fn like_patterns_escape_wildcards(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(escape_like(raw), expected);
    }

    #[rstest]
    fn zero_updated_rows_is_a_query_error() {
        assert_eq!(
            expect_one_row(0, "client", 7),
            Err(StoreError::query("client 7 does not exist"))
        );
        assert_eq!(expect_one_row(1, "client", 7), Ok(()));
    }
}
