//! Internal Diesel row structs.
//!
//! These types never leave the persistence adapter. Conversions into domain
//! records live next to the row they read.

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::domain::ports::StoreError;
use crate::domain::{
    Amount, Client, ClientId, Collaborator, Contract, ContractId, Department, DepartmentId,
    Event, EventId, UserId,
};

use super::schema::{clients, contracts, departments, events, users};

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = departments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DepartmentRow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<DepartmentRow> for Department {
    fn from(row: DepartmentRow) -> Self {
        Self {
            id: DepartmentId::new(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = departments)]
pub(crate) struct NewDepartmentRow<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub employee_number: String,
    pub name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub department_id: Option<i32>,
}

impl From<UserRow> for Collaborator {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            employee_number: row.employee_number,
            name: row.name,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            department_id: row.department_id.map(DepartmentId::new),
        }
    }
}

/// Insert and full-row update share the same columns.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserColumns<'a> {
    pub employee_number: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub department_id: Option<i32>,
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = clients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ClientRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub commercial_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Self {
            id: ClientId::new(row.id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            company_name: row.company_name,
            commercial_id: row.commercial_id.map(UserId::new),
            created_at: row.created_at,
            last_updated_at: row.last_updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = clients)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ClientColumns<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub company_name: Option<&'a str>,
    pub commercial_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = contracts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ContractRow {
    pub id: i32,
    pub client_id: i32,
    pub commercial_id: i32,
    pub total_cents: i64,
    pub remaining_cents: i64,
    pub signed: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl TryFrom<ContractRow> for Contract {
    type Error = StoreError;

    fn try_from(row: ContractRow) -> Result<Self, Self::Error> {
        let amount = |cents: i64| {
            Amount::from_cents(cents)
                .map_err(|err| StoreError::query(format!("contract {}: {err}", row.id)))
        };
        Ok(Self {
            id: ContractId::new(row.id),
            client_id: ClientId::new(row.client_id),
            commercial_id: UserId::new(row.commercial_id),
            total: amount(row.total_cents)?,
            remaining: amount(row.remaining_cents)?,
            signed: row.signed,
            created_at: row.created_at,
            last_updated_at: row.last_updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = contracts)]
pub(crate) struct ContractColumns {
    pub client_id: i32,
    pub commercial_id: i32,
    pub total_cents: i64,
    pub remaining_cents: i64,
    pub signed: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EventRow {
    pub id: i32,
    pub name: String,
    pub contract_id: i32,
    pub support_id: Option<i32>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub location: String,
    pub attendees: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let attendees = u32::try_from(row.attendees).map_err(|_| {
            StoreError::query(format!("event {}: negative attendee count", row.id))
        })?;
        Ok(Self {
            id: EventId::new(row.id),
            name: row.name,
            contract_id: ContractId::new(row.contract_id),
            support_id: row.support_id.map(UserId::new),
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            location: row.location,
            attendees,
            notes: row.notes,
            created_at: row.created_at,
            last_updated_at: row.last_updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = events)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct EventColumns<'a> {
    pub name: &'a str,
    pub contract_id: i32,
    pub support_id: Option<i32>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub location: &'a str,
    pub attendees: i32,
    pub notes: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// Convert an attendee count for storage.
pub(crate) fn attendees_column(attendees: u32) -> Result<i32, StoreError> {
    i32::try_from(attendees)
        .map_err(|_| StoreError::query(format!("attendee count {attendees} is too large")))
}
