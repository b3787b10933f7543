//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. `diesel print-schema`
//! regenerates them from a migrated database.

diesel::table! {
    /// Staff departments; the name doubles as the role.
    departments (id) {
        id -> Int4,
        name -> Varchar,
        description -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Staff accounts.
    users (id) {
        id -> Int4,
        employee_number -> Varchar,
        name -> Varchar,
        email -> Varchar,
        username -> Varchar,
        password_hash -> Varchar,
        /// Cleared when the department row is removed.
        department_id -> Nullable<Int4>,
    }
}

diesel::table! {
    clients (id) {
        id -> Int4,
        name -> Varchar,
        email -> Varchar,
        phone -> Nullable<Varchar>,
        company_name -> Nullable<Varchar>,
        commercial_id -> Nullable<Int4>,
        created_at -> Timestamptz,
        last_updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Amounts are stored in cents.
    contracts (id) {
        id -> Int4,
        client_id -> Int4,
        commercial_id -> Int4,
        total_cents -> Int8,
        remaining_cents -> Int8,
        signed -> Bool,
        created_at -> Timestamptz,
        last_updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Event start and end are local wall-clock times.
    events (id) {
        id -> Int4,
        name -> Varchar,
        contract_id -> Int4,
        support_id -> Nullable<Int4>,
        starts_at -> Timestamp,
        ends_at -> Timestamp,
        location -> Text,
        attendees -> Int4,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
        last_updated_at -> Timestamptz,
    }
}

diesel::joinable!(users -> departments (department_id));
diesel::joinable!(clients -> users (commercial_id));
diesel::joinable!(contracts -> clients (client_id));
diesel::joinable!(events -> contracts (contract_id));

diesel::allow_tables_to_appear_in_same_query!(departments, users, clients, contracts, events);
