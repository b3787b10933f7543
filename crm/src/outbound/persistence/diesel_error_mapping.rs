//! Diesel and pool error mapping onto [`StoreError`].

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::StoreError;

use super::pool::PoolError;

/// Map pool errors to connection failures.
pub(crate) fn map_pool_error(error: PoolError) -> StoreError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
        missing @ PoolError::MissingDatabaseUrl => missing.to_string(),
    };
    StoreError::connection(message)
}

/// Map Diesel errors, turning constraint violations into conflicts.
pub(crate) fn map_diesel_error(error: DieselError) -> StoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = ?info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => StoreError::query("record not found"),
        DieselError::QueryBuilderError(_) => StoreError::query("database query error"),
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::UniqueViolation => StoreError::conflict(describe(
                "duplicate value",
                info.constraint_name(),
            )),
            DatabaseErrorKind::ForeignKeyViolation => StoreError::conflict(describe(
                "referenced record",
                info.constraint_name(),
            )),
            DatabaseErrorKind::CheckViolation | DatabaseErrorKind::NotNullViolation => {
                StoreError::conflict(describe("invalid value", info.constraint_name()))
            }
            DatabaseErrorKind::ClosedConnection => {
                StoreError::connection("database connection error")
            }
            _ => StoreError::query("database error"),
        },
        _ => StoreError::query("database error"),
    }
}

fn describe(what: &str, constraint: Option<&str>) -> String {
    match constraint {
        Some(name) => format!("{what} ({name})"),
        None => what.to_owned(),
    }
}
