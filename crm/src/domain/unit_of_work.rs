//! Helpers shared by services that run inside a unit of work.

use tracing::error;

use crate::domain::DomainError;
use crate::domain::ports::{CrmStore, StoreError, UnitOfWork};

/// Map a storage failure to a domain error.
///
/// Connection loss becomes [`DomainError::service_unavailable`]; everything else
/// is internal, except constraint violations which surface as invalid input.
pub(crate) fn map_store_error(error: StoreError) -> DomainError {
    match error {
        StoreError::Connection { message } => {
            error!(%message, "store unavailable");
            DomainError::service_unavailable(format!("storage unavailable: {message}"))
        }
        StoreError::Query { message } => {
            error!(%message, "store query failed");
            DomainError::internal(format!("storage error: {message}"))
        }
        StoreError::Conflict { message } => {
            DomainError::invalid_request(format!(
                "the change conflicts with existing records: {message}"
            ))
        }
    }
}

/// Open a unit of work, mapping failures to domain errors.
pub(crate) async fn begin(store: &dyn CrmStore) -> Result<Box<dyn UnitOfWork>, DomainError> {
    store.begin().await.map_err(map_store_error)
}

/// Close `uow`: commit when `outcome` is `Ok`, roll back otherwise.
pub(crate) async fn settle<T>(
    uow: Box<dyn UnitOfWork>,
    outcome: Result<T, DomainError>,
) -> Result<T, DomainError> {
    match outcome {
        Ok(value) => {
            uow.commit().await.map_err(map_store_error)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                error!(error = %rollback_err, "rollback failed");
            }
            if err.is_system() {
                error!(code = err.code().as_str(), message = err.message(), "operation failed");
            }
            Err(err)
        }
    }
}
