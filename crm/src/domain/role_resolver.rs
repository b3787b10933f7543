//! Maps an authenticated collaborator to their role.

use std::sync::Arc;

use crate::domain::ports::{CrmStore, UnitOfWork};
use crate::domain::unit_of_work::{begin, map_store_error, settle};
use crate::domain::{Collaborator, DomainError, Role};

/// Resolves a collaborator's role from their department.
#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn CrmStore>,
}

impl RoleResolver {
    /// Create a resolver over `store`.
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    /// Role of `user`, or `None` when the department is missing or unknown.
    ///
    /// Callers must treat `None` as a forced logout.
    pub async fn resolve(&self, user: &Collaborator) -> Result<Option<Role>, DomainError> {
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = role_in(uow.as_mut(), user).await;
        settle(uow, outcome).await
    }
}

/// Resolve a role inside an open unit of work.
pub(crate) async fn role_in(
    uow: &mut dyn UnitOfWork,
    user: &Collaborator,
) -> Result<Option<Role>, DomainError> {
    let Some(department_id) = user.department_id else {
        return Ok(None);
    };
    let department = uow
        .find_department(department_id)
        .await
        .map_err(map_store_error)?;
    Ok(department.and_then(|department| department.role()))
}
