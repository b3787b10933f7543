//! Staff account management (gestion only).

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::policy::{self, Action, Actor, Entity, Ownership};
use crate::domain::ports::{CrmStore, PasswordHashError, PasswordHasher, UnitOfWork};
use crate::domain::unit_of_work::{begin, map_store_error, settle};
use crate::domain::{
    Collaborator, CollaboratorDraft, CollaboratorPatch, Department, DomainError, NewCollaborator,
    Role, UserId, employee_number_from,
};

const EMPLOYEE_NUMBER_ATTEMPTS: usize = 8;

/// Creates, lists, updates and deletes collaborators.
#[derive(Clone)]
pub struct CollaboratorService {
    store: Arc<dyn CrmStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl CollaboratorService {
    /// Create a new service over `store`, hashing passwords with `hasher`.
    pub fn new(store: Arc<dyn CrmStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// Create a collaborator in the named department.
    pub async fn create(
        &self,
        actor: &Actor,
        draft: CollaboratorDraft,
    ) -> Result<Collaborator, DomainError> {
        draft
            .validate()
            .map_err(|err| DomainError::invalid_request(err.to_string()))?;
        policy::authorize(actor, Entity::Collaborator, Action::Create, Ownership::Unscoped)?;

        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = async {
            let department = find_department(uow.as_mut(), &draft.department).await?;
            let username = draft.username.trim();
            let email = draft.email.trim();
            ensure_identity_free(uow.as_mut(), username, email, None).await?;
            let password_hash = self.hasher.hash(&draft.password).map_err(map_hash_error)?;
            let employee_number = fresh_employee_number(uow.as_mut()).await?;
            let row = NewCollaborator {
                employee_number,
                name: draft.name.trim().to_owned(),
                email: email.to_owned(),
                username: username.to_owned(),
                password_hash,
                department_id: Some(department.id),
            };
            uow.insert_user(&row).await.map_err(map_store_error)
        }
        .await;
        let user = settle(uow, outcome).await?;
        info!(
            collaborator_id = %user.id,
            employee_number = %user.employee_number,
            user_id = %actor.user_id,
            "collaborator created"
        );
        Ok(user)
    }

    /// Every collaborator.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Collaborator>, DomainError> {
        policy::listing_scope(actor, Entity::Collaborator)?;
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = uow.list_users(None).await.map_err(map_store_error);
        settle(uow, outcome).await
    }

    /// Department of every collaborator, for display next to the listing.
    pub async fn departments(&self, actor: &Actor) -> Result<Vec<Department>, DomainError> {
        policy::listing_scope(actor, Entity::Collaborator)?;
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = async {
            let mut departments = Vec::new();
            for role in Role::ALL {
                if let Some(department) = uow
                    .find_department_by_name(role.as_str())
                    .await
                    .map_err(map_store_error)?
                {
                    departments.push(department);
                }
            }
            Ok(departments)
        }
        .await;
        settle(uow, outcome).await
    }

    /// Fetch one collaborator.
    pub async fn get(&self, actor: &Actor, id: UserId) -> Result<Collaborator, DomainError> {
        policy::listing_scope(actor, Entity::Collaborator)?;
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = find_user(uow.as_mut(), id).await;
        settle(uow, outcome).await
    }

    /// Apply `patch`; the department is re-resolved by name and a password
    /// is re-hashed when supplied.
    pub async fn update(
        &self,
        actor: &Actor,
        id: UserId,
        patch: CollaboratorPatch,
    ) -> Result<Collaborator, DomainError> {
        patch
            .validate()
            .map_err(|err| DomainError::invalid_request(err.to_string()))?;
        policy::authorize(actor, Entity::Collaborator, Action::Update, Ownership::Unscoped)?;

        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = async {
            let mut user = find_user(uow.as_mut(), id).await?;
            patch.apply_profile(&mut user);
            ensure_identity_free(uow.as_mut(), &user.username, &user.email, Some(id)).await?;
            if let Some(name) = &patch.department {
                user.department_id = Some(find_department(uow.as_mut(), name).await?.id);
            }
            if let Some(password) = &patch.password {
                user.password_hash = self.hasher.hash(password).map_err(map_hash_error)?;
            }
            uow.update_user(&user).await.map_err(map_store_error)?;
            Ok(user)
        }
        .await;
        let user = settle(uow, outcome).await?;
        info!(collaborator_id = %user.id, user_id = %actor.user_id, "collaborator updated");
        Ok(user)
    }

    /// Delete a collaborator. Clients and events referencing them are
    /// detached; a collaborator still owning contracts cannot be deleted.
    pub async fn delete(&self, actor: &Actor, id: UserId) -> Result<Collaborator, DomainError> {
        policy::authorize(actor, Entity::Collaborator, Action::Delete, Ownership::Unscoped)?;
        if id == actor.user_id {
            return Err(DomainError::invalid_request("you cannot delete your own account"));
        }

        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = async {
            let user = find_user(uow.as_mut(), id).await?;
            if !uow.delete_user(id).await.map_err(map_store_error)? {
                return Err(DomainError::not_found(format!("collaborator {id} not found")));
            }
            Ok(user)
        }
        .await;
        let user = settle(uow, outcome).await?;
        info!(collaborator_id = %user.id, user_id = %actor.user_id, "collaborator deleted");
        Ok(user)
    }
}

fn map_hash_error(error: PasswordHashError) -> DomainError {
    DomainError::internal(error.to_string())
}

async fn find_user(uow: &mut dyn UnitOfWork, id: UserId) -> Result<Collaborator, DomainError> {
    uow.find_user(id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| DomainError::not_found(format!("collaborator {id} not found")))
}

async fn find_department(uow: &mut dyn UnitOfWork, name: &str) -> Result<Department, DomainError> {
    let name = name.trim().to_lowercase();
    uow.find_department_by_name(&name)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| DomainError::invalid_request(format!("department '{name}' does not exist")))
}

async fn ensure_identity_free(
    uow: &mut dyn UnitOfWork,
    username: &str,
    email: &str,
    current: Option<UserId>,
) -> Result<(), DomainError> {
    let by_username = uow
        .find_user_by_username(username)
        .await
        .map_err(map_store_error)?;
    if by_username.is_some_and(|other| Some(other.id) != current) {
        return Err(DomainError::invalid_request(format!(
            "username '{username}' is already taken"
        )));
    }
    let by_email = uow.find_user_by_email(email).await.map_err(map_store_error)?;
    if by_email.is_some_and(|other| Some(other.id) != current) {
        return Err(DomainError::invalid_request(format!(
            "email '{email}' is already in use"
        )));
    }
    Ok(())
}

async fn fresh_employee_number(uow: &mut dyn UnitOfWork) -> Result<String, DomainError> {
    for _ in 0..EMPLOYEE_NUMBER_ATTEMPTS {
        let candidate = employee_number_from(&Uuid::new_v4().simple().to_string());
        if !uow
            .employee_number_taken(&candidate)
            .await
            .map_err(map_store_error)?
        {
            return Ok(candidate);
        }
    }
    Err(DomainError::internal("could not allocate a unique employee number"))
}

#[cfg(test)]
#[path = "collaborator_service_tests.rs"]
mod tests;
