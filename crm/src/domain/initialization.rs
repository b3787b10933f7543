//! Idempotent bootstrap of departments and the first administrator.

use std::sync::Arc;

use tracing::info;
use zeroize::Zeroizing;

use crate::domain::ports::{CrmStore, PasswordHasher};
use crate::domain::unit_of_work::{begin, map_store_error, settle};
use crate::domain::{
    Collaborator, CollaboratorDraft, Department, DomainError, NewCollaborator, NewDepartment, Role,
    employee_number_from,
};

/// Administrator account created by the bootstrap.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: Zeroizing<String>,
}

impl AdminSeed {
    /// Default administrator with the given password.
    pub fn with_password(password: &str) -> Self {
        Self {
            name: "Admin".to_owned(),
            email: "admin@crm.local".to_owned(),
            username: "admin".to_owned(),
            password: Zeroizing::new(password.to_owned()),
        }
    }
}

/// What the bootstrap did.
#[derive(Debug, Clone)]
pub struct InitializationReport {
    /// Each department with `true` when it was created by this run.
    pub departments: Vec<(Department, bool)>,
    /// The administrator with `true` when it was created by this run.
    pub admin: (Collaborator, bool),
}

/// Seeds departments and the administrator.
#[derive(Clone)]
pub struct Initializer {
    store: Arc<dyn CrmStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl Initializer {
    /// Create an initializer over `store`.
    pub fn new(store: Arc<dyn CrmStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// Create whatever is missing. Running twice changes nothing.
    pub async fn run(&self, seed: &AdminSeed) -> Result<InitializationReport, DomainError> {
        CollaboratorDraft {
            name: seed.name.clone(),
            email: seed.email.clone(),
            username: seed.username.clone(),
            password: seed.password.clone(),
            department: Role::Gestion.as_str().to_owned(),
        }
        .validate()
        .map_err(|err| DomainError::invalid_request(format!("invalid administrator seed: {err}")))?;

        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = async {
            let mut departments = Vec::with_capacity(Role::ALL.len());
            for role in Role::ALL {
                let existing = uow
                    .find_department_by_name(role.as_str())
                    .await
                    .map_err(map_store_error)?;
                let entry = match existing {
                    Some(department) => (department, false),
                    None => {
                        let department = uow
                            .insert_department(&NewDepartment::for_role(role))
                            .await
                            .map_err(map_store_error)?;
                        (department, true)
                    }
                };
                departments.push(entry);
            }

            let existing = uow
                .find_user_by_username(&seed.username)
                .await
                .map_err(map_store_error)?;
            let admin = match existing {
                Some(user) => (user, false),
                None => {
                    let gestion = departments
                        .iter()
                        .map(|(department, _)| department)
                        .find(|department| department.role() == Some(Role::Gestion))
                        .map(|department| department.id);
                    let password_hash = self
                        .hasher
                        .hash(&seed.password)
                        .map_err(|err| DomainError::internal(err.to_string()))?;
                    let row = NewCollaborator {
                        employee_number: employee_number_from("00000001"),
                        name: seed.name.clone(),
                        email: seed.email.clone(),
                        username: seed.username.clone(),
                        password_hash,
                        department_id: gestion,
                    };
                    let user = uow.insert_user(&row).await.map_err(map_store_error)?;
                    (user, true)
                }
            };
            Ok(InitializationReport { departments, admin })
        }
        .await;
        let report = settle(uow, outcome).await?;
        for (department, created) in &report.departments {
            info!(department = %department.name, created, "department ready");
        }
        info!(
            username = %report.admin.0.username,
            created = report.admin.1,
            "administrator ready"
        );
        Ok(report)
    }
}
