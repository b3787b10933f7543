//! Staff accounts ("collaborators").
//!
//! A collaborator's role is never stored on the account itself; it is the
//! name of the department the account references. See
//! [`crate::domain::RoleResolver`].

use std::fmt;

use zeroize::Zeroizing;

use super::validation::{ContactValidationError, validate_email};
use super::{DepartmentId, UserId};

/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 6;

/// Persisted staff account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collaborator {
    pub id: UserId,
    pub employee_number: String,
    pub name: String,
    pub email: String,
    pub username: String,
    /// PHC-formatted password hash; opaque outside the hasher adapter.
    pub password_hash: String,
    pub department_id: Option<DepartmentId>,
}

/// Validation errors returned by [`CollaboratorDraft::validate`] and
/// [`CollaboratorPatch::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorValidationError {
    EmptyName,
    EmptyUsername,
    EmptyDepartment,
    PasswordTooShort { min: usize },
    Contact(ContactValidationError),
}

impl fmt::Display for CollaboratorValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyDepartment => write!(f, "department must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::Contact(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for CollaboratorValidationError {}

impl From<ContactValidationError> for CollaboratorValidationError {
    fn from(value: ContactValidationError) -> Self {
        Self::Contact(value)
    }
}

fn check_password(password: &str) -> Result<(), CollaboratorValidationError> {
    if password.trim().chars().count() < PASSWORD_MIN {
        return Err(CollaboratorValidationError::PasswordTooShort { min: PASSWORD_MIN });
    }
    Ok(())
}

fn check_not_blank(
    value: &str,
    error: CollaboratorValidationError,
) -> Result<(), CollaboratorValidationError> {
    if value.trim().is_empty() {
        return Err(error);
    }
    Ok(())
}

/// Raw input for a new collaborator, before hashing and department lookup.
#[derive(Debug, Clone)]
pub struct CollaboratorDraft {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: Zeroizing<String>,
    pub department: String,
}

impl CollaboratorDraft {
    /// Check every field is present and well formed.
    pub fn validate(&self) -> Result<(), CollaboratorValidationError> {
        check_not_blank(&self.name, CollaboratorValidationError::EmptyName)?;
        validate_email(&self.email)?;
        check_not_blank(&self.username, CollaboratorValidationError::EmptyUsername)?;
        check_password(&self.password)?;
        check_not_blank(&self.department, CollaboratorValidationError::EmptyDepartment)?;
        Ok(())
    }
}

/// Collaborator row ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCollaborator {
    pub employee_number: String,
    pub name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub department_id: Option<DepartmentId>,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct CollaboratorPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<Zeroizing<String>>,
    pub department: Option<String>,
}

impl CollaboratorPatch {
    /// Check the fields that are set.
    pub fn validate(&self) -> Result<(), CollaboratorValidationError> {
        if let Some(name) = &self.name {
            check_not_blank(name, CollaboratorValidationError::EmptyName)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(username) = &self.username {
            check_not_blank(username, CollaboratorValidationError::EmptyUsername)?;
        }
        if let Some(password) = &self.password {
            check_password(password)?;
        }
        if let Some(department) = &self.department {
            check_not_blank(department, CollaboratorValidationError::EmptyDepartment)?;
        }
        Ok(())
    }

    /// Copy the plain-text fields onto `target`.
    ///
    /// Password and department need the hasher and a store lookup, so the
    /// service applies them separately.
    pub fn apply_profile(&self, target: &mut Collaborator) {
        if let Some(name) = &self.name {
            target.name = name.trim().to_owned();
        }
        if let Some(email) = &self.email {
            target.email = email.trim().to_owned();
        }
        if let Some(username) = &self.username {
            target.username = username.trim().to_owned();
        }
    }
}

/// Build an employee number from a random token.
///
/// # Examples
/// ```
/// use crm::domain::employee_number_from;
///
/// assert_eq!(employee_number_from("a1b2c3d4e5"), "EMP-A1B2C3D4");
/// ```
pub fn employee_number_from(token: &str) -> String {
    let prefix: String = token
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(8)
        .collect();
    format!("EMP-{}", prefix.to_uppercase())
}
