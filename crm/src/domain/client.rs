//! Client records and their owning commercial.

use std::fmt;

use chrono::{DateTime, Utc};

use super::validation::{ContactValidationError, validate_email, validate_phone};
use super::{ClientId, UserId};

/// Persisted client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    /// Owning commercial; `None` once that collaborator has been deleted.
    pub commercial_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// Validation errors for client input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientValidationError {
    EmptyName,
    Contact(ContactValidationError),
}

impl fmt::Display for ClientValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "client name must not be empty"),
            Self::Contact(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ClientValidationError {}

impl From<ContactValidationError> for ClientValidationError {
    fn from(value: ContactValidationError) -> Self {
        Self::Contact(value)
    }
}

/// Raw input for a new client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDraft {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
}

impl ClientDraft {
    /// Check the draft before it reaches storage.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.name.trim().is_empty() {
            return Err(ClientValidationError::EmptyName);
        }
        validate_email(&self.email)?;
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        Ok(())
    }

    /// Row to insert, owned by `commercial_id`.
    pub fn into_new(self, commercial_id: UserId, now: DateTime<Utc>) -> NewClient {
        NewClient {
            name: self.name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            phone: self.phone.map(|phone| phone.trim().to_owned()),
            company_name: self.company_name.map(|company| company.trim().to_owned()),
            commercial_id,
            created_at: now,
        }
    }
}

/// Client row ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub commercial_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
}

impl ClientPatch {
    /// Check the fields that are set.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ClientValidationError::EmptyName);
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        Ok(())
    }

    /// Copy set fields onto `target` and stamp the update time.
    pub fn apply(&self, target: &mut Client, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            target.name = name.trim().to_owned();
        }
        if let Some(email) = &self.email {
            target.email = email.trim().to_owned();
        }
        if let Some(phone) = &self.phone {
            target.phone = Some(phone.trim().to_owned());
        }
        if let Some(company) = &self.company_name {
            target.company_name = Some(company.trim().to_owned());
        }
        target.last_updated_at = now;
    }
}
