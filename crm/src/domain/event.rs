//! Events organised under a signed contract.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

use super::{ContractId, EventId, UserId};

/// Format used to read and print event dates.
pub const EVENT_DATE_FORMAT: &str = "%d-%m-%Y %H:%M";

/// Persisted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub contract_id: ContractId,
    /// Assigned support collaborator, if any.
    pub support_id: Option<UserId>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub location: String,
    pub attendees: u32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// Validation errors for event input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    EmptyName,
    EmptyLocation,
    EndsBeforeStart,
}

impl fmt::Display for EventValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "event name must not be empty"),
            Self::EmptyLocation => write!(f, "event location must not be empty"),
            Self::EndsBeforeStart => write!(f, "event end must not precede its start"),
        }
    }
}

impl std::error::Error for EventValidationError {}

/// Raw input for a new event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub contract_id: ContractId,
    pub name: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub location: String,
    pub attendees: u32,
    pub notes: Option<String>,
}

impl EventDraft {
    /// Check the draft before it reaches storage.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        check(&self.name, &self.location, self.starts_at, self.ends_at)
    }

    /// Row to insert, without a support contact.
    pub fn into_new(self, now: DateTime<Utc>) -> NewEvent {
        NewEvent {
            name: self.name.trim().to_owned(),
            contract_id: self.contract_id,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            location: self.location.trim().to_owned(),
            attendees: self.attendees,
            notes: self.notes,
            created_at: now,
        }
    }
}

fn check(
    name: &str,
    location: &str,
    starts_at: NaiveDateTime,
    ends_at: NaiveDateTime,
) -> Result<(), EventValidationError> {
    if name.trim().is_empty() {
        return Err(EventValidationError::EmptyName);
    }
    if location.trim().is_empty() {
        return Err(EventValidationError::EmptyLocation);
    }
    if ends_at < starts_at {
        return Err(EventValidationError::EndsBeforeStart);
    }
    Ok(())
}

/// Event row ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub name: String,
    pub contract_id: ContractId,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub location: String,
    pub attendees: u32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub name: Option<String>,
    pub starts_at: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub attendees: Option<u32>,
    pub notes: Option<String>,
}

impl EventPatch {
    /// Apply set fields to `target`, rejecting results that break the
    /// event invariants. `target` is untouched on error.
    pub fn apply(&self, target: &mut Event, now: DateTime<Utc>) -> Result<(), EventValidationError> {
        let name = self.name.as_deref().unwrap_or(&target.name);
        let location = self.location.as_deref().unwrap_or(&target.location);
        let starts_at = self.starts_at.unwrap_or(target.starts_at);
        let ends_at = self.ends_at.unwrap_or(target.ends_at);
        check(name, location, starts_at, ends_at)?;

        target.name = name.trim().to_owned();
        target.location = location.trim().to_owned();
        target.starts_at = starts_at;
        target.ends_at = ends_at;
        if let Some(attendees) = self.attendees {
            target.attendees = attendees;
        }
        if let Some(notes) = &self.notes {
            target.notes = Some(notes.clone());
        }
        target.last_updated_at = now;
        Ok(())
    }
}

/// Parse a date typed as `DD-MM-YYYY HH:MM`.
pub fn parse_event_date(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw.trim(), EVENT_DATE_FORMAT)
}
