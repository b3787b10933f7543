//! Centralised authorization rules.
//!
//! Every service asks this module whether an operation may proceed and which
//! rows a listing may return. No other module inspects roles or compares
//! owner ids.
//!
//! | Entity       | Create              | List            | Update               | Delete  |
//! |--------------|---------------------|-----------------|----------------------|---------|
//! | Collaborator | gestion             | gestion         | gestion              | gestion |
//! | Client       | commercial          | all (scoped)    | owner, gestion       | never   |
//! | Contract     | commercial, gestion | all (scoped)    | owner, gestion       | never   |
//! | Event        | owning commercial   | gestion/support | assigned support, gestion | never |
//!
//! Assigning a support contact to an event is a gestion-only action.

use tracing::warn;

use super::{DomainError, Role, UserId};

/// Record kinds guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Collaborator,
    Client,
    Contract,
    Event,
}

impl Entity {
    /// Every entity, for exhaustive checks.
    pub const ALL: [Self; 4] = [Self::Collaborator, Self::Client, Self::Contract, Self::Event];

    /// Lowercase name used in messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collaborator => "collaborator",
            Self::Client => "client",
            Self::Contract => "contract",
            Self::Event => "event",
        }
    }
}

/// Operations guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    List,
    Update,
    Delete,
    /// Attach a support collaborator to an event.
    AssignSupport,
}

impl Action {
    /// Every action, for exhaustive checks.
    pub const ALL: [Self; 5] = [
        Self::Create,
        Self::List,
        Self::Update,
        Self::Delete,
        Self::AssignSupport,
    ];

    /// Lowercase verb used in messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::List => "list",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::AssignSupport => "assign support to",
        }
    }
}

/// Relation between the requesting user and the target record.
///
/// For clients and contracts the owner is the commercial; for an event being
/// created it is the commercial of the contract's client; for an event being
/// updated it is the assigned support contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    Owner,
    NotOwner,
    /// No target record, or ownership is irrelevant.
    Unscoped,
}

impl Ownership {
    /// Compare a record's owner with the requesting user.
    pub fn of(actor: UserId, owner: Option<UserId>) -> Self {
        if owner == Some(actor) {
            Self::Owner
        } else {
            Self::NotOwner
        }
    }
}

/// Authenticated user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    /// Build an actor from a resolved user.
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Rows a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityScope {
    All,
    /// Rows whose owning commercial is the user.
    OwnedBy(UserId),
    /// Rows whose support contact is the user.
    AssignedTo(UserId),
    Nothing,
}

/// Decide whether `role` may perform `action` on `entity`.
pub fn allowed(entity: Entity, action: Action, role: Role, ownership: Ownership) -> bool {
    use Action::{AssignSupport, Create, Delete, List, Update};
    use Entity::{Client, Collaborator, Contract, Event};
    use Role::{Commercial, Gestion, Support};

    let owner = ownership == Ownership::Owner;
    match (entity, action, role) {
        (Collaborator, Create | List | Update | Delete, Gestion) => true,

        (Client, Create, Commercial) => true,
        (Client, List, _) => true,
        (Client, Update, Gestion) => true,
        (Client, Update, Commercial) => owner,

        (Contract, Create, Commercial | Gestion) => true,
        (Contract, List, _) => true,
        (Contract, Update, Gestion) => true,
        (Contract, Update, Commercial) => owner,

        (Event, Create, Commercial) => owner,
        (Event, List, Gestion | Support) => true,
        (Event, Update, Gestion) => true,
        (Event, Update, Support) => owner,
        (Event, AssignSupport, Gestion) => true,

        _ => false,
    }
}

/// Rows of `entity` that `user` with `role` may see.
pub fn visibility_scope(entity: Entity, role: Role, user: UserId) -> VisibilityScope {
    match (entity, role) {
        (Entity::Collaborator, Role::Gestion) => VisibilityScope::All,
        (Entity::Collaborator, _) => VisibilityScope::Nothing,
        (Entity::Client | Entity::Contract, Role::Gestion | Role::Support) => VisibilityScope::All,
        (Entity::Client | Entity::Contract, Role::Commercial) => VisibilityScope::OwnedBy(user),
        (Entity::Event, Role::Gestion) => VisibilityScope::All,
        (Entity::Event, Role::Support) => VisibilityScope::AssignedTo(user),
        (Entity::Event, Role::Commercial) => VisibilityScope::Nothing,
    }
}

/// Fail with [`DomainError::forbidden`] unless the policy allows the operation.
pub fn authorize(
    actor: &Actor,
    entity: Entity,
    action: Action,
    ownership: Ownership,
) -> Result<(), DomainError> {
    if allowed(entity, action, actor.role, ownership) {
        return Ok(());
    }
    warn!(
        user_id = %actor.user_id,
        role = %actor.role,
        entity = entity.as_str(),
        action = action.as_str(),
        ?ownership,
        "operation rejected by policy"
    );
    let reason = if ownership == Ownership::NotOwner {
        format!(
            "you can only {} {} records you are responsible for",
            action.as_str(),
            entity.as_str()
        )
    } else {
        format!(
            "role '{}' may not {} {} records",
            actor.role,
            action.as_str(),
            entity.as_str()
        )
    };
    Err(DomainError::forbidden(reason))
}

/// Visibility scope for a listing, failing when nothing may be seen.
pub fn listing_scope(actor: &Actor, entity: Entity) -> Result<VisibilityScope, DomainError> {
    match visibility_scope(entity, actor.role, actor.user_id) {
        VisibilityScope::Nothing => {
            authorize(actor, entity, Action::List, Ownership::Unscoped)?;
            Err(DomainError::forbidden(format!(
                "no {} records are visible to role '{}'",
                entity.as_str(),
                actor.role
            )))
        }
        scope => Ok(scope),
    }
}

#[cfg(test)]
mod tests;
