//! Exhaustive checks of the permission table.

use super::*;
use rstest::rstest;

const ME: UserId = UserId::new(7);

fn actor(role: Role) -> Actor {
    Actor::new(ME, role)
}

/// Roles allowed regardless of ownership, per (entity, action).
fn unconditional(entity: Entity, action: Action) -> &'static [Role] {
    use Action::*;
    use Entity::*;
    match (entity, action) {
        (Collaborator, Create | List | Update | Delete) => &[Role::Gestion],
        (Client, Create) => &[Role::Commercial],
        (Client | Contract, List) => &[Role::Commercial, Role::Support, Role::Gestion],
        (Client | Contract, Update) => &[Role::Gestion],
        (Contract, Create) => &[Role::Commercial, Role::Gestion],
        (Event, List) => &[Role::Support, Role::Gestion],
        (Event, Update | AssignSupport) => &[Role::Gestion],
        _ => &[],
    }
}

/// Roles allowed only when they own the target.
fn owner_only(entity: Entity, action: Action) -> &'static [Role] {
    match (entity, action) {
        (Entity::Client | Entity::Contract, Action::Update) => &[Role::Commercial],
        (Entity::Event, Action::Create) => &[Role::Commercial],
        (Entity::Event, Action::Update) => &[Role::Support],
        _ => &[],
    }
}

#[rstest]
fn policy_matches_the_permission_table() {
    for entity in Entity::ALL {
        for action in Action::ALL {
            for role in Role::ALL {
                for ownership in [Ownership::Owner, Ownership::NotOwner, Ownership::Unscoped] {
                    let expected = unconditional(entity, action).contains(&role)
                        || (ownership == Ownership::Owner
                            && owner_only(entity, action).contains(&role));
                    assert_eq!(
                        allowed(entity, action, role, ownership),
                        expected,
                        "{entity:?} {action:?} {role:?} {ownership:?}"
                    );
                }
            }
        }
    }
}

#[rstest]
#[case(Entity::Client)]
#[case(Entity::Contract)]
#[case(Entity::Event)]
fn nothing_but_collaborators_can_be_deleted(#[case] entity: Entity) {
    for role in Role::ALL {
        assert!(!allowed(entity, Action::Delete, role, Ownership::Owner));
    }
}

#[rstest]
#[case(Role::Commercial, false)]
#[case(Role::Support, false)]
#[case(Role::Gestion, true)]
fn only_gestion_deletes_collaborators(#[case] role: Role, #[case] expected: bool) {
    assert_eq!(
        allowed(Entity::Collaborator, Action::Delete, role, Ownership::Unscoped),
        expected
    );
}

#[rstest]
#[case(Entity::Collaborator, Role::Gestion, VisibilityScope::All)]
#[case(Entity::Collaborator, Role::Commercial, VisibilityScope::Nothing)]
#[case(Entity::Collaborator, Role::Support, VisibilityScope::Nothing)]
#[case(Entity::Client, Role::Commercial, VisibilityScope::OwnedBy(ME))]
#[case(Entity::Client, Role::Support, VisibilityScope::All)]
#[case(Entity::Client, Role::Gestion, VisibilityScope::All)]
#[case(Entity::Contract, Role::Commercial, VisibilityScope::OwnedBy(ME))]
#[case(Entity::Contract, Role::Support, VisibilityScope::All)]
#[case(Entity::Contract, Role::Gestion, VisibilityScope::All)]
#[case(Entity::Event, Role::Gestion, VisibilityScope::All)]
#[case(Entity::Event, Role::Support, VisibilityScope::AssignedTo(ME))]
#[case(Entity::Event, Role::Commercial, VisibilityScope::Nothing)]
fn visibility_follows_role(
    #[case] entity: Entity,
    #[case] role: Role,
    #[case] expected: VisibilityScope,
) {
    assert_eq!(visibility_scope(entity, role, ME), expected);
}

#[rstest]
fn ownership_compares_ids() {
    assert_eq!(Ownership::of(ME, Some(ME)), Ownership::Owner);
    assert_eq!(Ownership::of(ME, Some(UserId::new(8))), Ownership::NotOwner);
    assert_eq!(Ownership::of(ME, None), Ownership::NotOwner);
}

#[rstest]
fn authorize_reports_forbidden() {
    let err = authorize(
        &actor(Role::Commercial),
        Entity::Client,
        Action::Update,
        Ownership::NotOwner,
    )
    .expect_err("non-owner update must fail");
    assert_eq!(err.code(), crate::domain::ErrorCode::Forbidden);
    assert!(err.message().contains("responsible for"));
}

#[rstest]
fn authorize_passes_allowed_operations() {
    assert!(
        authorize(
            &actor(Role::Support),
            Entity::Event,
            Action::Update,
            Ownership::Owner
        )
        .is_ok()
    );
}

#[rstest]
fn listing_scope_rejects_invisible_entities() {
    let err = listing_scope(&actor(Role::Commercial), Entity::Event).expect_err("hidden");
    assert_eq!(err.code(), crate::domain::ErrorCode::Forbidden);
    assert_eq!(
        listing_scope(&actor(Role::Support), Entity::Event),
        Ok(VisibilityScope::AssignedTo(ME))
    );
}
