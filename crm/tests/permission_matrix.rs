//! Every operation the permission table forbids is rejected and leaves the
//! store exactly as it was.

use std::sync::Arc;

use crm::domain::{
    Amount, Client, ClientDraft, ClientPatch, CollaboratorDraft, CollaboratorPatch, Contract,
    ContractDraft, ContractPatch, CrmServices, DomainError, ErrorCode, Event, EventDraft,
    EventPatch, parse_event_date,
};
use crm::outbound::memory::InMemoryCrmStore;
use crm::test_support::{MutableClock, PlainTextHasher, Staff, seed_staff};
use rstest::rstest;
use zeroize::Zeroizing;

struct World {
    store: InMemoryCrmStore,
    staff: Staff,
    services: CrmServices,
    client: Client,
    contract: Contract,
    event: Event,
}

async fn world() -> World {
    let store = InMemoryCrmStore::new();
    let staff = seed_staff(&store).await;
    let services = CrmServices::new(
        Arc::new(store.clone()),
        Arc::new(PlainTextHasher),
        Arc::new(MutableClock::fixed()),
    );
    let carl = staff.commercial_actor();
    let client = services
        .clients
        .create(&carl, client_draft("kevin@startup.io"))
        .await
        .expect("client");
    let contract = services
        .contracts
        .create(&carl, contract_draft(&client))
        .await
        .expect("contract");
    let event = services
        .events
        .create(&carl, event_draft(&contract))
        .await
        .expect("event");
    services
        .events
        .assign_support(&staff.gestion_actor(), event.id, staff.support.id)
        .await
        .expect("assign");
    World {
        store,
        staff,
        services,
        client,
        contract,
        event,
    }
}

fn client_draft(email: &str) -> ClientDraft {
    ClientDraft {
        name: "Kevin Casey".to_owned(),
        email: email.to_owned(),
        phone: None,
        company_name: Some("Cool Startup LLC".to_owned()),
    }
}

fn contract_draft(client: &Client) -> ContractDraft {
    ContractDraft {
        client_id: client.id,
        total: "1000".parse().expect("amount"),
        remaining: Amount::ZERO,
        signed: true,
        commercial_id: None,
    }
}

fn event_draft(contract: &Contract) -> EventDraft {
    EventDraft {
        contract_id: contract.id,
        name: "Launch party".to_owned(),
        starts_at: parse_event_date("04-06-2024 18:00").expect("start"),
        ends_at: parse_event_date("05-06-2024 01:00").expect("end"),
        location: "Candé-sur-Beuvron".to_owned(),
        attendees: 75,
        notes: None,
    }
}

#[derive(Debug, Clone, Copy)]
enum Who {
    Gestion,
    Commercial,
    OtherCommercial,
    Support,
}

#[derive(Debug, Clone, Copy)]
enum Op {
    CreateCollaborator,
    ListCollaborators,
    UpdateCollaborator,
    DeleteCollaborator,
    CreateClient,
    UpdateClient,
    CreateContract,
    UpdateContract,
    CreateEvent,
    UpdateEvent,
    AssignSupport,
    ListEvents,
}

async fn attempt(world: &World, who: Who, op: Op) -> Result<(), DomainError> {
    let actor = match who {
        Who::Gestion => world.staff.gestion_actor(),
        Who::Commercial => world.staff.commercial_actor(),
        Who::OtherCommercial => world.staff.other_commercial_actor(),
        Who::Support => world.staff.support_actor(),
    };
    let services = &world.services;
    match op {
        Op::CreateCollaborator => {
            let draft = CollaboratorDraft {
                name: "New Hire".to_owned(),
                email: "hire@example.com".to_owned(),
                username: "hire".to_owned(),
                password: Zeroizing::new("password1".to_owned()),
                department: "support".to_owned(),
            };
            services.collaborators.create(&actor, draft).await.map(drop)
        }
        Op::ListCollaborators => services.collaborators.list(&actor).await.map(drop),
        Op::UpdateCollaborator => {
            let patch = CollaboratorPatch {
                name: Some("Renamed".to_owned()),
                ..CollaboratorPatch::default()
            };
            services
                .collaborators
                .update(&actor, world.staff.support.id, patch)
                .await
                .map(drop)
        }
        Op::DeleteCollaborator => services
            .collaborators
            .delete(&actor, world.staff.support.id)
            .await
            .map(drop),
        Op::CreateClient => services
            .clients
            .create(&actor, client_draft("someone@else.io"))
            .await
            .map(drop),
        Op::UpdateClient => {
            let patch = ClientPatch {
                company_name: Some("Hijacked".to_owned()),
                ..ClientPatch::default()
            };
            services
                .clients
                .update(&actor, world.client.id, patch)
                .await
                .map(drop)
        }
        Op::CreateContract => services
            .contracts
            .create(&actor, contract_draft(&world.client))
            .await
            .map(drop),
        Op::UpdateContract => {
            let patch = ContractPatch {
                signed: Some(false),
                ..ContractPatch::default()
            };
            services
                .contracts
                .update(&actor, world.contract.id, patch)
                .await
                .map(drop)
        }
        Op::CreateEvent => services
            .events
            .create(&actor, event_draft(&world.contract))
            .await
            .map(drop),
        Op::UpdateEvent => {
            let patch = EventPatch {
                attendees: Some(1),
                ..EventPatch::default()
            };
            services
                .events
                .update(&actor, world.event.id, patch)
                .await
                .map(drop)
        }
        Op::AssignSupport => services
            .events
            .assign_support(&actor, world.event.id, world.staff.support.id)
            .await
            .map(drop),
        Op::ListEvents => services.events.list(&actor).await.map(drop),
    }
}

#[rstest]
#[case(Who::Commercial, Op::CreateCollaborator)]
#[case(Who::Support, Op::CreateCollaborator)]
#[case(Who::Commercial, Op::ListCollaborators)]
#[case(Who::Support, Op::ListCollaborators)]
#[case(Who::Commercial, Op::UpdateCollaborator)]
#[case(Who::Support, Op::UpdateCollaborator)]
#[case(Who::Commercial, Op::DeleteCollaborator)]
#[case(Who::Support, Op::DeleteCollaborator)]
#[case(Who::Gestion, Op::CreateClient)]
#[case(Who::Support, Op::CreateClient)]
#[case(Who::OtherCommercial, Op::UpdateClient)]
#[case(Who::Support, Op::UpdateClient)]
#[case(Who::Support, Op::CreateContract)]
#[case(Who::OtherCommercial, Op::UpdateContract)]
#[case(Who::Support, Op::UpdateContract)]
#[case(Who::Gestion, Op::CreateEvent)]
#[case(Who::Support, Op::CreateEvent)]
#[case(Who::OtherCommercial, Op::CreateEvent)]
#[case(Who::Commercial, Op::UpdateEvent)]
#[case(Who::Commercial, Op::AssignSupport)]
#[case(Who::Support, Op::AssignSupport)]
#[case(Who::Commercial, Op::ListEvents)]
#[tokio::test]
async fn forbidden_operations_leave_storage_unchanged(#[case] who: Who, #[case] op: Op) {
    let world = world().await;
    let before = world.store.snapshot().expect("snapshot");

    let err = attempt(&world, who, op).await.expect_err("should be rejected");

    assert_eq!(err.code(), ErrorCode::Forbidden, "{who:?} {op:?}: {err}");
    assert_eq!(world.store.snapshot().expect("snapshot"), before);
}

#[rstest]
#[case(Who::Gestion, Op::ListCollaborators)]
#[case(Who::Gestion, Op::UpdateClient)]
#[case(Who::Commercial, Op::UpdateClient)]
#[case(Who::Gestion, Op::UpdateContract)]
#[case(Who::Commercial, Op::UpdateContract)]
#[case(Who::Support, Op::UpdateEvent)]
#[case(Who::Gestion, Op::UpdateEvent)]
#[case(Who::Gestion, Op::AssignSupport)]
#[case(Who::Support, Op::ListEvents)]
#[tokio::test]
async fn permitted_operations_succeed(#[case] who: Who, #[case] op: Op) {
    let world = world().await;
    attempt(&world, who, op)
        .await
        .unwrap_or_else(|err| panic!("{who:?} {op:?} rejected: {err}"));
}

#[rstest]
#[tokio::test]
async fn rejected_client_update_keeps_owner_record() {
    let world = world().await;

    let _ = attempt(&world, Who::OtherCommercial, Op::UpdateClient).await;

    let stored = world
        .services
        .clients
        .get(&world.staff.commercial_actor(), world.client.id)
        .await
        .expect("owner still sees the client");
    assert_eq!(stored, world.client);
}

#[rstest]
#[tokio::test]
async fn commercials_see_exactly_their_own_contracts() {
    let world = world().await;
    let cora = world.staff.other_commercial_actor();
    let her_client = world
        .services
        .clients
        .create(&cora, client_draft("cora-client@example.com"))
        .await
        .expect("client");
    let hers = world
        .services
        .contracts
        .create(&cora, contract_draft(&her_client))
        .await
        .expect("contract");

    let carl_sees = world
        .services
        .contracts
        .list(&world.staff.commercial_actor())
        .await
        .expect("list");
    let cora_sees = world.services.contracts.list(&cora).await.expect("list");
    let support_sees = world
        .services
        .contracts
        .list(&world.staff.support_actor())
        .await
        .expect("list");

    assert_eq!(carl_sees, vec![world.contract.clone()]);
    assert_eq!(cora_sees, vec![hers]);
    assert_eq!(support_sees.len(), 2);
}

#[rstest]
#[tokio::test]
async fn contract_amounts_round_trip_and_omitted_fields_stay() {
    let world = world().await;
    let carl = world.staff.commercial_actor();
    let patch = ContractPatch {
        total: Some("2500.75".parse().expect("amount")),
        remaining: Some("300".parse().expect("amount")),
        signed: None,
    };

    world
        .services
        .contracts
        .update(&carl, world.contract.id, patch)
        .await
        .expect("update");
    let stored = world
        .services
        .contracts
        .get(&carl, world.contract.id)
        .await
        .expect("get");

    assert_eq!(stored.total.cents(), 250_075);
    assert_eq!(stored.remaining.cents(), 30_000);
    assert!(stored.signed);
    assert_eq!(stored.client_id, world.contract.client_id);
}

#[rstest]
#[tokio::test]
async fn assigning_a_non_support_user_keeps_the_current_contact() {
    let world = world().await;
    let before = world.store.snapshot().expect("snapshot");

    let err = world
        .services
        .events
        .assign_support(
            &world.staff.gestion_actor(),
            world.event.id,
            world.staff.commercial.id,
        )
        .await
        .expect_err("commercial is not support staff");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(world.store.snapshot().expect("snapshot"), before);
    let event = world
        .services
        .events
        .get(&world.staff.gestion_actor(), world.event.id)
        .await
        .expect("event");
    assert_eq!(event.support_id, Some(world.staff.support.id));
}
