//! Tests for event management and support assignment.

use super::*;
use crate::domain::{
    Amount, ClientDraft, ClientService, Contract, ContractDraft, ContractService, ErrorCode,
    parse_event_date,
};
use crate::outbound::memory::InMemoryCrmStore;
use crate::test_support::{MutableClock, Staff, seed_staff};
use rstest::rstest;

struct Harness {
    store: InMemoryCrmStore,
    staff: Staff,
    contracts: ContractService,
    service: EventService,
    clients: ClientService,
}

async fn harness() -> Harness {
    let store = InMemoryCrmStore::new();
    let staff = seed_staff(&store).await;
    let clock = Arc::new(MutableClock::fixed());
    Harness {
        clients: ClientService::new(Arc::new(store.clone()), clock.clone()),
        contracts: ContractService::new(Arc::new(store.clone()), clock.clone()),
        service: EventService::new(Arc::new(store.clone()), clock),
        store,
        staff,
    }
}

impl Harness {
    async fn contract(&self, owner: &Actor, email: &str, signed: bool) -> Contract {
        let client = self
            .clients
            .create(
                owner,
                ClientDraft {
                    name: "Client".to_owned(),
                    email: email.to_owned(),
                    phone: None,
                    company_name: None,
                },
            )
            .await
            .expect("client");
        self.contracts
            .create(
                owner,
                ContractDraft {
                    client_id: client.id,
                    total: Amount::from_cents(500_000).expect("amount"),
                    remaining: Amount::ZERO,
                    signed,
                    commercial_id: None,
                },
            )
            .await
            .expect("contract")
    }

    fn events(&self) -> usize {
        self.store.row_counts().expect("counts")[4]
    }
}

fn draft(contract: &Contract) -> EventDraft {
    EventDraft {
        contract_id: contract.id,
        name: "Gala".to_owned(),
        starts_at: parse_event_date("04-06-2024 18:00").expect("date"),
        ends_at: parse_event_date("05-06-2024 01:00").expect("date"),
        location: "Lyon".to_owned(),
        attendees: 120,
        notes: None,
    }
}

#[rstest]
#[tokio::test]
async fn owner_creates_event_on_signed_contract() {
    let h = harness().await;
    let owner = h.staff.commercial_actor();
    let contract = h.contract(&owner, "a@acme.io", true).await;

    let event = h.service.create(&owner, draft(&contract)).await.expect("create");

    assert_eq!(event.contract_id, contract.id);
    assert_eq!(event.support_id, None);
    assert_eq!(h.events(), 1);
}

#[rstest]
#[tokio::test]
async fn unsigned_contract_is_rejected() {
    let h = harness().await;
    let owner = h.staff.commercial_actor();
    let contract = h.contract(&owner, "a@acme.io", false).await;

    let err = h
        .service
        .create(&owner, draft(&contract))
        .await
        .expect_err("unsigned");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(h.events(), 0);
}

#[rstest]
#[tokio::test]
async fn other_commercial_cannot_create_event() {
    let h = harness().await;
    let contract = h.contract(&h.staff.commercial_actor(), "a@acme.io", true).await;

    let err = h
        .service
        .create(&h.staff.other_commercial_actor(), draft(&contract))
        .await
        .expect_err("not the owner");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(h.events(), 0);
}

#[rstest]
#[tokio::test]
async fn assigning_non_support_user_leaves_event_unchanged() {
    let h = harness().await;
    let owner = h.staff.commercial_actor();
    let contract = h.contract(&owner, "a@acme.io", true).await;
    let event = h.service.create(&owner, draft(&contract)).await.expect("create");
    let gestion = h.staff.gestion_actor();

    let err = h
        .service
        .assign_support(&gestion, event.id, h.staff.commercial.id)
        .await
        .expect_err("not support");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    let stored = h.service.get(&gestion, event.id).await.expect("get");
    assert_eq!(stored.support_id, None);
    assert_eq!(stored, event);
}

#[rstest]
#[tokio::test]
async fn support_assignment_scopes_support_views() {
    let h = harness().await;
    let owner = h.staff.commercial_actor();
    let contract = h.contract(&owner, "a@acme.io", true).await;
    let assigned = h.service.create(&owner, draft(&contract)).await.expect("first");
    h.service.create(&owner, draft(&contract)).await.expect("second");
    let gestion = h.staff.gestion_actor();
    let support = h.staff.support_actor();

    h.service
        .assign_support(&gestion, assigned.id, h.staff.support.id)
        .await
        .expect("assign");

    let mine = h.service.list(&support).await.expect("support list");
    let unassigned = h
        .service
        .list_without_support(&gestion)
        .await
        .expect("without support");
    assert_eq!(mine.iter().map(|e| e.id).collect::<Vec<_>>(), vec![assigned.id]);
    assert_eq!(unassigned.len(), 1);
    assert!(unassigned.iter().all(|event| event.support_id.is_none()));
    assert_eq!(h.service.list(&gestion).await.expect("all").len(), 2);
}

#[rstest]
#[case(Role::Commercial)]
#[case(Role::Support)]
#[tokio::test]
async fn only_gestion_assigns_support(#[case] role: Role) {
    let h = harness().await;
    let owner = h.staff.commercial_actor();
    let contract = h.contract(&owner, "a@acme.io", true).await;
    let event = h.service.create(&owner, draft(&contract)).await.expect("create");
    let user = match role {
        Role::Support => &h.staff.support,
        _ => &h.staff.commercial,
    };

    let err = h
        .service
        .assign_support(&Staff::actor(user, role), event.id, h.staff.support.id)
        .await
        .expect_err("forbidden");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn support_updates_only_assigned_events() {
    let h = harness().await;
    let owner = h.staff.commercial_actor();
    let contract = h.contract(&owner, "a@acme.io", true).await;
    let event = h.service.create(&owner, draft(&contract)).await.expect("create");
    let support = h.staff.support_actor();
    let patch = EventPatch {
        notes: Some("Stage at 17:00".to_owned()),
        ..EventPatch::default()
    };

    let err = h
        .service
        .update(&support, event.id, patch.clone())
        .await
        .expect_err("unassigned");
    assert_eq!(err.code(), ErrorCode::Forbidden);

    h.service
        .assign_support(&h.staff.gestion_actor(), event.id, h.staff.support.id)
        .await
        .expect("assign");
    let updated = h.service.update(&support, event.id, patch).await.expect("update");
    assert_eq!(updated.notes.as_deref(), Some("Stage at 17:00"));
    assert_eq!(updated.attendees, event.attendees);
}

#[rstest]
#[tokio::test]
async fn commercials_cannot_list_or_update_events() {
    let h = harness().await;
    let owner = h.staff.commercial_actor();
    let contract = h.contract(&owner, "a@acme.io", true).await;
    let event = h.service.create(&owner, draft(&contract)).await.expect("create");

    let list = h.service.list(&owner).await.expect_err("hidden");
    let update = h
        .service
        .update(&owner, event.id, EventPatch::default())
        .await
        .expect_err("forbidden");

    assert_eq!(list.code(), ErrorCode::Forbidden);
    assert_eq!(update.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn support_staff_lists_support_department() {
    let h = harness().await;
    let staff = h
        .service
        .support_staff(&h.staff.gestion_actor())
        .await
        .expect("support staff");
    assert_eq!(staff.iter().map(|u| u.id).collect::<Vec<_>>(), vec![h.staff.support.id]);
}
