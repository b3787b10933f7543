//! Tests for contract management.

use super::*;
use crate::domain::{Amount, ClientDraft, ClientService, ErrorCode};
use crate::outbound::memory::InMemoryCrmStore;
use crate::test_support::{MutableClock, Staff, seed_staff};
use rstest::rstest;

struct Harness {
    store: InMemoryCrmStore,
    staff: Staff,
    clients: ClientService,
    service: ContractService,
}

async fn harness() -> Harness {
    let store = InMemoryCrmStore::new();
    let staff = seed_staff(&store).await;
    let clock = Arc::new(MutableClock::fixed());
    Harness {
        clients: ClientService::new(Arc::new(store.clone()), clock.clone()),
        service: ContractService::new(Arc::new(store.clone()), clock),
        store,
        staff,
    }
}

fn amount(raw: &str) -> Amount {
    raw.parse().expect("valid amount")
}

impl Harness {
    async fn client_of(&self, actor: &Actor, email: &str) -> crate::domain::Client {
        self.clients
            .create(
                actor,
                ClientDraft {
                    name: format!("Client {email}"),
                    email: email.to_owned(),
                    phone: None,
                    company_name: None,
                },
            )
            .await
            .expect("client")
    }

    fn draft(&self, client_id: ClientId, signed: bool) -> ContractDraft {
        ContractDraft {
            client_id,
            total: amount("1000"),
            remaining: amount("250.50"),
            signed,
            commercial_id: None,
        }
    }
}

#[rstest]
#[tokio::test]
async fn owner_comes_from_the_client() {
    let h = harness().await;
    let client = h.client_of(&h.staff.commercial_actor(), "c@acme.io").await;

    let mut draft = h.draft(client.id, false);
    draft.commercial_id = Some(h.staff.other_commercial.id);
    let contract = h
        .service
        .create(&h.staff.gestion_actor(), draft)
        .await
        .expect("create");

    assert_eq!(contract.commercial_id, h.staff.commercial.id);
    let owner = h
        .service
        .owner_for_client(&h.staff.gestion_actor(), client.id)
        .await
        .expect("owner lookup");
    assert_eq!(owner.map(|user| user.id), Some(h.staff.commercial.id));
}

#[rstest]
#[tokio::test]
async fn orphan_client_needs_a_commercial_owner() {
    let h = harness().await;
    let client = h.client_of(&h.staff.commercial_actor(), "c@acme.io").await;
    {
        let mut uow = h.store.begin().await.expect("begin");
        let mut orphan = uow.find_client(client.id).await.expect("find").expect("row");
        orphan.commercial_id = None;
        uow.update_client(&orphan).await.expect("update");
        uow.commit().await.expect("commit");
    }
    let gestion = h.staff.gestion_actor();

    let missing = h
        .service
        .create(&gestion, h.draft(client.id, false))
        .await
        .expect_err("owner required");
    assert_eq!(missing.code(), ErrorCode::InvalidRequest);

    let mut wrong_role = h.draft(client.id, false);
    wrong_role.commercial_id = Some(h.staff.support.id);
    let not_commercial = h
        .service
        .create(&gestion, wrong_role)
        .await
        .expect_err("support cannot own contracts");
    assert_eq!(not_commercial.code(), ErrorCode::InvalidRequest);

    let mut supplied = h.draft(client.id, false);
    supplied.commercial_id = Some(h.staff.other_commercial.id);
    let contract = h.service.create(&gestion, supplied).await.expect("create");
    assert_eq!(contract.commercial_id, h.staff.other_commercial.id);
}

#[rstest]
#[tokio::test]
async fn missing_client_fails() {
    let h = harness().await;
    let err = h
        .service
        .create(&h.staff.gestion_actor(), h.draft(ClientId::new(404), false))
        .await
        .expect_err("missing client");
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(h.store.row_counts().expect("counts")[3], 0);
}

#[rstest]
#[tokio::test]
async fn support_cannot_create_contracts() {
    let h = harness().await;
    let client = h.client_of(&h.staff.commercial_actor(), "c@acme.io").await;
    let err = h
        .service
        .create(&h.staff.support_actor(), h.draft(client.id, false))
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn remaining_above_total_is_rejected() {
    let h = harness().await;
    let client = h.client_of(&h.staff.commercial_actor(), "c@acme.io").await;
    let mut draft = h.draft(client.id, false);
    draft.remaining = amount("2000");

    let err = h
        .service
        .create(&h.staff.commercial_actor(), draft)
        .await
        .expect_err("invalid amounts");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn amount_updates_round_trip() {
    let h = harness().await;
    let actor = h.staff.commercial_actor();
    let client = h.client_of(&actor, "c@acme.io").await;
    let contract = h
        .service
        .create(&actor, h.draft(client.id, false))
        .await
        .expect("create");

    let patch = ContractPatch {
        remaining: Some(amount("100.25")),
        ..ContractPatch::default()
    };
    h.service
        .update(&actor, contract.id, patch)
        .await
        .expect("update");
    let stored = h.service.get(&actor, contract.id).await.expect("get");

    assert_eq!(stored.remaining, amount("100.25"));
    assert_eq!(stored.total, contract.total);
    assert_eq!(stored.signed, contract.signed);
    assert_eq!(stored.client_id, contract.client_id);
}

#[rstest]
#[tokio::test]
async fn only_the_owner_or_gestion_updates() {
    let h = harness().await;
    let owner = h.staff.commercial_actor();
    let client = h.client_of(&owner, "c@acme.io").await;
    let contract = h
        .service
        .create(&owner, h.draft(client.id, false))
        .await
        .expect("create");
    let patch = ContractPatch {
        signed: Some(true),
        ..ContractPatch::default()
    };

    for intruder in [h.staff.other_commercial_actor(), h.staff.support_actor()] {
        let err = h
            .service
            .update(&intruder, contract.id, patch)
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
    assert!(!h.service.get(&owner, contract.id).await.expect("get").signed);

    let signed = h
        .service
        .update(&h.staff.gestion_actor(), contract.id, patch)
        .await
        .expect("gestion override");
    assert!(signed.signed);
}

#[rstest]
#[tokio::test]
async fn commercial_lists_exactly_their_contracts() {
    let h = harness().await;
    let mine = h.staff.commercial_actor();
    let theirs = h.staff.other_commercial_actor();
    let my_client = h.client_of(&mine, "mine@acme.io").await;
    let their_client = h.client_of(&theirs, "theirs@acme.io").await;
    let first = h
        .service
        .create(&mine, h.draft(my_client.id, false))
        .await
        .expect("first");
    let second = h
        .service
        .create(&mine, h.draft(my_client.id, true))
        .await
        .expect("second");
    h.service
        .create(&theirs, h.draft(their_client.id, true))
        .await
        .expect("theirs");

    let listed: Vec<ContractId> = h
        .service
        .list(&mine)
        .await
        .expect("list")
        .into_iter()
        .map(|contract| contract.id)
        .collect();

    assert_eq!(listed, vec![first.id, second.id]);
    assert_eq!(h.service.list(&h.staff.gestion_actor()).await.expect("all").len(), 3);
}

#[rstest]
#[case(ContractFilter::Unsigned, 1)]
#[case(ContractFilter::Signed, 1)]
#[case(ContractFilter::Unpaid, 1)]
#[tokio::test]
async fn filters_apply_to_own_contracts(#[case] filter: ContractFilter, #[case] expected: usize) {
    let h = harness().await;
    let mine = h.staff.commercial_actor();
    let theirs = h.staff.other_commercial_actor();
    let my_client = h.client_of(&mine, "mine@acme.io").await;
    let their_client = h.client_of(&theirs, "theirs@acme.io").await;

    h.service
        .create(&mine, h.draft(my_client.id, false))
        .await
        .expect("unsigned, unpaid");
    let mut paid = h.draft(my_client.id, true);
    paid.remaining = Amount::ZERO;
    h.service.create(&mine, paid).await.expect("signed, paid");
    h.service
        .create(&theirs, h.draft(their_client.id, false))
        .await
        .expect("theirs");

    let found = h.service.filter(&mine, filter).await.expect("filter");

    assert_eq!(found.len(), expected);
    assert!(found.iter().all(|contract| filter.matches(contract)));
    assert!(found.iter().all(|contract| contract.commercial_id == mine.user_id));
}
