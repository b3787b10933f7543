//! Behaviour tests for the idempotent database bootstrap.
//!
//! Scenarios run against the in-memory store so they need no database.

use std::sync::Arc;

use crm::domain::{
    AdminSeed, InitializationReport, Initializer, LoginCredentials, SessionGate,
};
use crm::outbound::memory::InMemoryCrmStore;
use crm::test_support::{MemorySessionTokenStore, MutableClock, PlainTextHasher};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use tokio::runtime::Runtime;

const ADMIN_PASSWORD: &str = "admin123";

/// Wrapper for the non-Clone runtime.
#[derive(Clone)]
struct RuntimeHandle(Arc<Runtime>);

#[derive(Default, ScenarioState)]
struct BootstrapWorld {
    runtime: Slot<RuntimeHandle>,
    store: Slot<InMemoryCrmStore>,
    last_result: Slot<Result<InitializationReport, String>>,
}

impl BootstrapWorld {
    fn runtime(&self) -> Arc<Runtime> {
        self.runtime.get().expect("runtime should be set").0
    }

    fn store(&self) -> InMemoryCrmStore {
        self.store.get().expect("store should be set")
    }

    fn run_bootstrap(&self) {
        let store = self.store();
        let initializer = Initializer::new(Arc::new(store), Arc::new(PlainTextHasher));
        let seed = AdminSeed::with_password(ADMIN_PASSWORD);
        let result = self
            .runtime()
            .block_on(initializer.run(&seed))
            .map_err(|err| err.to_string());
        self.last_result.set(result);
    }

    fn report(&self) -> InitializationReport {
        self.last_result
            .get()
            .expect("bootstrap result should be set")
            .expect("bootstrap should succeed")
    }

    fn row_count(&self, table: usize) -> usize {
        self.store().row_counts().expect("row counts")[table]
    }
}

#[fixture]
fn world() -> BootstrapWorld {
    BootstrapWorld::default()
}

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("an empty store")]
fn an_empty_store(world: &BootstrapWorld) {
    let runtime = Runtime::new().expect("create runtime");
    world.runtime.set(RuntimeHandle(Arc::new(runtime)));
    world.store.set(InMemoryCrmStore::new());
}

#[given("the next commit fails")]
fn the_next_commit_fails(world: &BootstrapWorld) {
    world.store().fail_next_commit();
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[when("the bootstrap runs")]
fn the_bootstrap_runs(world: &BootstrapWorld) {
    world.run_bootstrap();
}

#[when("the bootstrap runs again")]
fn the_bootstrap_runs_again(world: &BootstrapWorld) {
    world.run_bootstrap();
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

#[then("{count} departments are stored")]
fn departments_are_stored(world: &BootstrapWorld, count: usize) {
    assert_eq!(world.row_count(0), count);
}

#[then("{count} collaborators are stored")]
fn collaborators_are_stored(world: &BootstrapWorld, count: usize) {
    assert_eq!(world.row_count(1), count);
}

#[then("the administrator was created")]
fn the_administrator_was_created(world: &BootstrapWorld) {
    let report = world.report();
    assert!(report.admin.1, "expected a new administrator");
    assert!(report.departments.iter().all(|(_, created)| *created));
}

#[then("the administrator was already present")]
fn the_administrator_was_already_present(world: &BootstrapWorld) {
    let report = world.report();
    assert!(!report.admin.1, "expected the existing administrator");
    assert!(report.departments.iter().all(|(_, created)| !*created));
}

#[then("the administrator can log in with {password}")]
fn the_administrator_can_log_in(world: &BootstrapWorld, password: String) {
    let gate = SessionGate::new(
        Arc::new(world.store()),
        Arc::new(PlainTextHasher),
        Arc::new(MemorySessionTokenStore::default()),
        Arc::new(MutableClock::fixed()),
    );
    let credentials = LoginCredentials::try_from_parts("admin", &password).expect("credentials");
    let user = world
        .runtime()
        .block_on(gate.authenticate(&credentials))
        .expect("authentication should not fail");
    assert_eq!(user.map(|user| user.username), Some("admin".to_owned()));
}

#[then("the bootstrap reports a failure")]
fn the_bootstrap_reports_a_failure(world: &BootstrapWorld) {
    let result = world
        .last_result
        .get()
        .expect("bootstrap result should be set");
    assert!(result.is_err(), "expected failure, got {result:?}");
}

// -----------------------------------------------------------------------------
// Scenario Bindings
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/bootstrap.feature",
    name = "First run creates departments and the administrator"
)]
fn first_run_creates_departments_and_the_administrator(world: BootstrapWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/bootstrap.feature",
    name = "Second run changes nothing"
)]
fn second_run_changes_nothing(world: BootstrapWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/bootstrap.feature",
    name = "Failed commit leaves the store empty"
)]
fn failed_commit_leaves_the_store_empty(world: BootstrapWorld) {
    let _ = world;
}
