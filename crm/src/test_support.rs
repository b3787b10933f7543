//! Test utilities for the crm crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Only compiled for tests or with the `test-support` feature.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use tempfile::TempDir;

use crate::domain::ports::{
    CrmStore, PasswordHashError, PasswordHasher, SessionTokenError, SessionTokenStore,
};
use crate::domain::{
    Actor, Collaborator, Department, NewCollaborator, NewDepartment, Role, SessionClaims,
};
use crate::inbound::cli::Terminal;
use crate::outbound::memory::InMemoryCrmStore;
use crate::outbound::session::FileSessionTokenStore;

/// Clock whose time only moves when told to.
#[derive(Debug, Clone)]
pub struct MutableClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl MutableClock {
    /// Clock frozen at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Clock frozen at 2024-06-01 09:00 UTC.
    pub fn fixed() -> Self {
        let now = Utc
            .with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("fixture timestamp must be valid"));
        Self::new(now)
    }

    /// Move the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.lock_clock();
        *now += by;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Hasher that stores `plain$<password>`. Fast and readable in assertions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextHasher;

impl PasswordHasher for PlainTextHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        hash.strip_prefix("plain$")
            .map(|stored| stored == password)
            .ok_or_else(|| PasswordHashError::malformed_hash(hash))
    }
}

/// Session token slot kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionTokenStore {
    slot: Arc<Mutex<Option<SessionClaims>>>,
}

impl MemorySessionTokenStore {
    /// Currently stored claims.
    pub fn current(&self) -> Option<SessionClaims> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl SessionTokenStore for MemorySessionTokenStore {
    fn load(&self) -> Result<Option<SessionClaims>, SessionTokenError> {
        Ok(self.current())
    }

    fn save(&self, claims: &SessionClaims) -> Result<(), SessionTokenError> {
        *self
            .slot
            .lock()
            .map_err(|_| SessionTokenError::io("slot poisoned"))? = Some(claims.clone());
        Ok(())
    }

    fn clear(&self) -> Result<bool, SessionTokenError> {
        Ok(self
            .slot
            .lock()
            .map_err(|_| SessionTokenError::io("slot poisoned"))?
            .take()
            .is_some())
    }
}

/// Token file store rooted in a temporary directory.
pub struct TempTokenFile {
    /// Keeps the directory alive for the lifetime of the fixture.
    pub dir: TempDir,
    pub store: FileSessionTokenStore,
}

impl TempTokenFile {
    /// Fresh token and key files in a new temporary directory.
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let key = FileSessionTokenStore::load_or_create_key(&dir.path().join("session.key"))?;
        let store = FileSessionTokenStore::new(dir.path().join("session.json"), key);
        Ok(Self { dir, store })
    }
}

/// Terminal fed from a script; output is captured.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    input: VecDeque<String>,
    output: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTerminal {
    /// Terminal that answers prompts with `lines`, then reports closed input.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: lines.into_iter().map(Into::into).collect(),
            output: Arc::default(),
        }
    }

    /// Handle to the captured output, usable after the terminal moves.
    pub fn transcript(&self) -> Transcript {
        Transcript(Arc::clone(&self.output))
    }

    fn record(&self, line: String) {
        self.output
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(line);
    }
}

/// Captured terminal output.
#[derive(Debug, Clone)]
pub struct Transcript(Arc<Mutex<Vec<String>>>);

impl Transcript {
    /// Every printed line and prompt so far.
    pub fn lines(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl Terminal for ScriptedTerminal {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.record(prompt.to_owned());
        Ok(self.input.pop_front())
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.read_line(prompt)
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.record(line.to_owned());
        Ok(())
    }
}

/// One collaborator per role plus a second commercial.
#[derive(Debug, Clone)]
pub struct Staff {
    pub departments: Vec<Department>,
    pub gestion: Collaborator,
    pub commercial: Collaborator,
    pub other_commercial: Collaborator,
    pub support: Collaborator,
}

impl Staff {
    /// Actor for a seeded collaborator.
    pub fn actor(user: &Collaborator, role: Role) -> Actor {
        Actor::new(user.id, role)
    }

    /// Actor for the gestion account.
    pub fn gestion_actor(&self) -> Actor {
        Self::actor(&self.gestion, Role::Gestion)
    }

    /// Actor for the first commercial.
    pub fn commercial_actor(&self) -> Actor {
        Self::actor(&self.commercial, Role::Commercial)
    }

    /// Actor for the second commercial.
    pub fn other_commercial_actor(&self) -> Actor {
        Self::actor(&self.other_commercial, Role::Commercial)
    }

    /// Actor for the support account.
    pub fn support_actor(&self) -> Actor {
        Self::actor(&self.support, Role::Support)
    }
}

/// Seed departments and four collaborators; every password is `password1`.
///
/// # Panics
/// Panics when the store rejects the fixture rows.
pub async fn seed_staff(store: &InMemoryCrmStore) -> Staff {
    let mut uow = store
        .begin()
        .await
        .unwrap_or_else(|err| panic!("begin failed: {err}"));
    let mut departments = Vec::new();
    for role in Role::ALL {
        let department = uow
            .insert_department(&NewDepartment::for_role(role))
            .await
            .unwrap_or_else(|err| panic!("department insert failed: {err}"));
        departments.push(department);
    }
    let department_of = |role: Role| {
        departments
            .iter()
            .find(|department| department.role() == Some(role))
            .map(|department| department.id)
    };
    let mut users = Vec::new();
    for (index, (username, role)) in [
        ("gina", Role::Gestion),
        ("carl", Role::Commercial),
        ("cora", Role::Commercial),
        ("sam", Role::Support),
    ]
    .into_iter()
    .enumerate()
    {
        let user = uow
            .insert_user(&NewCollaborator {
                employee_number: format!("EMP-{:08}", index + 1),
                name: username.to_owned(),
                email: format!("{username}@example.com"),
                username: username.to_owned(),
                password_hash: "plain$password1".to_owned(),
                department_id: department_of(role),
            })
            .await
            .unwrap_or_else(|err| panic!("user insert failed: {err}"));
        users.push(user);
    }
    uow.commit()
        .await
        .unwrap_or_else(|err| panic!("commit failed: {err}"));
    let mut users = users.into_iter();
    let mut next = || {
        users
            .next()
            .unwrap_or_else(|| panic!("fixture users exhausted"))
    };
    Staff {
        departments,
        gestion: next(),
        commercial: next(),
        other_commercial: next(),
        support: next(),
    }
}
