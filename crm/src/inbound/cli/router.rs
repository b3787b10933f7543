//! Lookup from menu selections to console commands.
//!
//! Routes are static tables keyed by `(domain, role, option)`; direct actions
//! are keyed by name. Nothing a command returns escapes the router: failures
//! come back as an [`Outcome`] for the session loop to print.

use async_trait::async_trait;
use tracing::{error, warn};

use crate::domain::{ContractFilter, DomainError, Role};

/// Record family a submenu works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Collaborator,
    Client,
    Contract,
    ContractFilter,
    Event,
}

impl Domain {
    /// Lower-case name used in log fields and messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collaborator => "collaborator",
            Self::Client => "client",
            Self::Contract => "contract",
            Self::ContractFilter => "contract filter",
            Self::Event => "event",
        }
    }
}

/// Every operation the console can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    CreateCollaborator,
    UpdateCollaborator,
    DeleteCollaborator,
    ListCollaborators,
    CreateClient,
    UpdateClient,
    ListClients,
    SearchClients,
    CreateContract,
    UpdateContract,
    ListContracts,
    FilterContracts(ContractFilter),
    CreateEvent,
    UpdateEvent,
    AssignSupport,
    ListEvents,
    ListEventsWithoutSupport,
}

/// `(domain, role, option, command)`.
pub type Route = (Domain, Role, &'static str, Command);

const ROUTES: &[Route] = &[
    (Domain::Collaborator, Role::Gestion, "1", Command::CreateCollaborator),
    (Domain::Collaborator, Role::Gestion, "2", Command::UpdateCollaborator),
    (Domain::Collaborator, Role::Gestion, "3", Command::DeleteCollaborator),
    (Domain::Collaborator, Role::Gestion, "4", Command::ListCollaborators),
    (Domain::Contract, Role::Gestion, "1", Command::CreateContract),
    (Domain::Contract, Role::Gestion, "2", Command::UpdateContract),
    (Domain::Contract, Role::Gestion, "3", Command::ListContracts),
    (Domain::Event, Role::Gestion, "1", Command::UpdateEvent),
    (Domain::Event, Role::Gestion, "2", Command::AssignSupport),
    (Domain::Event, Role::Gestion, "3", Command::ListEvents),
    (Domain::Event, Role::Gestion, "4", Command::ListEventsWithoutSupport),
    (Domain::Client, Role::Commercial, "1", Command::ListClients),
    (Domain::Client, Role::Commercial, "2", Command::UpdateClient),
    (Domain::Client, Role::Commercial, "3", Command::SearchClients),
    (Domain::Contract, Role::Commercial, "1", Command::ListContracts),
    (Domain::Contract, Role::Commercial, "2", Command::UpdateContract),
    (Domain::Contract, Role::Commercial, "3", Command::CreateContract),
    (
        Domain::ContractFilter,
        Role::Commercial,
        "1",
        Command::FilterContracts(ContractFilter::Unsigned),
    ),
    (
        Domain::ContractFilter,
        Role::Commercial,
        "2",
        Command::FilterContracts(ContractFilter::Unpaid),
    ),
    (
        Domain::ContractFilter,
        Role::Commercial,
        "3",
        Command::FilterContracts(ContractFilter::Signed),
    ),
];

const DIRECT_ACTIONS: &[(&str, Command)] = &[
    ("list_all_clients", Command::ListClients),
    ("list_all_contracts", Command::ListContracts),
    ("create_client", Command::CreateClient),
    ("create_event", Command::CreateEvent),
    ("list_assigned_events", Command::ListEvents),
    ("update_event", Command::UpdateEvent),
];

/// Runs commands on behalf of the router.
#[async_trait]
pub trait CommandHandler: Send {
    /// Execute one command to completion.
    async fn run(&mut self, command: Command) -> Result<(), DomainError>;
}

/// Result of routing one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed(DomainError),
    NotFound(String),
}

impl Outcome {
    /// Line to show the user, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Completed => None,
            Self::Failed(err) => Some(format!("Error: {}", err.message())),
            Self::NotFound(what) => Some(format!("Command not found: {what}")),
        }
    }
}

/// Static routing tables.
#[derive(Debug, Clone, Copy)]
pub struct CommandRouter {
    routes: &'static [Route],
    direct: &'static [(&'static str, Command)],
}

impl Default for CommandRouter {
    fn default() -> Self {
        Self {
            routes: ROUTES,
            direct: DIRECT_ACTIONS,
        }
    }
}

impl CommandRouter {
    /// Router over custom tables.
    pub fn with_tables(
        routes: &'static [Route],
        direct: &'static [(&'static str, Command)],
    ) -> Self {
        Self { routes, direct }
    }

    /// Command registered for `option` of `domain` under `role`.
    pub fn lookup(&self, domain: Domain, role: Role, option: &str) -> Option<Command> {
        self.routes
            .iter()
            .find(|(d, r, o, _)| *d == domain && *r == role && *o == option)
            .map(|(_, _, _, command)| *command)
    }

    /// Command registered under a direct action name.
    pub fn lookup_direct(&self, action: &str) -> Option<Command> {
        self.direct
            .iter()
            .find(|(name, _)| *name == action)
            .map(|(_, command)| *command)
    }

    /// Run the command for a submenu selection.
    pub async fn execute<H>(&self, handler: &mut H, domain: Domain, role: Role, option: &str) -> Outcome
    where
        H: CommandHandler + ?Sized,
    {
        match self.lookup(domain, role, option) {
            Some(command) => run(handler, command).await,
            None => {
                warn!(domain = domain.as_str(), %role, option, "no command registered");
                Outcome::NotFound(format!("{} option {option}", domain.as_str()))
            }
        }
    }

    /// Run a top-menu direct action.
    pub async fn execute_direct<H>(&self, handler: &mut H, action: &str) -> Outcome
    where
        H: CommandHandler + ?Sized,
    {
        match self.lookup_direct(action) {
            Some(command) => run(handler, command).await,
            None => {
                warn!(action, "no direct action registered");
                Outcome::NotFound(action.to_owned())
            }
        }
    }
}

async fn run<H>(handler: &mut H, command: Command) -> Outcome
where
    H: CommandHandler + ?Sized,
{
    match handler.run(command).await {
        Ok(()) => Outcome::Completed,
        Err(err) => {
            if err.is_system() {
                error!(?command, code = ?err.code(), message = err.message(), "command failed");
            }
            Outcome::Failed(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Default)]
    struct Recorder {
        ran: Vec<Command>,
        fail_with: Option<DomainError>,
    }

    #[async_trait]
    impl CommandHandler for Recorder {
        async fn run(&mut self, command: Command) -> Result<(), DomainError> {
            self.ran.push(command);
            self.fail_with.clone().map_or(Ok(()), Err)
        }
    }

    #[rstest]
    #[case(Domain::Collaborator, Role::Gestion, "3", Some(Command::DeleteCollaborator))]
    #[case(Domain::Event, Role::Gestion, "4", Some(Command::ListEventsWithoutSupport))]
    #[case(
        Domain::ContractFilter,
        Role::Commercial,
        "3",
        Some(Command::FilterContracts(ContractFilter::Signed))
    )]
    #[case(Domain::Collaborator, Role::Commercial, "1", None)]
    #[case(Domain::Contract, Role::Support, "1", None)]
    #[case(Domain::Client, Role::Commercial, "9", None)]
    fn routes_are_keyed_by_domain_role_and_option(
        #[case] domain: Domain,
        #[case] role: Role,
        #[case] option: &str,
        #[case] expected: Option<Command>,
    ) {
        assert_eq!(CommandRouter::default().lookup(domain, role, option), expected);
    }

    #[tokio::test]
    async fn execute_runs_the_registered_command() {
        let mut handler = Recorder::default();

        let outcome = CommandRouter::default()
            .execute(&mut handler, Domain::Client, Role::Commercial, "3")
            .await;

        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(handler.ran, vec![Command::SearchClients]);
    }

    #[tokio::test]
    async fn unknown_routes_run_nothing() {
        let mut handler = Recorder::default();
        let router = CommandRouter::default();

        let routed = router
            .execute(&mut handler, Domain::Event, Role::Support, "1")
            .await;
        let direct = router.execute_direct(&mut handler, "export_everything").await;

        assert!(matches!(routed, Outcome::NotFound(_)));
        assert_eq!(
            direct.message().as_deref(),
            Some("Command not found: export_everything")
        );
        assert!(handler.ran.is_empty());
    }

    #[tokio::test]
    async fn failures_are_returned_not_raised() {
        let mut handler = Recorder {
            fail_with: Some(DomainError::forbidden("nope")),
            ..Recorder::default()
        };

        let outcome = CommandRouter::default()
            .execute_direct(&mut handler, "create_event")
            .await;

        assert_eq!(outcome, Outcome::Failed(DomainError::forbidden("nope")));
        assert_eq!(outcome.message().as_deref(), Some("Error: nope"));
        assert_eq!(handler.ran, vec![Command::CreateEvent]);
    }

    #[tokio::test]
    async fn custom_tables_replace_the_defaults() {
        static ONLY: &[(&str, Command)] = &[("list", Command::ListClients)];
        let router = CommandRouter::with_tables(&[], ONLY);
        let mut handler = Recorder::default();

        assert_eq!(router.execute_direct(&mut handler, "list").await, Outcome::Completed);
        assert!(matches!(
            router
                .execute(&mut handler, Domain::Collaborator, Role::Gestion, "1")
                .await,
            Outcome::NotFound(_)
        ));
    }
}
