//! Interactive session: login, menus, logout, repeat.
//!
//! The loop only ends when the operator answers `quit` at the username
//! prompt or input closes. Command failures are printed and never end it.

use std::io;

use tracing::warn;
use zeroize::Zeroizing;

use crate::domain::{
    Actor, Collaborator, CrmServices, LoginCredentials, Role, RoleResolver, SessionGate,
};

use super::commands::ConsoleCommands;
use super::menu::{MenuNavigator, Selection};
use super::router::{CommandRouter, Outcome};
use super::Terminal;

/// Username answer that leaves the console.
pub const QUIT: &str = "quit";

const BANNER: &[&str] = &[
    "==============================",
    "        CRM staff console",
    "==============================",
];

enum Navigation {
    LoggedOut,
    InputClosed,
}

/// Drives one terminal through login and the role menus.
pub struct SessionLoop<T: Terminal> {
    terminal: T,
    gate: SessionGate,
    roles: RoleResolver,
    services: CrmServices,
    router: CommandRouter,
}

impl<T: Terminal> SessionLoop<T> {
    /// Loop over `terminal` using the default command table.
    pub fn new(terminal: T, gate: SessionGate, roles: RoleResolver, services: CrmServices) -> Self {
        Self {
            terminal,
            gate,
            roles,
            services,
            router: CommandRouter::default(),
        }
    }

    /// Hand the terminal back, e.g. to inspect a scripted transcript.
    pub fn into_terminal(self) -> T {
        self.terminal
    }

    /// Run until the operator quits or input closes.
    pub async fn run(&mut self) -> io::Result<()> {
        for line in BANNER {
            self.terminal.write_line(line)?;
        }
        loop {
            let user = match self.gate.resume().await {
                Some(user) => {
                    self.terminal
                        .write_line(&format!("Session restored for {}.", user.username))?;
                    user
                }
                None => match self.login().await? {
                    Some(user) => user,
                    None => break,
                },
            };
            let Some(role) = self.role_of(&user).await? else {
                self.logout()?;
                continue;
            };
            self.terminal
                .write_line(&format!("Logged in as {} ({role}).", user.name))?;
            match self.navigate(Actor::new(user.id, role)).await? {
                Navigation::LoggedOut => self.logout()?,
                Navigation::InputClosed => break,
            }
        }
        self.terminal.write_line("Goodbye.")
    }

    async fn login(&mut self) -> io::Result<Option<Collaborator>> {
        loop {
            let prompt = format!("Username (or '{QUIT}'): ");
            let Some(username) = self.terminal.read_line(&prompt)? else {
                return Ok(None);
            };
            if username.trim().eq_ignore_ascii_case(QUIT) {
                return Ok(None);
            }
            let Some(password) = self.terminal.read_secret("Password: ")?.map(Zeroizing::new)
            else {
                return Ok(None);
            };
            let credentials = match LoginCredentials::try_from_parts(&username, &password) {
                Ok(credentials) => credentials,
                Err(err) => {
                    self.terminal.write_line(&format!("Error: {err}"))?;
                    continue;
                }
            };
            match self.gate.authenticate(&credentials).await {
                Ok(Some(user)) => {
                    if let Err(err) = self.gate.persist(&user) {
                        self.terminal.write_line(&format!(
                            "Warning: the session could not be saved: {}",
                            err.message()
                        ))?;
                    }
                    self.terminal.write_line("Login successful.")?;
                    return Ok(Some(user));
                }
                Ok(None) => self.terminal.write_line("Invalid username or password.")?,
                Err(err) => self
                    .terminal
                    .write_line(&format!("Error: {}", err.message()))?,
            }
        }
    }

    async fn role_of(&mut self, user: &Collaborator) -> io::Result<Option<Role>> {
        match self.roles.resolve(user).await {
            Ok(Some(role)) => Ok(Some(role)),
            Ok(None) => {
                warn!(user_id = %user.id, "user has no usable department; forcing logout");
                self.terminal
                    .write_line("Your account has no valid department. You have been logged out.")?;
                Ok(None)
            }
            Err(err) => {
                self.terminal
                    .write_line(&format!("Error: {}", err.message()))?;
                Ok(None)
            }
        }
    }

    fn logout(&mut self) -> io::Result<()> {
        match self.gate.logout() {
            Ok(_) => self.terminal.write_line("Logged out."),
            Err(err) => self
                .terminal
                .write_line(&format!("Error: {}", err.message())),
        }
    }

    fn show_menu(&mut self, navigator: &MenuNavigator) -> io::Result<()> {
        self.terminal.write_line("")?;
        self.terminal
            .write_line(&format!("== {} ==", navigator.title()))?;
        for item in navigator.items() {
            self.terminal
                .write_line(&format!("  {}. {}", item.code, item.label))?;
        }
        Ok(())
    }

    async fn navigate(&mut self, actor: Actor) -> io::Result<Navigation> {
        let mut navigator = MenuNavigator::new(actor.role);
        loop {
            self.show_menu(&navigator)?;
            let Some(choice) = self.terminal.read_line("Choice: ")? else {
                return Ok(Navigation::InputClosed);
            };
            let outcome = match navigator.select(&choice) {
                Selection::Invalid => {
                    self.terminal.write_line("Invalid option, try again.")?;
                    continue;
                }
                Selection::NotFound => {
                    self.terminal.write_line("Not found.")?;
                    continue;
                }
                Selection::EnteredSubmenu(_) | Selection::BackToTop => continue,
                Selection::LoggedOut => return Ok(Navigation::LoggedOut),
                Selection::Dispatch { domain, option } => {
                    let mut commands =
                        ConsoleCommands::new(&mut self.terminal, &self.services, actor);
                    self.router
                        .execute(&mut commands, domain, actor.role, &option)
                        .await
                }
                Selection::Direct(action) => {
                    let mut commands =
                        ConsoleCommands::new(&mut self.terminal, &self.services, actor);
                    self.router.execute_direct(&mut commands, action).await
                }
            };
            if let Some(message) = outcome.message() {
                self.terminal.write_line(&message)?;
            }
            if matches!(outcome, Outcome::Failed(ref err) if err.is_system()) {
                self.terminal
                    .write_line("The failure has been logged; you can keep working.")?;
            }
        }
    }
}
