//! Console commands: collect a form, call one service, print the result.

use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use zeroize::Zeroizing;

use crate::domain::{
    Actor, Amount, ClientDraft, ClientId, ClientPatch, CollaboratorDraft, CollaboratorPatch,
    ContractDraft, ContractFilter, ContractId, ContractPatch, CrmServices, DomainError, EventDraft,
    EventId, EventPatch, Role, UserId,
};

use super::forms::{self, FormError};
use super::render;
use super::router::{Command, CommandHandler};
use super::Terminal;

/// Runs [`Command`]s for one authenticated user.
pub struct ConsoleCommands<'a, T: Terminal + ?Sized> {
    terminal: &'a mut T,
    services: &'a CrmServices,
    actor: Actor,
}

impl<'a, T: Terminal + ?Sized> ConsoleCommands<'a, T> {
    /// Commands acting as `actor` through `terminal`.
    pub fn new(terminal: &'a mut T, services: &'a CrmServices, actor: Actor) -> Self {
        Self {
            terminal,
            services,
            actor,
        }
    }

    fn say(&mut self, line: &str) -> Result<(), DomainError> {
        self.terminal.write_line(line).map_err(FormError::from)?;
        Ok(())
    }

    fn say_all(&mut self, lines: &[String]) -> Result<(), DomainError> {
        lines.iter().try_for_each(|line| self.say(line))
    }

    fn text(&mut self, prompt: &str) -> Result<Option<String>, DomainError> {
        Ok(forms::text(&mut *self.terminal, prompt)?)
    }

    fn required_text(&mut self, prompt: &str) -> Result<String, DomainError> {
        Ok(forms::required_text(&mut *self.terminal, prompt)?)
    }

    fn secret(&mut self, prompt: &str) -> Result<Option<Zeroizing<String>>, DomainError> {
        Ok(forms::secret(&mut *self.terminal, prompt)?)
    }

    fn parsed<V>(&mut self, prompt: &str) -> Result<Option<V>, DomainError>
    where
        V: FromStr,
        V::Err: Display,
    {
        Ok(forms::parsed(&mut *self.terminal, prompt)?)
    }

    fn required<V>(&mut self, prompt: &str) -> Result<V, DomainError>
    where
        V: FromStr,
        V::Err: Display,
    {
        Ok(forms::required(&mut *self.terminal, prompt)?)
    }

    fn date(&mut self, prompt: &str) -> Result<Option<NaiveDateTime>, DomainError> {
        Ok(forms::event_date(&mut *self.terminal, prompt)?)
    }

    fn required_date(&mut self, prompt: &str) -> Result<NaiveDateTime, DomainError> {
        self.date(prompt)?
            .ok_or_else(|| DomainError::invalid_request(format!("{prompt} is required")))
    }

    fn yes_no(&mut self, prompt: &str) -> Result<Option<bool>, DomainError> {
        Ok(forms::yes_no(&mut *self.terminal, prompt)?)
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool, DomainError> {
        Ok(forms::confirm(&mut *self.terminal, prompt)?)
    }

    async fn create_collaborator(&mut self) -> Result<(), DomainError> {
        let departments = self.services.collaborators.departments(&self.actor).await?;
        let names: Vec<&str> = departments.iter().map(|d| d.name.as_str()).collect();
        let department_prompt = format!("Department ({})", names.join("/"));
        let draft = CollaboratorDraft {
            name: self.required_text("Name")?,
            email: self.required_text("Email")?,
            username: self.required_text("Username")?,
            password: self
                .secret("Password")?
                .ok_or_else(|| DomainError::invalid_request("Password is required"))?,
            department: self.required_text(&department_prompt)?,
        };
        let user = self.services.collaborators.create(&self.actor, draft).await?;
        self.say(&format!(
            "Collaborator {} created with employee number {}.",
            user.username, user.employee_number
        ))
    }

    async fn update_collaborator(&mut self) -> Result<(), DomainError> {
        let id: UserId = self.required("Collaborator id")?;
        let current = self.services.collaborators.get(&self.actor, id).await?;
        self.say(&format!(
            "Updating {} ({}). Leave a field blank to keep it.",
            current.name, current.username
        ))?;
        let patch = CollaboratorPatch {
            name: self.text("Name")?,
            email: self.text("Email")?,
            username: self.text("Username")?,
            password: self.secret("New password")?,
            department: self.text("Department")?,
        };
        let user = self
            .services
            .collaborators
            .update(&self.actor, id, patch)
            .await?;
        self.say(&format!("Collaborator {} updated.", user.username))
    }

    async fn delete_collaborator(&mut self) -> Result<(), DomainError> {
        let id: UserId = self.required("Collaborator id")?;
        let current = self.services.collaborators.get(&self.actor, id).await?;
        if !self.confirm(&format!("Delete {} ({})?", current.name, current.username))? {
            return self.say("Deletion cancelled.");
        }
        let user = self.services.collaborators.delete(&self.actor, id).await?;
        self.say(&format!("Collaborator {} deleted.", user.username))
    }

    async fn list_collaborators(&mut self) -> Result<(), DomainError> {
        let users = self.services.collaborators.list(&self.actor).await?;
        let departments = self.services.collaborators.departments(&self.actor).await?;
        self.say_all(&render::collaborators(&users, &departments))
    }

    async fn create_client(&mut self) -> Result<(), DomainError> {
        let draft = ClientDraft {
            name: self.required_text("Name")?,
            email: self.required_text("Email")?,
            phone: self.text("Phone (optional)")?,
            company_name: self.text("Company (optional)")?,
        };
        let client = self.services.clients.create(&self.actor, draft).await?;
        self.say(&format!("Client {} created with id {}.", client.name, client.id))
    }

    async fn update_client(&mut self) -> Result<(), DomainError> {
        let id: ClientId = self.required("Client id")?;
        let current = self.services.clients.get(&self.actor, id).await?;
        self.say(&format!(
            "Updating {} <{}>. Leave a field blank to keep it.",
            current.name, current.email
        ))?;
        let patch = ClientPatch {
            name: self.text("Name")?,
            email: self.text("Email")?,
            phone: self.text("Phone")?,
            company_name: self.text("Company")?,
        };
        let client = self.services.clients.update(&self.actor, id, patch).await?;
        self.say(&format!("Client {} updated.", client.name))
    }

    async fn list_clients(&mut self) -> Result<(), DomainError> {
        let clients = self.services.clients.list(&self.actor).await?;
        self.say_all(&render::clients(&clients))
    }

    async fn search_clients(&mut self) -> Result<(), DomainError> {
        let fragment = self.required_text("Name contains")?;
        let clients = self.services.clients.search(&self.actor, &fragment).await?;
        self.say_all(&render::clients(&clients))
    }

    async fn create_contract(&mut self) -> Result<(), DomainError> {
        let client_id: ClientId = self.required("Client id")?;
        let owner = self
            .services
            .contracts
            .owner_for_client(&self.actor, client_id)
            .await?;
        let commercial_id = match owner {
            Some(owner) => {
                self.say(&format!("Owning commercial: {} (from the client).", owner.name))?;
                None
            }
            None if self.actor.role == Role::Commercial => Some(
                self.parsed("Commercial id (blank for yourself)")?
                    .unwrap_or(self.actor.user_id),
            ),
            None => Some(self.required("Commercial id")?),
        };
        let total: Amount = self.required("Total amount")?;
        let remaining: Amount = self.parsed("Remaining amount (blank for the total)")?.unwrap_or(total);
        let signed = self.yes_no("Signed")?.unwrap_or(false);
        let draft = ContractDraft {
            client_id,
            total,
            remaining,
            signed,
            commercial_id,
        };
        let contract = self.services.contracts.create(&self.actor, draft).await?;
        self.say(&format!(
            "Contract {} created for client {}.",
            contract.id, contract.client_id
        ))
    }

    async fn update_contract(&mut self) -> Result<(), DomainError> {
        let id: ContractId = self.required("Contract id")?;
        let current = self.services.contracts.get(&self.actor, id).await?;
        self.say(&format!(
            "Contract {}: total {}, remaining {}, signed {}. Leave a field blank to keep it.",
            current.id,
            current.total,
            current.remaining,
            if current.signed { "yes" } else { "no" }
        ))?;
        let patch = ContractPatch {
            total: self.parsed("Total amount")?,
            remaining: self.parsed("Remaining amount")?,
            signed: self.yes_no("Signed")?,
        };
        let contract = self.services.contracts.update(&self.actor, id, patch).await?;
        self.say(&format!("Contract {} updated.", contract.id))
    }

    async fn list_contracts(&mut self) -> Result<(), DomainError> {
        let contracts = self.services.contracts.list(&self.actor).await?;
        self.say_all(&render::contracts(&contracts))
    }

    async fn filter_contracts(&mut self, filter: ContractFilter) -> Result<(), DomainError> {
        let contracts = self.services.contracts.filter(&self.actor, filter).await?;
        self.say_all(&render::contracts(&contracts))
    }

    async fn create_event(&mut self) -> Result<(), DomainError> {
        let signed = self
            .services
            .contracts
            .filter(&self.actor, ContractFilter::Signed)
            .await?;
        if signed.is_empty() {
            return self.say("You have no signed contracts to create an event for.");
        }
        self.say("Your signed contracts:")?;
        self.say_all(&render::contracts(&signed))?;
        let draft = EventDraft {
            contract_id: self.required("Contract id")?,
            name: self.required_text("Event name")?,
            starts_at: self.required_date("Start (DD-MM-YYYY HH:MM)")?,
            ends_at: self.required_date("End (DD-MM-YYYY HH:MM)")?,
            location: self.required_text("Location")?,
            attendees: self.required("Attendees")?,
            notes: self.text("Notes (optional)")?,
        };
        let event = self.services.events.create(&self.actor, draft).await?;
        self.say(&format!("Event {} created with id {}.", event.name, event.id))
    }

    async fn update_event(&mut self) -> Result<(), DomainError> {
        let id: EventId = self.required("Event id")?;
        let current = self.services.events.get(&self.actor, id).await?;
        self.say(&format!(
            "Updating {}. Leave a field blank to keep it.",
            current.name
        ))?;
        let patch = EventPatch {
            name: self.text("Event name")?,
            starts_at: self.date("Start (DD-MM-YYYY HH:MM)")?,
            ends_at: self.date("End (DD-MM-YYYY HH:MM)")?,
            location: self.text("Location")?,
            attendees: self.parsed("Attendees")?,
            notes: self.text("Notes")?,
        };
        let event = self.services.events.update(&self.actor, id, patch).await?;
        self.say(&format!("Event {} updated.", event.name))
    }

    async fn assign_support(&mut self) -> Result<(), DomainError> {
        let staff = self.services.events.support_staff(&self.actor).await?;
        if staff.is_empty() {
            return self.say("There are no support collaborators to assign.");
        }
        self.say("Support collaborators:")?;
        let lines: Vec<String> = staff
            .iter()
            .map(|user| format!("  {}  {} ({})", user.id, user.name, user.username))
            .collect();
        self.say_all(&lines)?;
        let event_id: EventId = self.required("Event id")?;
        let support_id: UserId = self.required("Support collaborator id")?;
        let event = self
            .services
            .events
            .assign_support(&self.actor, event_id, support_id)
            .await?;
        self.say(&format!(
            "Collaborator {support_id} now supports event {}.",
            event.name
        ))
    }

    async fn list_events(&mut self) -> Result<(), DomainError> {
        let events = self.services.events.list(&self.actor).await?;
        self.say_all(&render::events(&events))
    }

    async fn list_events_without_support(&mut self) -> Result<(), DomainError> {
        let events = self.services.events.list_without_support(&self.actor).await?;
        self.say_all(&render::events(&events))
    }
}

#[async_trait]
impl<T: Terminal + ?Sized> CommandHandler for ConsoleCommands<'_, T> {
    async fn run(&mut self, command: Command) -> Result<(), DomainError> {
        match command {
            Command::CreateCollaborator => self.create_collaborator().await,
            Command::UpdateCollaborator => self.update_collaborator().await,
            Command::DeleteCollaborator => self.delete_collaborator().await,
            Command::ListCollaborators => self.list_collaborators().await,
            Command::CreateClient => self.create_client().await,
            Command::UpdateClient => self.update_client().await,
            Command::ListClients => self.list_clients().await,
            Command::SearchClients => self.search_clients().await,
            Command::CreateContract => self.create_contract().await,
            Command::UpdateContract => self.update_contract().await,
            Command::ListContracts => self.list_contracts().await,
            Command::FilterContracts(filter) => self.filter_contracts(filter).await,
            Command::CreateEvent => self.create_event().await,
            Command::UpdateEvent => self.update_event().await,
            Command::AssignSupport => self.assign_support().await,
            Command::ListEvents => self.list_events().await,
            Command::ListEventsWithoutSupport => self.list_events_without_support().await,
        }
    }
}
