//! Plain-text tables for record listings.

use chrono::{DateTime, Utc};

use crate::domain::{Client, Collaborator, Contract, Department, EVENT_DATE_FORMAT, Event};

const SEPARATOR: &str = "  ";
const EMPTY: &str = "-";

struct Table {
    headers: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: &'static [&'static str]) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }

    fn lines(&self, noun: &str) -> Vec<String> {
        if self.rows.is_empty() {
            return vec![format!("No {noun} found.")];
        }
        let widths = self.widths();
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(format_row(self.headers.iter().copied(), &widths));
        lines.push(
            widths
                .iter()
                .map(|width| "-".repeat(*width))
                .collect::<Vec<_>>()
                .join(SEPARATOR),
        );
        for row in &self.rows {
            lines.push(format_row(row.iter().map(String::as_str), &widths));
        }
        lines
    }
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
        .trim_end()
        .to_owned()
}

fn optional(value: Option<&str>) -> String {
    value.unwrap_or(EMPTY).to_owned()
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.format(EVENT_DATE_FORMAT).to_string()
}

/// Client listing.
pub fn clients(rows: &[Client]) -> Vec<String> {
    let mut table = Table::new(&[
        "ID", "Name", "Email", "Phone", "Company", "Commercial", "Created", "Updated",
    ]);
    for client in rows {
        table.row(vec![
            client.id.to_string(),
            client.name.clone(),
            client.email.clone(),
            optional(client.phone.as_deref()),
            optional(client.company_name.as_deref()),
            client
                .commercial_id
                .map_or_else(|| EMPTY.to_owned(), |id| id.to_string()),
            timestamp(client.created_at),
            timestamp(client.last_updated_at),
        ]);
    }
    table.lines("clients")
}

/// Contract listing.
pub fn contracts(rows: &[Contract]) -> Vec<String> {
    let mut table = Table::new(&[
        "ID", "Client", "Commercial", "Total", "Remaining", "Signed", "Created", "Updated",
    ]);
    for contract in rows {
        table.row(vec![
            contract.id.to_string(),
            contract.client_id.to_string(),
            contract.commercial_id.to_string(),
            contract.total.to_string(),
            contract.remaining.to_string(),
            if contract.signed { "yes" } else { "no" }.to_owned(),
            timestamp(contract.created_at),
            timestamp(contract.last_updated_at),
        ]);
    }
    table.lines("contracts")
}

/// Event listing.
pub fn events(rows: &[Event]) -> Vec<String> {
    let mut table = Table::new(&[
        "ID", "Name", "Contract", "Support", "Start", "End", "Location", "Attendees", "Notes",
    ]);
    for event in rows {
        table.row(vec![
            event.id.to_string(),
            event.name.clone(),
            event.contract_id.to_string(),
            event
                .support_id
                .map_or_else(|| EMPTY.to_owned(), |id| id.to_string()),
            event.starts_at.format(EVENT_DATE_FORMAT).to_string(),
            event.ends_at.format(EVENT_DATE_FORMAT).to_string(),
            event.location.clone(),
            event.attendees.to_string(),
            optional(event.notes.as_deref()),
        ]);
    }
    table.lines("events")
}

/// Collaborator listing with department names resolved from `departments`.
pub fn collaborators(rows: &[Collaborator], departments: &[Department]) -> Vec<String> {
    let mut table = Table::new(&[
        "ID", "Employee no.", "Name", "Email", "Username", "Department",
    ]);
    for user in rows {
        let department = user.department_id.and_then(|id| {
            departments
                .iter()
                .find(|department| department.id == id)
                .map(|department| department.name.as_str())
        });
        table.row(vec![
            user.id.to_string(),
            user.employee_number.clone(),
            user.name.clone(),
            user.email.clone(),
            user.username.clone(),
            optional(department),
        ]);
    }
    table.lines("collaborators")
}
