//! Field prompts turning raw lines into typed values.
//!
//! Blank answers become `None` so optional fields feed straight into the
//! domain patch types.

use std::fmt::Display;
use std::io;
use std::str::FromStr;

use chrono::NaiveDateTime;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::{EVENT_DATE_FORMAT, DomainError, parse_event_date};

use super::Terminal;

/// Why a form could not be completed.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("input closed")]
    InputClosed,
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Invalid(String),
}

impl From<FormError> for DomainError {
    fn from(value: FormError) -> Self {
        match value {
            FormError::Io(err) => Self::service_unavailable(format!("terminal error: {err}")),
            other => Self::invalid_request(other.to_string()),
        }
    }
}

fn answer<T: Terminal + ?Sized>(terminal: &mut T, prompt: &str) -> Result<String, FormError> {
    terminal
        .read_line(&format!("{prompt}: "))?
        .ok_or(FormError::InputClosed)
}

/// Optional text; blank input is `None`.
pub fn text<T: Terminal + ?Sized>(terminal: &mut T, prompt: &str) -> Result<Option<String>, FormError> {
    let raw = answer(terminal, prompt)?;
    let trimmed = raw.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()))
}

/// Text that must not be blank.
pub fn required_text<T: Terminal + ?Sized>(terminal: &mut T, prompt: &str) -> Result<String, FormError> {
    text(terminal, prompt)?.ok_or_else(|| FormError::Invalid(format!("{prompt} is required")))
}

/// Non-echoed secret; blank input is `None`.
pub fn secret<T: Terminal + ?Sized>(
    terminal: &mut T,
    prompt: &str,
) -> Result<Option<Zeroizing<String>>, FormError> {
    let raw = Zeroizing::new(
        terminal
            .read_secret(&format!("{prompt}: "))?
            .ok_or(FormError::InputClosed)?,
    );
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(raw))
}

/// Optional value parsed with [`FromStr`].
pub fn parsed<T, V>(terminal: &mut T, prompt: &str) -> Result<Option<V>, FormError>
where
    T: Terminal + ?Sized,
    V: FromStr,
    V::Err: Display,
{
    text(terminal, prompt)?
        .map(|raw| {
            raw.parse::<V>()
                .map_err(|err| FormError::Invalid(format!("{prompt}: {err}")))
        })
        .transpose()
}

/// Required value parsed with [`FromStr`].
pub fn required<T, V>(terminal: &mut T, prompt: &str) -> Result<V, FormError>
where
    T: Terminal + ?Sized,
    V: FromStr,
    V::Err: Display,
{
    parsed(terminal, prompt)?.ok_or_else(|| FormError::Invalid(format!("{prompt} is required")))
}

/// Optional `DD-MM-YYYY HH:MM` date.
pub fn event_date<T: Terminal + ?Sized>(
    terminal: &mut T,
    prompt: &str,
) -> Result<Option<NaiveDateTime>, FormError> {
    text(terminal, prompt)?
        .map(|raw| {
            parse_event_date(&raw).map_err(|_| {
                FormError::Invalid(format!(
                    "{prompt}: '{raw}' does not match {EVENT_DATE_FORMAT}"
                ))
            })
        })
        .transpose()
}

/// Optional yes/no answer.
pub fn yes_no<T: Terminal + ?Sized>(terminal: &mut T, prompt: &str) -> Result<Option<bool>, FormError> {
    let Some(raw) = text(terminal, &format!("{prompt} (y/n)"))? else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(Some(true)),
        "n" | "no" => Ok(Some(false)),
        _ => Err(FormError::Invalid(format!("{prompt}: answer y or n"))),
    }
}

/// Yes/no where anything but an explicit yes means no.
pub fn confirm<T: Terminal + ?Sized>(terminal: &mut T, prompt: &str) -> Result<bool, FormError> {
    match yes_no(terminal, prompt) {
        Ok(answer) => Ok(answer == Some(true)),
        Err(FormError::Invalid(_)) => Ok(false),
        Err(err) => Err(err),
    }
}
