//! Requester identity snapshot.

use serde::{Deserialize, Serialize};

use loandesk_core::{DomainError, DomainResult, ValueObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequesterRole {
    #[default]
    Student,
    Teacher,
    Administrative,
}

/// Who asked for the loan, captured at request time.
///
/// This is a copy, not a link to a person record: later edits to the person
/// never rewrite the loan history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Requester {
    pub full_name: String,
    /// National identity number (cédula).
    pub national_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: RequesterRole,
}

impl ValueObject for Requester {}

impl Requester {
    pub fn new(full_name: impl Into<String>, national_id: impl Into<String>, role: RequesterRole) -> Self {
        Self {
            full_name: full_name.into(),
            national_id: national_id.into(),
            email: None,
            phone: None,
            role,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Trimmed copy; name and national id are required.
    pub fn validated(&self) -> DomainResult<Self> {
        let full_name = collapse_whitespace(&self.full_name);
        if full_name.is_empty() {
            return Err(DomainError::validation("requester name is required"));
        }
        let national_id = self.national_id.trim().to_string();
        if national_id.is_empty() {
            return Err(DomainError::validation("requester national id is required"));
        }
        Ok(Self {
            full_name,
            national_id,
            email: trimmed(&self.email),
            phone: trimmed(&self.phone),
            role: self.role,
        })
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comparison key for names: case-insensitive, whitespace-collapsed.
pub(crate) fn name_key(name: &str) -> String {
    collapse_whitespace(name).to_lowercase()
}

/// Comparison key for national ids: separators dropped.
pub(crate) fn national_id_key(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}
