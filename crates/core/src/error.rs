//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure here is a local business-rule or validation failure: there is
/// no IO underneath the domain crates. Callers map each variant to a user-facing
/// message through [`DomainError::code`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (bad date ordering, missing field, duplicate key).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced catalog entity or item does not exist or is deactivated.
    #[error("unresolved reference: {0}")]
    Reference(String),

    /// A parent edit would make an entity its own ancestor.
    #[error("hierarchy cycle: {0}")]
    Cycle(String),

    /// No free unit of an item in the requested window.
    #[error("no capacity: {0}")]
    Capacity(String),

    /// The requester is currently sanctioned.
    #[error("requester is deny-listed: {0}")]
    DenyListed(String),

    /// Illegal transition (e.g. returning a loan twice).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A record addressed by id does not exist (or is no longer usable).
    #[error("not found: {0}")]
    NotFound(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn reference(msg: impl Into<String>) -> Self {
        Self::Reference(msg.into())
    }

    pub fn cycle(msg: impl Into<String>) -> Self {
        Self::Cycle(msg.into())
    }

    pub fn capacity(msg: impl Into<String>) -> Self {
        Self::Capacity(msg.into())
    }

    pub fn deny_listed(msg: impl Into<String>) -> Self {
        Self::DenyListed(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Stable machine-readable code for this error class.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::Reference(_) => "reference_error",
            DomainError::Cycle(_) => "cycle_error",
            DomainError::Capacity(_) => "capacity_error",
            DomainError::DenyListed(_) => "deny_list_error",
            DomainError::InvalidState(_) => "invalid_state",
            DomainError::NotFound(_) => "not_found",
            DomainError::InvalidId(_) => "invalid_id",
        }
    }
}
