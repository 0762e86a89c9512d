use thiserror::Error;

use loandesk_auth::AuthzError;
use loandesk_core::DomainError;

pub type DeskResult<T> = Result<T, DeskError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeskError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),
}

impl DeskError {
    /// Stable code for presentation-layer message lookup.
    pub fn code(&self) -> &'static str {
        match self {
            DeskError::Domain(err) => err.code(),
            DeskError::Forbidden(_) => "forbidden",
        }
    }

    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            DeskError::Domain(err) => Some(err),
            DeskError::Forbidden(_) => None,
        }
    }
}
