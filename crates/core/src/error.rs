//! Errors raised by pure domain code.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Rejected input. Lookups and persistence failures are reported by the store,
/// not here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Field-level rule broken (blank name, negative count).
    #[error("{0}")]
    Validation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
