//! Domain errors.

use thiserror::Error;

/// Raised when a value object is constructed from invalid input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("client id must not be empty")]
    ClientIdEmpty,

    #[error("client id is too long ({0} bytes)")]
    ClientIdTooLong(usize),

    #[error("player name must not be empty")]
    PlayerNameEmpty,

    #[error("player name is too long ({0} characters)")]
    PlayerNameTooLong(usize),

    #[error("identity is too long ({0} bytes)")]
    IdentityTooLong(usize),
}

/// Raised by the repository layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("no {0} slot available")]
    NoSlotAvailable(&'static str),
}

/// Raised when pushing a command to a client fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("push failed: {0}")]
    PushFailed(String),
}
