//! Error types for shellix.
//!
//! Errors are categorized by how the request boundary reports them:
//! - [`ShellixError::Validation`], [`ShellixError::NotFound`],
//!   [`ShellixError::AlreadyExists`]: guidance for the user, no engine call made
//! - [`ShellixError::EngineUnreachable`]: the engine could not be reached at all
//! - [`ShellixError::EngineOperation`]: the engine answered but the call failed
//!
//! A command that exits non-zero inside a container is not an error; it is
//! folded into the command output.

use thiserror::Error;

/// Result alias used across shellix crates.
pub type ShellixResult<T> = Result<T, ShellixError>;

#[derive(Debug, Error)]
pub enum ShellixError {
    /// Missing or invalid argument (no path, unknown distribution, ...).
    #[error("invalid request: {0}")]
    Validation(String),

    /// The operation needs a live container and there is none.
    #[error("not found: {0}")]
    NotFound(String),

    /// A container already exists for this user.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The engine binary or daemon could not be reached.
    #[error("container engine unreachable: {0}")]
    EngineUnreachable(String),

    /// The engine was reachable but rejected the operation.
    #[error("{op} {name} failed: {message}")]
    EngineOperation {
        op: &'static str,
        name: String,
        message: String,
    },

    /// A fetched file exceeded the configured size bound.
    #[error("file exceeds the {limit} byte limit")]
    FileTooLarge { limit: u64 },

    /// Invalid configuration detected at startup.
    #[error("config: {0}")]
    Config(String),

    /// The chat transport failed to deliver or receive.
    #[error("transport: {0}")]
    Transport(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal: {0}")]
    Internal(String),
}

impl ShellixError {
    /// Whether this error is guidance for the user rather than a failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ShellixError::Validation(_) | ShellixError::NotFound(_) | ShellixError::AlreadyExists(_)
        )
    }
}

impl From<serde_json::Error> for ShellixError {
    fn from(err: serde_json::Error) -> Self {
        ShellixError::Config(err.to_string())
    }
}
