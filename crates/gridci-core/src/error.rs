//! Error types for gridci.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors (fatal at load time)
    #[error("Invalid ref pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Matrix axis is empty")]
    EmptyMatrix,

    #[error("Unknown target identifier: {0}")]
    UnknownTarget(String),

    #[error("Duplicate target identifier: {0}")]
    DuplicateTarget(String),

    #[error("Command template is empty")]
    EmptyCommand,

    #[error("No trigger rules configured")]
    NoRules,

    #[error("Invalid configuration: {0}")]
    Config(String),

    // Run errors
    #[error("Invalid run transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Run already completed")]
    RunAlreadyCompleted,

    // Engine errors (infrastructure, distinct from a failing test command)
    #[error("Execution engine failure on target {target}: {message}")]
    EngineFailure { target: String, message: String },

    // Infrastructure errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
