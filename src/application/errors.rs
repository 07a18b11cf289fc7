//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Send error: {0}")]
    Send(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// True when the error signals a broken store invariant
    pub fn is_corruption(&self) -> bool {
        match self {
            BotError::Storage(e) => e.is_corruption(),
            BotError::Command(CommandError::Storage(e)) => e.is_corruption(),
            _ => false,
        }
    }
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Corruption(#[from] CorruptionError),
}

impl StorageError {
    pub fn is_corruption(&self) -> bool {
        matches!(self, StorageError::Corruption(_))
    }
}

/// A reserved key holds a value of the wrong shape
///
/// Never caused by user input: some earlier writer broke the store's type
/// contract. Callers abort the current call path instead of recovering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("store corruption: {scope} key '{key}' holds {found}, expected {expected}")]
pub struct CorruptionError {
    pub scope: String,
    pub key: String,
    pub expected: &'static str,
    pub found: &'static str,
}

/// Argument parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("insufficient arguments: expected {expected}, got {got}")]
    Insufficient { expected: usize, got: usize },

    #[error("too many arguments: expected {expected}, got {got}")]
    TooMany { expected: usize, got: usize },

    #[error("unknown parameter type: {0}")]
    UnknownType(String),

    #[error("invalid {ty} '{token}': {reason}")]
    Invalid {
        ty: String,
        token: String,
        reason: String,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
