//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for TicketDesk
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DeskError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every value of the customer code space has been handed out.
    #[error("Customer code space exhausted")]
    CodeSpaceExhausted,

    /// A stored customer code could not be decoded. Signals corrupt data.
    #[error("Invalid customer code: {0:?}")]
    InvalidCode(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeskError {
    /// Whether retrying the same operation later may succeed.
    ///
    /// Transport failures and busy/locked databases are transient; everything
    /// else needs operator action or different input.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Database(msg) => msg.contains("busy") || msg.contains("locked"),
            _ => false,
        }
    }

    /// Stable label suitable for logging fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::CodeSpaceExhausted => "code_space_exhausted",
            Self::InvalidCode(_) => "invalid_code",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for TicketDesk operations
pub type Result<T> = std::result::Result<T, DeskError>;
