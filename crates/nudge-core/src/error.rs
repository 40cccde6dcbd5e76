//! Error types for nudge-core

use thiserror::Error;

/// Result type alias using nudge-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in nudge-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reminder or outbox entry not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote store error during sync
    #[error("Remote store error: {0}")]
    Remote(#[from] crate::sync::RemoteError),

    /// External trigger collaborator error
    #[error("Trigger error: {0}")]
    Trigger(String),
}
