//! Error types for quotenote-core

use thiserror::Error;

/// Result type alias using quotenote-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quotenote-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error talking to the document backend
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The document backend rejected a request
    #[error("Remote storage error: {0}")]
    Remote(String),
}
