use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] quotenote_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No quote text provided")]
    EmptyContent,
    #[error("Edited quote text cannot be empty")]
    EmptyEditedContent,
    #[error("Quote ID cannot be empty")]
    EmptyQuoteId,
    #[error("Quote not found for id/prefix: {0}")]
    QuoteNotFound(String),
    #[error("{0}")]
    AmbiguousQuoteId(String),
    #[error("Quote was not saved")]
    NotSaved,
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Not signed in. Run `quotenote auth login --email <email> --password <password>` first.")]
    NotSignedIn,
}
