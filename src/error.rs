//! Error types for the capture engine

use thiserror::Error;

/// Result type alias for capture operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the capture engine
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load a document
    #[error("Failed to load document: {0}")]
    LoadError(String),

    /// A CSS selector could not be parsed
    #[error("Invalid selector: {0}")]
    SelectorError(String),

    /// A selector matched no element in the document
    #[error("No element matches selector: {0}")]
    NoMatch(String),

    /// A query arrived while nothing is selected
    #[error("No element selected")]
    NoSelection,

    /// Network error while fetching a page or stylesheet
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Malformed inbound message
    #[error("Malformed message: {0}")]
    MessageError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MessageError(err.to_string())
    }
}
