//! Error types for the setlog_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for setlog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected user input (missing exercise name, empty template session, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Template file validation error
    #[error("Template validation error: {0}")]
    TemplateValidation(String),

    /// Requested template id is not in the catalog
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// Operation issued in the wrong session state
    #[error("State error: {0}")]
    State(String),

    /// History store write/read failure
    #[error("Store error: {0}")]
    Store(String),
}

impl Error {
    /// True for errors the caller caused and can correct by changing input
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
