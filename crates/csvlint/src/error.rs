//! Error types for the csvlint library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for csvlint operations.
///
/// Validation problems found *in* a document are never reported through this
/// type; they become [`Diagnostic`](crate::Diagnostic)s. These errors describe
/// failures of the machinery around a run: opening sources, fetching
/// candidate metadata, decoding configuration.
#[derive(Debug, Error)]
pub enum CsvlintError {
    /// Error reading or accessing a local file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested resource does not exist.
    #[error("Not found: {location}")]
    NotFound { location: String },

    /// A remote request failed for a reason other than a missing resource.
    #[error("Request for '{location}' failed: {message}")]
    RequestFailed { location: String, message: String },

    /// A URL could not be parsed or resolved.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Schema metadata was readable but not usable.
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CsvlintError {
    /// Whether this error means the resource is missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            CsvlintError::NotFound { .. } => true,
            CsvlintError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type alias for csvlint operations.
pub type Result<T> = std::result::Result<T, CsvlintError>;
