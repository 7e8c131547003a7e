//! Error types for the adapters module

use thiserror::Error;

/// Result type alias for adapter construction
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Errors raised while building adapters. Runtime fetch failures are
/// reported as `FetchError` instead.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Adapter configuration is unusable
    #[error("Invalid adapter configuration: {field} - {reason}")]
    InvalidConfig {
        /// Offending configuration field
        field: String,
        reason: String,
    },
}
