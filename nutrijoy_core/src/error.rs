//! Error types for the nutrijoy_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for nutrijoy_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing input (entry logging, profile and signup forms)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced id does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Calorie scaling against a zero or invalid base quantity
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    /// Missing or insufficient session credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

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

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),
}
