//! Error types for buster operations.

use thiserror::Error;

use crate::diagnostics::{DiagnosticError, DiagnosticsError};

/// Result type for buster operations.
pub type BusterResult<T> = Result<T, BusterError>;

/// Errors that can occur while installing or running the buster.
#[derive(Debug, Error)]
pub enum BusterError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The logger tree is not usable (typically no level set anywhere).
    #[error("Diagnostics error: {0}")]
    Diagnostics(#[from] DiagnosticsError),

    /// An internal invariant check failed.
    #[error("{0}")]
    Assertion(#[from] DiagnosticError),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration JSON could not be parsed.
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("{0}")]
    Invalid(#[from] DiagnosticError),

    /// The root level name is not a known level.
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),
}
