//! Errors surfaced to JavaScript.

use clickbust_core::{BusterError, ConfigError, DiagnosticsError};
use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors raised by the exported functions.
#[derive(Debug, Error)]
pub enum WebError {
    /// Not running in a window.
    #[error("No window object")]
    NoWindow,

    /// The window has no document.
    #[error("No document object")]
    NoDocument,

    /// The buster has not been installed yet.
    #[error("Ghost click buster is not installed")]
    NotInstalled,

    /// Installation failed.
    #[error(transparent)]
    Buster(#[from] BusterError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The logger tree could not be set up.
    #[error(transparent)]
    Diagnostics(#[from] DiagnosticsError),
}

impl From<WebError> for JsValue {
    fn from(error: WebError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}
