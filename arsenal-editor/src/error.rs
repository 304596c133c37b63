//! Error types for the editor backend

use arsenal_core::ArsenalError;
use thiserror::Error;

/// Editor-layer errors. Command failures become protocol responses; these
/// errors cover bootstrap and transport-adjacent failures.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Malformed command: {reason}")]
    MalformedCommand { reason: String },

    #[error("Invalid bind address {addr}: {reason}")]
    InvalidBindAddr { addr: String, reason: String },

    #[error("Parser manifest error: {reason}")]
    Manifest { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] ArsenalError),
}

/// Result type alias for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;
