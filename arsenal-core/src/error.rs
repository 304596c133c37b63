//! Error types for ARSENAL operations

use std::path::PathBuf;
use thiserror::Error;

/// Configuration document errors: CRUD validation and lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Prompt not found: {name}")]
    PromptNotFound { name: String },

    #[error("A prompt named {name} already exists")]
    DuplicatePrompt { name: String },

    #[error("Prompt {prompt} has no model and the configuration has no default model")]
    NoModelSpecified { prompt: String },

    #[error("Invalid parameter name: {name} (only [a-zA-Z0-9_.] is allowed)")]
    InvalidParameterName { name: String },

    #[error("Parameter not found: {name}")]
    ParameterNotFound { name: String },

    #[error("Model not found in configuration metadata: {name}")]
    ModelNotFound { name: String },
}

/// Parser registry errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No parser registered for model: {model_id}")]
    UnknownModel { model_id: String },

    #[error("model_parsers references unregistered parser: {parser_id}")]
    UnknownParser { parser_id: String },

    #[error("Registry lock poisoned")]
    LockPoisoned,
}

/// Provider-side errors surfaced by model parsers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Missing credential: environment variable {var} is not set")]
    MissingCredential { var: String },

    #[error("Provider {provider} call failed with status {status}: {message}")]
    RemoteCall {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Malformed response from {provider}: {reason}")]
    Decoding { provider: String, reason: String },

    #[error("Unsupported input: {reason}")]
    UnsupportedInput { reason: String },
}

/// Persistence errors for configuration load/save.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("No file path bound to this configuration")]
    NoPathBound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Master error type for all ARSENAL errors.
#[derive(Debug, Error)]
pub enum ArsenalError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Template error: {0}")]
    Template(#[from] arsenal_template::TemplateError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type alias for ARSENAL operations.
pub type ArsenalResult<T> = Result<T, ArsenalError>;

// =============================================================================
// TESTS
// =============================================================================
