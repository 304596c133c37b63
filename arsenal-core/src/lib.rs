//! ARSENAL Core - Configuration Document Model
//!
//! The JSON document and its in-memory image: prompts, parameters, model
//! bindings, outputs, and persistence. Parser dispatch and execution live in
//! `arsenal-llm` and `arsenal-runtime`; this crate contains the data model,
//! its CRUD surface, and the error taxonomy shared by every other crate.

mod attachment;
mod config;
mod error;
mod output;
mod prompt;
mod version;

pub use attachment::{Attachment, AttachmentData, AttachmentDataWithStringValue, AttachmentKind};
pub use config::{validate_parameter_name, ConfigMetadata, Configuration};
pub use error::{
    ArsenalError, ArsenalResult, ConfigError, PersistenceError, ProviderError, RegistryError,
};
pub use output::{ErrorOutput, ExecuteResult, Output, OutputData, OutputDataWithValue};
pub use prompt::{ModelMetadata, ModelRef, Prompt, PromptInput, PromptInputData, PromptMetadata};
pub use version::{SchemaVersion, VersionTag};

// Re-exported so downstream crates name one error family.
pub use arsenal_template::TemplateError;
