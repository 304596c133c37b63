//! ARSENAL LLM - Model Parser Layer
//!
//! The uniform parser capability (serialize/deserialize/run/output-text),
//! the process-wide parser registry, inference options with streaming
//! accumulation, parameter scope assembly, and chat-context reconstruction.
//! Provider implementations live under `providers`; the reference parser
//! targets a text-completion endpoint and mocks cover tests.

mod chat;
mod options;
mod parser;
mod registry;
mod scope;
mod settings;

pub mod providers;

pub use chat::{build_chat_messages, output_text, ChatMessage};
pub use options::{CancelFlag, ChoiceAccumulator, InferenceOptions, StreamCallback};
pub use parser::ModelParser;
pub use registry::ParserRegistry;
pub use scope::{prompt_scope, resolve_prompt, resolve_prompt_input};
pub use settings::{effective_settings, settings_override};
