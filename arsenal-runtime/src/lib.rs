//! ARSENAL Runtime - Orchestration
//!
//! Ties the document model, template resolution and the parser layer
//! together: dependency analysis over cross-prompt references, a callback
//! bus for lifecycle events, and the runtime that resolves, runs and
//! persists configurations.

mod callbacks;
mod deps;
mod runtime;

pub use callbacks::{Callback, CallbackEvent, CallbackManager};
pub use deps::dependency_graph;
pub use runtime::Runtime;

// Commonly-used re-exports so embedders depend on one crate.
pub use arsenal_core::{ArsenalError, ArsenalResult, Configuration, Output, Prompt};
pub use arsenal_llm::{InferenceOptions, ModelParser, ParserRegistry};
