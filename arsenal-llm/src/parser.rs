//! Model parser capability
//!
//! A parser translates between the configuration's prompt representation and
//! one provider's call/response shapes. Implementations are value objects
//! registered by id; the registry selects one at dispatch time.

use crate::chat::output_text;
use crate::options::InferenceOptions;
use arsenal_core::{ArsenalResult, Configuration, Output, Prompt, ProviderError};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// The uniform capability every model parser implements.
///
/// `serialize` and `deserialize` are inverses: one converts a
/// provider-shaped call-data object into prompts, the other produces the
/// provider's call payload from a prompt. `run` performs the external call
/// and records outputs on the prompt.
#[async_trait]
pub trait ModelParser: Send + Sync + std::fmt::Debug {
    /// Parser identifier used for registry bindings.
    fn id(&self) -> &str;

    /// Convert provider-shaped call data into one or more prompts.
    ///
    /// Global model defaults in `configuration.metadata.models` are factored
    /// out; only overrides are stored on the returned prompts.
    async fn serialize(
        &self,
        prompt_name: &str,
        data: &Value,
        config: &Configuration,
        params: &Map<String, Value>,
    ) -> ArsenalResult<Vec<Prompt>>;

    /// Produce the provider call payload for a prompt.
    ///
    /// Merges global and prompt-level settings (prompt wins), resolves the
    /// template, and for chat-shaped providers reconstructs conversation
    /// history from earlier same-model prompts.
    async fn deserialize(
        &self,
        prompt: &Prompt,
        config: &Configuration,
        params: &Map<String, Value>,
    ) -> ArsenalResult<Value>;

    /// Execute the prompt against the provider.
    ///
    /// Honors `options.stream`; assigns the produced outputs to the prompt
    /// inside `config` and returns them.
    async fn run(
        &self,
        prompt_name: &str,
        config: &mut Configuration,
        options: &InferenceOptions,
        params: &Map<String, Value>,
    ) -> ArsenalResult<Vec<Output>>;

    /// Canonical text rendering of an output (the latest one by default).
    fn get_output_text(
        &self,
        prompt: &Prompt,
        _config: &Configuration,
        output: Option<&Output>,
    ) -> String {
        output
            .or_else(|| prompt.latest_output())
            .and_then(output_text)
            .unwrap_or_default()
    }

    /// The template used when collecting references for this prompt.
    ///
    /// Defaults to the prompt's string input (or its structured `data` when
    /// that is a string). Attachment-only inputs have no template.
    fn get_prompt_template(
        &self,
        prompt: &Prompt,
        _config: &Configuration,
    ) -> ArsenalResult<String> {
        prompt
            .input
            .template()
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::UnsupportedInput {
                    reason: format!("prompt {} has no template input", prompt.name),
                }
                .into()
            })
    }
}

// ============================================================================
// TESTS
// ============================================================================
