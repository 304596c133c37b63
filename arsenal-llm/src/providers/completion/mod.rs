//! Reference text-completion parser
//!
//! Targets an OpenAI-compatible `/completions` endpoint. The credential is
//! read from `OPENAI_API_KEY` (overridable per run via
//! `InferenceOptions::api_token`) and the base URL from
//! `ARSENAL_COMPLETION_BASE_URL`. Missing credentials only fail when a call
//! actually requires them.

mod client;
mod types;

pub use client::{CompletionClient, SseStream};
pub use types::{
    ApiError, ApiErrorBody, ChunkChoice, CompletionChoice, CompletionChunk, CompletionResponse,
    Usage, SUPPORTED_KEYS,
};

use crate::options::{ChoiceAccumulator, InferenceOptions};
use crate::parser::ModelParser;
use crate::scope::resolve_prompt;
use crate::settings::{effective_settings, settings_override};
use arsenal_core::{
    ArsenalResult, Configuration, ExecuteResult, ModelMetadata, ModelRef, Output, OutputData,
    Prompt, PromptMetadata, ProviderError,
};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Registry id of the completion parser.
pub const COMPLETION_PARSER_ID: &str = "completion";

const API_KEY_VAR: &str = "OPENAI_API_KEY";
const BASE_URL_VAR: &str = "ARSENAL_COMPLETION_BASE_URL";

/// Parser for plain text-completion models.
#[derive(Debug, Clone)]
pub struct CompletionParser {
    requests_per_minute: u32,
}

impl CompletionParser {
    /// Create a parser with the default rate limit.
    pub fn new() -> Self {
        Self {
            requests_per_minute: 60,
        }
    }

    /// Override the request rate limit.
    pub fn with_requests_per_minute(mut self, requests_per_minute: u32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }

    /// Build a client, resolving the credential lazily.
    fn client(&self, options: &InferenceOptions) -> ArsenalResult<CompletionClient> {
        let api_key = match &options.api_token {
            Some(token) => token.clone(),
            None => std::env::var(API_KEY_VAR).map_err(|_| ProviderError::MissingCredential {
                var: API_KEY_VAR.to_string(),
            })?,
        };

        let mut client = CompletionClient::new(api_key, self.requests_per_minute);
        if let Ok(base_url) = std::env::var(BASE_URL_VAR) {
            client = client.with_base_url(base_url);
        }
        Ok(client)
    }
}

impl Default for CompletionParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelParser for CompletionParser {
    fn id(&self) -> &str {
        COMPLETION_PARSER_ID
    }

    async fn serialize(
        &self,
        prompt_name: &str,
        data: &Value,
        config: &Configuration,
        _params: &Map<String, Value>,
    ) -> ArsenalResult<Vec<Prompt>> {
        let object = data.as_object().ok_or_else(|| ProviderError::UnsupportedInput {
            reason: "completion data must be a JSON object".to_string(),
        })?;

        let template = match object.get("prompt") {
            Some(Value::String(template)) => template.clone(),
            _ => {
                return Err(ProviderError::UnsupportedInput {
                    reason: "completion data has no string prompt".to_string(),
                }
                .into())
            }
        };
        let model_name = match object.get("model") {
            Some(Value::String(model)) => model.clone(),
            _ => {
                return Err(ProviderError::UnsupportedInput {
                    reason: "completion data has no model name".to_string(),
                }
                .into())
            }
        };

        // Only the difference from the global defaults is stored on the prompt.
        let mut incoming: Map<String, Value> = object.clone();
        incoming.remove("prompt");
        incoming.remove("model");
        let overrides = settings_override(&incoming, config.global_model_settings(&model_name));

        let model = if overrides.is_empty() {
            ModelRef::Name(model_name)
        } else {
            ModelRef::Full(ModelMetadata {
                name: model_name,
                settings: overrides,
            })
        };

        let prompt = Prompt::new(prompt_name, template).with_metadata(PromptMetadata {
            model: Some(model),
            ..Default::default()
        });
        Ok(vec![prompt])
    }

    async fn deserialize(
        &self,
        prompt: &Prompt,
        config: &Configuration,
        params: &Map<String, Value>,
    ) -> ArsenalResult<Value> {
        let model_name = config.model_name_for(prompt)?;
        let settings = effective_settings(prompt, config)?;
        let resolved = resolve_prompt(&prompt.name, params, config)?;

        let mut payload = Map::new();
        payload.insert("model".to_string(), Value::String(model_name));
        payload.insert("prompt".to_string(), Value::String(resolved));
        for (key, value) in settings {
            if SUPPORTED_KEYS.contains(&key.as_str()) {
                payload.insert(key, value);
            }
        }

        Ok(Value::Object(payload))
    }

    async fn run(
        &self,
        prompt_name: &str,
        config: &mut Configuration,
        options: &InferenceOptions,
        params: &Map<String, Value>,
    ) -> ArsenalResult<Vec<Output>> {
        let prompt = config.get_prompt(prompt_name)?.clone();
        let mut payload = self.deserialize(&prompt, config, params).await?;
        let client = self.client(options)?;

        tracing::debug!(prompt = prompt_name, stream = options.stream, "Running completion");

        let outputs = if options.stream {
            payload["stream"] = json!(true);
            let mut stream = client.stream_request("completions", &payload).await?;
            let mut accumulator = ChoiceAccumulator::new();

            while let Some(data) = stream.next_data().await? {
                if options.cancel.is_cancelled() {
                    tracing::debug!(prompt = prompt_name, "Stream cancelled");
                    break;
                }
                let chunk: CompletionChunk =
                    serde_json::from_str(&data).map_err(|e| ProviderError::Decoding {
                        provider: COMPLETION_PARSER_ID.to_string(),
                        reason: format!("bad stream chunk: {}", e),
                    })?;
                for choice in chunk.choices {
                    let delta = Value::String(choice.text);
                    let accumulated = accumulator.apply(choice.index, &delta).clone();
                    options.emit(&delta, &accumulated, choice.index);
                }
            }

            accumulator
                .into_choices()
                .into_iter()
                .map(|(index, value)| text_output(index, value, None))
                .collect()
        } else {
            let response: CompletionResponse = client.request("completions", &payload).await?;
            let mut choices = response.choices;
            choices.sort_by_key(|choice| choice.index);
            choices
                .into_iter()
                .map(|choice| {
                    text_output(choice.index, Value::String(choice.text), choice.finish_reason)
                })
                .collect()
        };

        config.set_outputs(prompt_name, outputs)?;
        Ok(config.get_prompt(prompt_name)?.outputs.clone())
    }
}

/// Wrap one choice as an execute-result output.
fn text_output(index: usize, value: Value, finish_reason: Option<String>) -> Output {
    let data = match value {
        Value::String(text) => OutputData::Text(text),
        other => OutputData::Raw(other),
    };
    let mut metadata = Map::new();
    if let Some(reason) = finish_reason {
        metadata.insert("finish_reason".to_string(), Value::String(reason));
    }
    Output::ExecuteResult(ExecuteResult {
        execution_count: Some(index as i64),
        data,
        mime_type: None,
        metadata,
    })
}

// ============================================================================
// TESTS
// ============================================================================
