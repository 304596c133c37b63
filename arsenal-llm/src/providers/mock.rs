//! Mock parsers for testing
//!
//! Deterministic parsers with no network dependency. `MockCompletionParser`
//! echoes its resolved template; `MockChatParser` exercises chat-context
//! reconstruction. Both honor streaming and cooperative cancellation, and an
//! optional artificial latency makes cancellation windows testable.

use crate::chat::build_chat_messages;
use crate::options::{ChoiceAccumulator, InferenceOptions};
use crate::parser::ModelParser;
use crate::scope::resolve_prompt;
use crate::settings::{effective_settings, settings_override};
use arsenal_core::{
    ArsenalResult, Configuration, ExecuteResult, ModelMetadata, ModelRef, Output, OutputData,
    Prompt, PromptMetadata, ProviderError,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

// ============================================================================
// MOCK COMPLETION PARSER
// ============================================================================

/// Text-completion-shaped mock. Echoes the resolved template unless a canned
/// response is set.
#[derive(Debug, Clone)]
pub struct MockCompletionParser {
    id: String,
    latency: Option<Duration>,
    response: Option<String>,
}

impl MockCompletionParser {
    /// Create a mock with the given parser id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            latency: None,
            response: None,
        }
    }

    /// Sleep this long before (and between streamed chunks of) a run.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Always answer with this text.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ModelParser for MockCompletionParser {
    fn id(&self) -> &str {
        &self.id
    }

    async fn serialize(
        &self,
        prompt_name: &str,
        data: &Value,
        config: &Configuration,
        _params: &Map<String, Value>,
    ) -> ArsenalResult<Vec<Prompt>> {
        let object = data.as_object().ok_or_else(|| ProviderError::UnsupportedInput {
            reason: "mock completion data must be an object".to_string(),
        })?;
        let template = object
            .get("prompt")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let model_name = object
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(&self.id)
            .to_string();

        let mut incoming = object.clone();
        incoming.remove("prompt");
        incoming.remove("model");
        let overrides = settings_override(&incoming, config.global_model_settings(&model_name));

        let prompt = Prompt::new(prompt_name, template).with_metadata(PromptMetadata {
            model: Some(if overrides.is_empty() {
                ModelRef::Name(model_name)
            } else {
                ModelRef::Full(ModelMetadata {
                    name: model_name,
                    settings: overrides,
                })
            }),
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
        let resolved = resolve_prompt(&prompt.name, params, config)?;

        let mut payload = Map::new();
        payload.insert("model".to_string(), Value::String(model_name));
        payload.insert("prompt".to_string(), Value::String(resolved));
        for (key, value) in effective_settings(prompt, config)? {
            payload.insert(key, value);
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
        let payload = self.deserialize(&prompt, config, params).await?;
        let resolved = payload["prompt"].as_str().unwrap_or_default();
        let text = match &self.response {
            Some(response) => response.clone(),
            None => format!("echo: {}", resolved),
        };

        self.pause().await;

        let outputs = if options.stream {
            let mut accumulator = ChoiceAccumulator::new();
            for chunk in chunk_text(&text, 8) {
                if options.cancel.is_cancelled() {
                    break;
                }
                let delta = Value::String(chunk);
                let accumulated = accumulator.apply(0, &delta).clone();
                options.emit(&delta, &accumulated, 0);
                self.pause().await;
            }
            accumulator
                .into_choices()
                .into_iter()
                .map(|(index, value)| match value {
                    Value::String(text) => Output::ExecuteResult(ExecuteResult {
                        execution_count: Some(index as i64),
                        data: OutputData::Text(text),
                        mime_type: None,
                        metadata: Map::new(),
                    }),
                    other => Output::ExecuteResult(ExecuteResult {
                        execution_count: Some(index as i64),
                        data: OutputData::Raw(other),
                        mime_type: None,
                        metadata: Map::new(),
                    }),
                })
                .collect()
        } else {
            vec![Output::text(text)]
        };

        config.set_outputs(prompt_name, outputs)?;
        Ok(config.get_prompt(prompt_name)?.outputs.clone())
    }
}

/// Split text into chunks of at most `size` characters.
fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

// ============================================================================
// MOCK CHAT PARSER
// ============================================================================

/// Chat-shaped mock. Its payload carries a reconstructed `messages` list.
#[derive(Debug, Clone)]
pub struct MockChatParser {
    id: String,
    response: String,
}

impl MockChatParser {
    /// Create a mock with the given parser id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            response: "mock response".to_string(),
        }
    }

    /// Always answer with this text.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = response.into();
        self
    }
}

#[async_trait]
impl ModelParser for MockChatParser {
    fn id(&self) -> &str {
        &self.id
    }

    async fn serialize(
        &self,
        prompt_name: &str,
        data: &Value,
        config: &Configuration,
        _params: &Map<String, Value>,
    ) -> ArsenalResult<Vec<Prompt>> {
        let object = data.as_object().ok_or_else(|| ProviderError::UnsupportedInput {
            reason: "mock chat data must be an object".to_string(),
        })?;
        let messages = object
            .get("messages")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::UnsupportedInput {
                reason: "mock chat data has no messages".to_string(),
            })?;
        let model_name = object
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(&self.id)
            .to_string();

        let mut incoming = object.clone();
        incoming.remove("messages");
        incoming.remove("model");
        let overrides = settings_override(&incoming, config.global_model_settings(&model_name));

        // Each user message opens a prompt; a following assistant message
        // becomes that prompt's recorded output.
        let mut prompts: Vec<Prompt> = Vec::new();
        for message in messages {
            let role = message.get("role").and_then(Value::as_str).unwrap_or("user");
            match role {
                "user" => {
                    let name = if prompts.is_empty() {
                        prompt_name.to_string()
                    } else {
                        format!("{}_{}", prompt_name, prompts.len() + 1)
                    };
                    let content = message
                        .get("content")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    let mut prompt = Prompt::new(name, content);
                    prompt.metadata = Some(PromptMetadata {
                        model: Some(if overrides.is_empty() {
                            ModelRef::Name(model_name.clone())
                        } else {
                            ModelRef::Full(ModelMetadata {
                                name: model_name.clone(),
                                settings: overrides.clone(),
                            })
                        }),
                        ..Default::default()
                    });
                    prompts.push(prompt);
                }
                "assistant" => {
                    if let Some(prompt) = prompts.last_mut() {
                        prompt.outputs.push(Output::ExecuteResult(ExecuteResult {
                            execution_count: None,
                            data: OutputData::Raw(message.clone()),
                            mime_type: None,
                            metadata: Map::new(),
                        }));
                    }
                }
                _ => {}
            }
        }

        Ok(prompts)
    }

    async fn deserialize(
        &self,
        prompt: &Prompt,
        config: &Configuration,
        params: &Map<String, Value>,
    ) -> ArsenalResult<Value> {
        let model_name = config.model_name_for(prompt)?;
        let settings = effective_settings(prompt, config)?;
        let messages = build_chat_messages(&prompt.name, config, params, &settings)?;

        let mut payload = Map::new();
        payload.insert("model".to_string(), Value::String(model_name));
        payload.insert(
            "messages".to_string(),
            serde_json::to_value(&messages).unwrap_or(Value::Array(Vec::new())),
        );
        for (key, value) in settings {
            payload.insert(key, value);
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
        let _payload = self.deserialize(&prompt, config, params).await?;

        let outputs = if options.stream {
            let mut accumulator = ChoiceAccumulator::new();
            for chunk in chunk_text(&self.response, 8) {
                if options.cancel.is_cancelled() {
                    break;
                }
                let delta = Value::String(chunk);
                let accumulated = accumulator.apply(0, &delta).clone();
                options.emit(&delta, &accumulated, 0);
            }
            match accumulator.get(0).cloned() {
                Some(Value::String(text)) => vec![Output::text(text)],
                _ => Vec::new(),
            }
        } else {
            vec![Output::text(self.response.clone())]
        };

        config.set_outputs(prompt_name, outputs)?;
        Ok(config.get_prompt(prompt_name)?.outputs.clone())
    }
}

// ============================================================================
// TESTS
// ============================================================================
