//! Prompt types
//!
//! A prompt is one named unit of a configuration: an input template, an
//! optional model binding with settings overrides, local parameters, and the
//! outputs of past runs.

use crate::{Attachment, Output};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// MODEL BINDING
// ============================================================================

/// Full model binding with inference settings overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,
}

/// A prompt's model binding: a bare name or a full metadata object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelRef {
    Name(String),
    Full(ModelMetadata),
}

impl ModelRef {
    /// The bound model name.
    pub fn name(&self) -> &str {
        match self {
            ModelRef::Name(name) => name,
            ModelRef::Full(metadata) => &metadata.name,
        }
    }

    /// Prompt-level settings overrides, when present.
    pub fn settings(&self) -> Option<&Map<String, Value>> {
        match self {
            ModelRef::Name(_) => None,
            ModelRef::Full(metadata) => Some(&metadata.settings),
        }
    }
}

// ============================================================================
// PROMPT INPUT
// ============================================================================

/// Structured prompt input: template data plus attachments and chat fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PromptInputData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A prompt's input: a bare template string or a structured object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptInput {
    Text(String),
    Structured(PromptInputData),
}

impl PromptInput {
    /// The template string, when the input carries one.
    ///
    /// Structured inputs expose their `data` field only when it is a string;
    /// attachment-only inputs have no template.
    pub fn template(&self) -> Option<&str> {
        match self {
            PromptInput::Text(text) => Some(text),
            PromptInput::Structured(data) => match &data.data {
                Some(Value::String(text)) => Some(text),
                _ => None,
            },
        }
    }

    /// Attachments carried by a structured input.
    pub fn attachments(&self) -> &[Attachment] {
        match self {
            PromptInput::Text(_) => &[],
            PromptInput::Structured(data) => data.attachments.as_deref().unwrap_or(&[]),
        }
    }
}

impl From<&str> for PromptInput {
    fn from(text: &str) -> Self {
        PromptInput::Text(text.to_string())
    }
}

impl From<String> for PromptInput {
    fn from(text: String) -> Self {
        PromptInput::Text(text)
    }
}

// ============================================================================
// PROMPT
// ============================================================================

/// Per-prompt metadata: model binding, tags, local parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PromptMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remember_chat_context: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One named prompt in a configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub name: String,
    pub input: PromptInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PromptMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Output>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Prompt {
    /// Create a prompt with a plain string input.
    pub fn new(name: impl Into<String>, input: impl Into<PromptInput>) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            metadata: None,
            outputs: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Attach metadata, builder style.
    pub fn with_metadata(mut self, metadata: PromptMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Bind a model by name, builder style.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let metadata = self.metadata.get_or_insert_with(PromptMetadata::default);
        metadata.model = Some(ModelRef::Name(model.into()));
        self
    }

    /// The prompt's model binding, when present.
    pub fn model_ref(&self) -> Option<&ModelRef> {
        self.metadata.as_ref()?.model.as_ref()
    }

    /// Prompt-local parameters (empty map when absent).
    pub fn parameters(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref().map(|m| &m.parameters)
    }

    /// Whether earlier conversation turns feed into this prompt's run.
    /// Defaults to true; only an explicit `false` disables it.
    pub fn remember_chat_context(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.remember_chat_context)
            .unwrap_or(true)
    }

    /// The most recent output, when any run has completed.
    pub fn latest_output(&self) -> Option<&Output> {
        self.outputs.last()
    }
}

// ============================================================================
// TESTS
// ============================================================================
