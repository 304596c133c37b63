//! Editor wire protocol
//!
//! One long-lived bidirectional text-frame channel per session. Inbound
//! frames wrap a command discriminated on `command_name`; outbound frames
//! are either a response envelope or, during a streaming run, a chunk frame.

use arsenal_core::Prompt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

// ============================================================================
// INBOUND
// ============================================================================

/// Inbound frame: `{"command": {"command_name": <tag>, ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandEnvelope {
    pub command: Command,
}

/// Editor commands, discriminated on `command_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command_name", rename_all = "snake_case")]
pub enum Command {
    GetInstanceStatus,
    ListModels,
    LoadModelParserModule {
        path: PathBuf,
    },
    Create,
    Load {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Save {
        path: PathBuf,
    },
    Run {
        prompt_name: String,
        #[serde(default)]
        params: Map<String, Value>,
        #[serde(default)]
        stream: bool,
    },
    AddPrompt {
        prompt_name: String,
        prompt_data: Prompt,
        #[serde(default)]
        index: Option<usize>,
    },
    UpdatePrompt {
        prompt_name: String,
        prompt_data: Prompt,
    },
    DeletePrompt {
        prompt_name: String,
    },
    UpdateModel {
        model_name: String,
        #[serde(default)]
        settings: Map<String, Value>,
        #[serde(default)]
        prompt_name: Option<String>,
    },
    SetParameter {
        parameter_name: String,
        parameter_value: Value,
        #[serde(default)]
        prompt_name: Option<String>,
    },
    SetParameters {
        parameters: Map<String, Value>,
        #[serde(default)]
        prompt_name: Option<String>,
    },
    DeleteParameter {
        parameter_name: String,
        #[serde(default)]
        prompt_name: Option<String>,
    },
    SetName {
        name: String,
    },
    SetDescription {
        description: String,
    },
    Cancel,
}

impl Command {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetInstanceStatus => "get_instance_status",
            Command::ListModels => "list_models",
            Command::LoadModelParserModule { .. } => "load_model_parser_module",
            Command::Create => "create",
            Command::Load { .. } => "load",
            Command::Save { .. } => "save",
            Command::Run { .. } => "run",
            Command::AddPrompt { .. } => "add_prompt",
            Command::UpdatePrompt { .. } => "update_prompt",
            Command::DeletePrompt { .. } => "delete_prompt",
            Command::UpdateModel { .. } => "update_model",
            Command::SetParameter { .. } => "set_parameter",
            Command::SetParameters { .. } => "set_parameters",
            Command::DeleteParameter { .. } => "delete_parameter",
            Command::SetName { .. } => "set_name",
            Command::SetDescription { .. } => "set_description",
            Command::Cancel => "cancel",
        }
    }
}

/// Parse one inbound text frame.
pub fn parse_frame(text: &str) -> Result<Command, String> {
    serde_json::from_str::<CommandEnvelope>(text)
        .map(|envelope| envelope.command)
        .map_err(|e| e.to_string())
}

// ============================================================================
// OUTBOUND
// ============================================================================

/// Terminal response for one command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorResponse {
    pub instance_id: String,
    pub message: String,
    pub is_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Serialized configuration; omitted on failure so no partial mutation
    /// is observable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aiconfig: Option<Value>,
}

impl EditorResponse {
    /// A success response.
    pub fn ok(instance_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            message: message.into(),
            is_success: true,
            data: None,
            aiconfig: None,
        }
    }

    /// A failure response.
    pub fn fail(instance_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            message: message.into(),
            is_success: false,
            data: None,
            aiconfig: None,
        }
    }

    /// Attach a data payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach the serialized configuration.
    pub fn with_aiconfig(mut self, aiconfig: Value) -> Self {
        self.aiconfig = Some(aiconfig);
        self
    }
}

/// Streaming chunk frame: `{"output_chunk": <accumulated output object>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkFrame {
    pub output_chunk: Value,
}

/// One outbound frame.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundFrame {
    Response(EditorResponse),
    Chunk(ChunkFrame),
}

// ============================================================================
// TESTS
// ============================================================================
