//! Prompt execution outputs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured output data with an explicit kind (tool calls, binary refs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDataWithValue {
    pub kind: String,
    pub value: Value,
}

/// Payload of an execute result.
///
/// The `Raw` arm carries legacy documents that stored a whole chat-message
/// object in `data`; text extraction handles that shape explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputData {
    Text(String),
    Value(OutputDataWithValue),
    Raw(Value),
}

/// A successful provider result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_count: Option<i64>,
    pub data: OutputData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// A provider failure recorded on the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorOutput {
    pub ename: String,
    pub evalue: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traceback: Vec<String>,
}

/// One recorded output of a prompt run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    ExecuteResult(ExecuteResult),
    Error(ErrorOutput),
}

impl Output {
    /// Build a plain-text execute result.
    pub fn text(text: impl Into<String>) -> Self {
        Output::ExecuteResult(ExecuteResult {
            execution_count: None,
            data: OutputData::Text(text.into()),
            mime_type: None,
            metadata: Map::new(),
        })
    }

    /// Build an error output from an error message pair.
    pub fn error(ename: impl Into<String>, evalue: impl Into<String>) -> Self {
        Output::Error(ErrorOutput {
            ename: ename.into(),
            evalue: evalue.into(),
            traceback: Vec::new(),
        })
    }

    /// Whether this output is an execute result (as opposed to an error).
    pub fn is_execute_result(&self) -> bool {
        matches!(self, Output::ExecuteResult(_))
    }
}

// ============================================================================
// TESTS
// ============================================================================
