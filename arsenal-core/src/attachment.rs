//! Prompt input attachments

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind discriminator for string-valued attachment data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    FileUri,
    Base64,
}

/// String-valued attachment data with an explicit kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentDataWithStringValue {
    pub kind: AttachmentKind,
    pub value: String,
}

/// Attachment payload: either the tagged string form or arbitrary JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttachmentData {
    WithStringValue(AttachmentDataWithStringValue),
    Raw(Value),
}

/// A non-text input attached to a prompt (image, audio, file reference).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub data: AttachmentData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

// ============================================================================
// TESTS
// ============================================================================
