//! Chat message construction
//!
//! Chat-shaped providers rebuild a conversation from the configuration's
//! prompt sequence at deserialize time. Output text canonicalization lives
//! here too, shared by parsers and the parameter scope builder.

use crate::scope::{prompt_scope, resolve_prompt_input};
use arsenal_core::{
    ArsenalResult, Configuration, Output, OutputData, Prompt, PromptInput,
};
use arsenal_template::resolve;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// OUTPUT TEXT
// ============================================================================

/// Canonical text rendering of an output.
///
/// Plain text passes through; tagged values with a string payload unwrap;
/// structured payloads (tool calls) render as canonical JSON. The legacy
/// shape storing a whole chat-message object in `data` yields its `content`.
/// Error outputs have no text.
pub fn output_text(output: &Output) -> Option<String> {
    let result = match output {
        Output::ExecuteResult(result) => result,
        Output::Error(_) => return None,
    };

    match &result.data {
        OutputData::Text(text) => Some(text.clone()),
        OutputData::Value(tagged) => match &tagged.value {
            Value::String(text) => Some(text.clone()),
            other => serde_json::to_string(other).ok(),
        },
        OutputData::Raw(value) => match value {
            Value::String(text) => Some(text.clone()),
            Value::Object(object) => match object.get("content") {
                Some(Value::String(content)) => Some(content.clone()),
                _ => serde_json::to_string(value).ok(),
            },
            other => serde_json::to_string(other).ok(),
        },
    }
}

// ============================================================================
// CHAT MESSAGES
// ============================================================================

/// One message in a chat-shaped completion payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<Value>,
}

impl ChatMessage {
    /// A plain message with a role and content.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
            name: None,
            function_call: None,
        }
    }
}

/// Build the message list for a chat-shaped run of `prompt_name`.
///
/// Ordering: optional system message from settings, then (unless the prompt
/// opted out of chat context) one user/assistant pair per earlier same-model
/// prompt, then the current prompt's resolved template as the final user
/// message. A `messages` array already present in settings is used verbatim
/// (with parameter substitution on each element's text content) in place of
/// the reconstructed history.
pub fn build_chat_messages(
    prompt_name: &str,
    config: &Configuration,
    call_params: &Map<String, Value>,
    settings: &Map<String, Value>,
) -> ArsenalResult<Vec<ChatMessage>> {
    let prompt = config.get_prompt(prompt_name)?;
    let scope = prompt_scope(prompt_name, call_params, config)?;
    let mut messages = Vec::new();

    if let Some(system) = system_message(settings, &scope)? {
        messages.push(system);
    }

    if let Some(Value::Array(saved)) = settings.get("messages") {
        // Saved history wins over reconstruction.
        for entry in saved {
            messages.push(substituted_message(entry, &scope)?);
        }
    } else if prompt.remember_chat_context() {
        let model_name = config.model_name_for(prompt)?;
        for earlier in config.prompts_before(prompt_name)? {
            // Only turns addressed to the same model belong to this thread.
            if config.model_name_for(earlier).ok().as_deref() != Some(model_name.as_str()) {
                continue;
            }

            let earlier_scope = prompt_scope(&earlier.name, call_params, config)?;
            let content = resolve_prompt_input(earlier, &earlier_scope)?;
            messages.push(user_message(earlier, content));

            if let Some(text) = earlier.latest_output().and_then(output_text) {
                messages.push(assistant_message(earlier.latest_output(), text));
            }
        }
    }

    let content = resolve_prompt_input(prompt, &scope)?;
    messages.push(user_message(prompt, content));

    Ok(messages)
}

/// System message from settings, with parameters substituted.
fn system_message(
    settings: &Map<String, Value>,
    scope: &Map<String, Value>,
) -> ArsenalResult<Option<ChatMessage>> {
    let text = match settings.get("system_prompt") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Object(object)) => match object.get("content") {
            Some(Value::String(text)) => text.clone(),
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };
    Ok(Some(ChatMessage::new("system", resolve(&text, scope)?)))
}

/// A saved settings message with parameters substituted into its content.
fn substituted_message(entry: &Value, scope: &Map<String, Value>) -> ArsenalResult<ChatMessage> {
    let mut message: ChatMessage =
        serde_json::from_value(entry.clone()).unwrap_or_else(|_| ChatMessage::new("user", ""));
    if let Some(content) = &message.content {
        message.content = Some(resolve(content, scope)?);
    }
    Ok(message)
}

/// A user message carrying the stored role/name/function_call fields.
fn user_message(prompt: &Prompt, content: String) -> ChatMessage {
    match &prompt.input {
        PromptInput::Structured(data) => ChatMessage {
            role: data.role.clone().unwrap_or_else(|| "user".to_string()),
            content: Some(content),
            name: data.name.clone(),
            function_call: data.function_call.clone(),
        },
        PromptInput::Text(_) => ChatMessage::new("user", content),
    }
}

/// An assistant message for a completed output, re-serializing tool-call
/// payloads into the provider shape.
fn assistant_message(output: Option<&Output>, text: String) -> ChatMessage {
    let function_call = output.and_then(|output| match output {
        Output::ExecuteResult(result) => match &result.data {
            OutputData::Raw(Value::Object(object)) => object.get("function_call").cloned(),
            _ => None,
        },
        Output::Error(_) => None,
    });

    ChatMessage {
        role: "assistant".to_string(),
        content: Some(text),
        name: None,
        function_call,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use arsenal_core::{ExecuteResult, OutputDataWithValue, Prompt, PromptMetadata};
    use serde_json::json;

    fn chat_config() -> Configuration {
        let mut config = Configuration::new("chat");
        config.metadata.default_model = Some("chat-model".to_string());
        config
            .add_prompt(Prompt::new("p1", "What is the tallest mountain?"), None)
            .unwrap();
        config
            .add_prompt(Prompt::new("p2", "Hi again"), None)
            .unwrap();
        config
    }

    #[test]
    fn test_output_text_shapes() {
        assert_eq!(output_text(&Output::text("plain")), Some("plain".to_string()));

        let tagged = Output::ExecuteResult(ExecuteResult {
            execution_count: None,
            data: OutputData::Value(OutputDataWithValue {
                kind: "tool_calls".to_string(),
                value: json!([{"name": "lookup"}]),
            }),
            mime_type: None,
            metadata: Map::new(),
        });
        assert_eq!(
            output_text(&tagged),
            Some(r#"[{"name":"lookup"}]"#.to_string())
        );

        let legacy = Output::ExecuteResult(ExecuteResult {
            execution_count: None,
            data: OutputData::Raw(json!({"role": "assistant", "content": "from legacy"})),
            mime_type: None,
            metadata: Map::new(),
        });
        assert_eq!(output_text(&legacy), Some("from legacy".to_string()));

        assert_eq!(output_text(&Output::error("E", "boom")), None);
    }

    #[test]
    fn test_reconstruction_orders_turns() {
        let mut config = chat_config();
        config.add_output("p1", Output::text("A1"), false).unwrap();

        let messages =
            build_chat_messages("p2", &config, &Map::new(), &Map::new()).unwrap();
        assert_eq!(
            messages,
            vec![
                ChatMessage::new("user", "What is the tallest mountain?"),
                ChatMessage::new("assistant", "A1"),
                ChatMessage::new("user", "Hi again"),
            ]
        );
    }

    #[test]
    fn test_system_message_first() {
        let mut config = chat_config();
        config.add_output("p1", Output::text("A1"), false).unwrap();

        let mut settings = Map::new();
        settings.insert("system_prompt".to_string(), json!("Be brief."));
        let messages = build_chat_messages("p2", &config, &Map::new(), &settings).unwrap();
        assert_eq!(messages[0], ChatMessage::new("system", "Be brief."));
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn test_remember_chat_context_opt_out() {
        let mut config = chat_config();
        config.add_output("p1", Output::text("A1"), false).unwrap();
        config
            .update_prompt(
                "p2",
                Prompt::new("p2", "Hi again").with_metadata(PromptMetadata {
                    remember_chat_context: Some(false),
                    ..Default::default()
                }),
            )
            .unwrap();

        let messages =
            build_chat_messages("p2", &config, &Map::new(), &Map::new()).unwrap();
        assert_eq!(messages, vec![ChatMessage::new("user", "Hi again")]);
    }

    #[test]
    fn test_other_model_turns_skipped() {
        let mut config = chat_config();
        config
            .update_prompt(
                "p1",
                Prompt::new("p1", "other thread").with_model("different-model"),
            )
            .unwrap();

        let messages =
            build_chat_messages("p2", &config, &Map::new(), &Map::new()).unwrap();
        assert_eq!(messages, vec![ChatMessage::new("user", "Hi again")]);
    }

    #[test]
    fn test_prompt_without_completed_output_contributes_user_only() {
        let config = chat_config();
        let messages =
            build_chat_messages("p2", &config, &Map::new(), &Map::new()).unwrap();
        assert_eq!(
            messages,
            vec![
                ChatMessage::new("user", "What is the tallest mountain?"),
                ChatMessage::new("user", "Hi again"),
            ]
        );
    }

    #[test]
    fn test_saved_messages_used_verbatim_with_substitution() {
        let mut config = chat_config();
        config
            .set_parameter("who", json!("traveler"), None)
            .unwrap();

        let mut settings = Map::new();
        settings.insert(
            "messages".to_string(),
            json!([
                {"role": "user", "content": "Hello {{who}}"},
                {"role": "assistant", "content": "Greetings"}
            ]),
        );

        let messages = build_chat_messages("p2", &config, &Map::new(), &settings).unwrap();
        assert_eq!(
            messages,
            vec![
                ChatMessage::new("user", "Hello traveler"),
                ChatMessage::new("assistant", "Greetings"),
                ChatMessage::new("user", "Hi again"),
            ]
        );
    }

    #[test]
    fn test_structured_input_role_and_function_call() {
        let mut config = chat_config();
        config
            .update_prompt(
                "p2",
                serde_json::from_value(json!({
                    "name": "p2",
                    "input": {
                        "data": "Call the tool",
                        "role": "user",
                        "name": "alex",
                        "function_call": {"name": "lookup", "arguments": "{}"}
                    }
                }))
                .unwrap(),
            )
            .unwrap();

        let messages =
            build_chat_messages("p2", &config, &Map::new(), &Map::new()).unwrap();
        let last = messages.last().unwrap();
        assert_eq!(last.name.as_deref(), Some("alex"));
        assert_eq!(last.function_call.as_ref().unwrap()["name"], json!("lookup"));
    }

    #[test]
    fn test_assistant_function_call_reserialized() {
        let mut config = chat_config();
        config
            .add_output(
                "p1",
                Output::ExecuteResult(ExecuteResult {
                    execution_count: None,
                    data: OutputData::Raw(json!({
                        "role": "assistant",
                        "content": "calling",
                        "function_call": {"name": "lookup", "arguments": "{}"}
                    })),
                    mime_type: None,
                    metadata: Map::new(),
                }),
                false,
            )
            .unwrap();

        let messages =
            build_chat_messages("p2", &config, &Map::new(), &Map::new()).unwrap();
        let assistant = &messages[1];
        assert_eq!(assistant.role, "assistant");
        assert_eq!(
            assistant.function_call.as_ref().unwrap()["name"],
            json!("lookup")
        );
    }
}
