//! Inference settings merge and diff
//!
//! Global per-model defaults live in `configuration.metadata.models`; prompts
//! store only their overrides. Deserialize recomposes the two with the prompt
//! winning; serialize factors the globals back out so documents stay small.

use arsenal_core::{ArsenalResult, Configuration, Prompt};
use serde_json::{Map, Value};

/// Effective inference settings for a prompt: global defaults for its model
/// merged with prompt-level overrides, prompt winning on conflict.
pub fn effective_settings(
    prompt: &Prompt,
    config: &Configuration,
) -> ArsenalResult<Map<String, Value>> {
    let model_name = config.model_name_for(prompt)?;
    let mut settings = config
        .global_model_settings(&model_name)
        .cloned()
        .unwrap_or_default();

    if let Some(overrides) = prompt.model_ref().and_then(|m| m.settings()) {
        for (key, value) in overrides {
            settings.insert(key.clone(), value.clone());
        }
    }

    Ok(settings)
}

/// The subset of `incoming` that differs from `global`.
///
/// This is what gets stored on a prompt at serialize time; keys equal to the
/// global default are factored out.
pub fn settings_override(
    incoming: &Map<String, Value>,
    global: Option<&Map<String, Value>>,
) -> Map<String, Value> {
    let global = match global {
        Some(global) => global,
        None => return incoming.clone(),
    };

    incoming
        .iter()
        .filter(|(key, value)| global.get(*key) != Some(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
