//! Parameter scope assembly
//!
//! Builds the effective scope a prompt's template resolves against.
//! Precedence, lowest to highest: earlier-prompt references, configuration
//! globals, prompt-local parameters, call-time parameters.
//!
//! Each earlier prompt contributes `name -> {input, output}` where `input`
//! is that prompt's template resolved against its own scope and `output` is
//! its latest output text (null before any run). Scopes are computed
//! iteratively in sequence order, so only upstream prompts are ever visible
//! and the construction terminates.

use crate::output_text;
use arsenal_core::{ArsenalResult, Configuration, Prompt};
use arsenal_template::resolve;
use serde_json::{json, Map, Value};

// ============================================================================
// SCOPE CONSTRUCTION
// ============================================================================

/// Build the effective parameter scope for `prompt_name`.
pub fn prompt_scope(
    prompt_name: &str,
    call_params: &Map<String, Value>,
    config: &Configuration,
) -> ArsenalResult<Map<String, Value>> {
    let references = collect_prompt_references(prompt_name, call_params, config)?;
    let target = config.get_prompt(prompt_name)?;
    Ok(layer_scope(&references, target, call_params, config))
}

/// Resolve a prompt's template against its effective scope.
///
/// Prompts without a template (attachment-only inputs) resolve to the empty
/// string.
pub fn resolve_prompt(
    prompt_name: &str,
    call_params: &Map<String, Value>,
    config: &Configuration,
) -> ArsenalResult<String> {
    let scope = prompt_scope(prompt_name, call_params, config)?;
    let prompt = config.get_prompt(prompt_name)?;
    resolve_prompt_input(prompt, &scope)
}

/// Resolve one prompt's template against an already-built scope.
pub fn resolve_prompt_input(
    prompt: &Prompt,
    scope: &Map<String, Value>,
) -> ArsenalResult<String> {
    match prompt.input.template() {
        Some(template) => Ok(resolve(template, scope)?),
        None => Ok(String::new()),
    }
}

/// References to prompts strictly earlier in the sequence:
/// `name -> {input: resolved template, output: latest text or null}`.
fn collect_prompt_references(
    prompt_name: &str,
    call_params: &Map<String, Value>,
    config: &Configuration,
) -> ArsenalResult<Map<String, Value>> {
    let mut references = Map::new();

    for earlier in config.prompts_before(prompt_name)? {
        let scope = layer_scope(&references, earlier, call_params, config);
        let input = resolve_prompt_input(earlier, &scope)?;
        let output = earlier
            .latest_output()
            .and_then(output_text)
            .map(Value::String)
            .unwrap_or(Value::Null);

        references.insert(
            earlier.name.clone(),
            json!({ "input": input, "output": output }),
        );
    }

    Ok(references)
}

/// Merge the four precedence layers into one scope.
fn layer_scope(
    references: &Map<String, Value>,
    prompt: &Prompt,
    call_params: &Map<String, Value>,
    config: &Configuration,
) -> Map<String, Value> {
    let mut scope = references.clone();
    for (key, value) in &config.metadata.parameters {
        scope.insert(key.clone(), value.clone());
    }
    if let Some(local) = prompt.parameters() {
        for (key, value) in local {
            scope.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in call_params {
        scope.insert(key.clone(), value.clone());
    }
    scope
}

// ============================================================================
// TESTS
// ============================================================================
