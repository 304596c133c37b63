//! Inference options and streaming accumulation

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ============================================================================
// CANCELLATION
// ============================================================================

/// Cooperative cancellation flag shared between a run and its controller.
///
/// Streaming loops observe the flag between chunks; non-streaming runs are
/// cancelled at the task level and the flag records intent for any code that
/// polls it afterwards.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a fresh, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// INFERENCE OPTIONS
// ============================================================================

/// Callback invoked for each streamed delta: `(delta, accumulated, index)`.
/// The index disambiguates concurrent choice streams.
pub type StreamCallback = Arc<dyn Fn(&Value, &Value, usize) + Send + Sync>;

/// Caller-provided controls for one run.
#[derive(Clone, Default)]
pub struct InferenceOptions {
    /// Request streamed output from the provider.
    pub stream: bool,
    /// Receives each delta together with the per-choice accumulation.
    pub stream_callback: Option<StreamCallback>,
    /// Cooperative cancellation flag.
    pub cancel: CancelFlag,
    /// Credential override; falls back to the provider's environment variable.
    pub api_token: Option<String>,
}

impl InferenceOptions {
    /// Options for a streaming run with a callback.
    pub fn streaming(callback: StreamCallback) -> Self {
        Self {
            stream: true,
            stream_callback: Some(callback),
            ..Default::default()
        }
    }

    /// Emit one delta to the callback, when one is registered.
    pub fn emit(&self, delta: &Value, accumulated: &Value, index: usize) {
        if let Some(callback) = &self.stream_callback {
            callback(delta, accumulated, index);
        }
    }
}

impl std::fmt::Debug for InferenceOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceOptions")
            .field("stream", &self.stream)
            .field("stream_callback", &self.stream_callback.is_some())
            .field("cancel", &self.cancel.is_cancelled())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ============================================================================
// CHOICE ACCUMULATION
// ============================================================================

/// Folds streamed deltas into per-choice accumulators.
///
/// Text deltas concatenate; object deltas merge recursively (text leaves
/// concatenating); anything else replaces the accumulated value.
#[derive(Debug, Default)]
pub struct ChoiceAccumulator {
    choices: std::collections::BTreeMap<usize, Value>,
}

impl ChoiceAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one delta into the accumulator for `index`; returns the
    /// accumulated value after the fold.
    pub fn apply(&mut self, index: usize, delta: &Value) -> &Value {
        let slot = self.choices.entry(index).or_insert(Value::Null);
        merge_delta(slot, delta);
        &self.choices[&index]
    }

    /// The accumulated value for a choice, when any delta has arrived.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.choices.get(&index)
    }

    /// Drain the accumulated choices in index order.
    pub fn into_choices(self) -> Vec<(usize, Value)> {
        self.choices.into_iter().collect()
    }
}

/// Fold a delta into an accumulated value in place.
fn merge_delta(accumulated: &mut Value, delta: &Value) {
    match (&mut *accumulated, delta) {
        (Value::String(acc), Value::String(d)) => acc.push_str(d),
        (Value::Object(acc), Value::Object(d)) => {
            for (key, value) in d {
                match acc.get_mut(key) {
                    Some(existing) => merge_delta(existing, value),
                    None => {
                        acc.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (acc, d) => *acc = d.clone(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
