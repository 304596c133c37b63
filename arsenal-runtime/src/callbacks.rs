//! Callback bus
//!
//! Subscribers observe runtime lifecycle events (serialize, deserialize,
//! run, save, load). They are invoked synchronously in registration order
//! and must not mutate the configuration.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// One lifecycle event published by the runtime.
#[derive(Debug, Clone)]
pub struct CallbackEvent {
    /// Event name, e.g. `on_run_start`.
    pub name: String,
    /// Event payload (prompt name, parameters, results).
    pub data: Value,
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
}

impl CallbackEvent {
    /// Create an event stamped with the current time.
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
            timestamp: Utc::now(),
        }
    }
}

/// A subscriber on the callback bus.
pub type Callback = Arc<dyn Fn(&CallbackEvent) + Send + Sync>;

/// Ordered list of subscribers.
#[derive(Clone, Default)]
pub struct CallbackManager {
    subscribers: Vec<Callback>,
}

impl CallbackManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. Subscribers fire in registration order.
    pub fn register(&mut self, callback: Callback) {
        self.subscribers.push(callback);
    }

    /// Publish an event to every subscriber.
    pub fn publish(&self, name: &str, data: Value) {
        if self.subscribers.is_empty() {
            return;
        }
        let event = CallbackEvent::new(name, data);
        for subscriber in &self.subscribers {
            subscriber(&event);
        }
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether any subscribers are registered.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl std::fmt::Debug for CallbackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackManager")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
