//! Run orchestration
//!
//! The runtime owns one configuration, a callback bus, and a handle to the
//! parser registry. It dispatches resolve/serialize/run to the parser bound
//! to each prompt's model and persists the document.

use crate::callbacks::CallbackManager;
use crate::deps::dependency_graph;
use arsenal_core::{ArsenalResult, Configuration, Output, Prompt};
use arsenal_llm::{InferenceOptions, ParserRegistry};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Orchestrator over one configuration document.
#[derive(Clone)]
pub struct Runtime {
    config: Configuration,
    callbacks: CallbackManager,
    registry: Arc<ParserRegistry>,
}

impl Runtime {
    // ========================================================================
    // CONSTRUCTION & PERSISTENCE
    // ========================================================================

    /// Create a runtime around a fresh empty configuration.
    pub fn create() -> Self {
        Self::from_config(Configuration::new("untitled"))
    }

    /// Wrap an existing configuration, using the process-wide registry.
    pub fn from_config(config: Configuration) -> Self {
        Self::from_config_with_registry(config, ParserRegistry::global())
    }

    /// Wrap an existing configuration with an explicit registry.
    pub fn from_config_with_registry(
        config: Configuration,
        registry: Arc<ParserRegistry>,
    ) -> Self {
        Self {
            config,
            callbacks: CallbackManager::new(),
            registry,
        }
    }

    /// Load a configuration from disk, using the process-wide registry.
    ///
    /// The document's `model_parsers` overrides are applied to the registry;
    /// an unresolvable parser id fails the load.
    pub fn load(path: impl AsRef<Path>) -> ArsenalResult<Self> {
        Self::load_with_registry(path, ParserRegistry::global())
    }

    /// Load a configuration from disk with an explicit registry.
    pub fn load_with_registry(
        path: impl AsRef<Path>,
        registry: Arc<ParserRegistry>,
    ) -> ArsenalResult<Self> {
        let config = Configuration::load(path.as_ref())?;
        registry.apply_config_overrides(&config)?;

        let runtime = Self::from_config_with_registry(config, registry);
        runtime.callbacks.publish(
            "on_load",
            json!({"path": path.as_ref().display().to_string()}),
        );
        Ok(runtime)
    }

    /// Save the configuration to disk.
    pub fn save(&mut self, path: Option<&Path>, include_outputs: bool) -> ArsenalResult<PathBuf> {
        let written = self.config.save(path, include_outputs)?;
        self.callbacks.publish(
            "on_save",
            json!({
                "path": written.display().to_string(),
                "include_outputs": include_outputs,
            }),
        );
        Ok(written)
    }

    /// The wrapped configuration.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// The wrapped configuration, mutably.
    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    /// Replace the wrapped configuration.
    pub fn set_config(&mut self, config: Configuration) {
        self.config = config;
    }

    /// The registry this runtime dispatches through.
    pub fn registry(&self) -> &Arc<ParserRegistry> {
        &self.registry
    }

    /// The callback bus, for registering subscribers.
    pub fn callbacks_mut(&mut self) -> &mut CallbackManager {
        &mut self.callbacks
    }

    // ========================================================================
    // ORCHESTRATION
    // ========================================================================

    /// Produce the provider call payload for one prompt.
    pub async fn resolve(
        &self,
        prompt_name: &str,
        params: &Map<String, Value>,
    ) -> ArsenalResult<Value> {
        let prompt = self.config.get_prompt(prompt_name)?;
        let parser = self.registry.get_for_prompt(prompt, &self.config)?;

        self.callbacks
            .publish("on_deserialize_start", json!({"prompt": prompt_name}));
        let payload = parser.deserialize(prompt, &self.config, params).await?;
        self.callbacks
            .publish("on_deserialize_complete", json!({"prompt": prompt_name}));
        Ok(payload)
    }

    /// Convert provider-shaped call data into prompts via the parser
    /// registered under `model_name`.
    pub async fn serialize(
        &self,
        model_name: &str,
        data: &Value,
        prompt_name: &str,
        params: &Map<String, Value>,
    ) -> ArsenalResult<Vec<Prompt>> {
        let parser = self.registry.get(model_name)?;

        self.callbacks.publish(
            "on_serialize_start",
            json!({"model": model_name, "prompt": prompt_name}),
        );
        let prompts = parser
            .serialize(prompt_name, data, &self.config, params)
            .await?;
        self.callbacks.publish(
            "on_serialize_complete",
            json!({"model": model_name, "prompts": prompts.len()}),
        );
        Ok(prompts)
    }

    /// Execute one prompt, optionally running its upstream dependencies
    /// first.
    pub async fn run(
        &mut self,
        prompt_name: &str,
        params: &Map<String, Value>,
        options: &InferenceOptions,
        run_with_dependencies: bool,
    ) -> ArsenalResult<Vec<Output>> {
        if run_with_dependencies {
            self.run_with_dependencies(prompt_name, params, options).await
        } else {
            self.run_one(prompt_name, params, options).await
        }
    }

    /// Execute a prompt after its transitive dependencies, each exactly
    /// once, dependencies before dependents.
    ///
    /// Intermediate results stay on the configuration, so dependents see
    /// them through the parameter scope.
    pub async fn run_with_dependencies(
        &mut self,
        root: &str,
        params: &Map<String, Value>,
        options: &InferenceOptions,
    ) -> ArsenalResult<Vec<Output>> {
        let graph = dependency_graph(root, &self.config, &self.registry)?;
        let order = execution_order(root, &graph);

        tracing::debug!(root = root, prompts = order.len(), "Running dependency chain");

        let mut outputs = Vec::new();
        for prompt_name in order {
            outputs = self.run_one(&prompt_name, params, options).await?;
        }
        Ok(outputs)
    }

    async fn run_one(
        &mut self,
        prompt_name: &str,
        params: &Map<String, Value>,
        options: &InferenceOptions,
    ) -> ArsenalResult<Vec<Output>> {
        let prompt = self.config.get_prompt(prompt_name)?;
        let parser = self.registry.get_for_prompt(prompt, &self.config)?;

        self.callbacks.publish(
            "on_run_start",
            json!({"prompt": prompt_name, "stream": options.stream}),
        );
        let outputs = parser
            .run(prompt_name, &mut self.config, options, params)
            .await?;
        self.callbacks.publish(
            "on_run_complete",
            json!({"prompt": prompt_name, "outputs": outputs.len()}),
        );
        Ok(outputs)
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config.name)
            .field("prompts", &self.config.prompts().len())
            .finish()
    }
}

/// Post-order walk of the dependency graph: dependencies before dependents,
/// each node once.
fn execution_order(root: &str, graph: &HashMap<String, Vec<String>>) -> Vec<String> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    walk(root, graph, &mut visited, &mut order);
    order
}

fn walk(
    node: &str,
    graph: &HashMap<String, Vec<String>>,
    visited: &mut HashSet<String>,
    order: &mut Vec<String>,
) {
    if !visited.insert(node.to_string()) {
        return;
    }
    if let Some(dependencies) = graph.get(node) {
        for dependency in dependencies {
            walk(dependency, graph, visited, order);
        }
    }
    order.push(node.to_string());
}

// ============================================================================
// TESTS
// ============================================================================
