//! Configuration document
//!
//! The mutable in-memory image of an ARSENAL JSON document: named prompt
//! sequence, global parameters, per-model defaults, and parser overrides.
//! Prompt order is semantic (it defines conversation history and dependency
//! cutoffs), so prompts live in a `Vec` with a derived name index that every
//! CRUD entry point keeps in lockstep with the sequence.

use crate::error::{ArsenalResult, ConfigError, PersistenceError};
use crate::{Output, Prompt, SchemaVersion};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

static PARAMETER_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.]+$").expect("parameter name regex is valid"));

// ============================================================================
// METADATA
// ============================================================================

/// Configuration-level metadata: global scope, model defaults, overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfigMetadata {
    /// Global parameter scope.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
    /// Default inference settings per model name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<String, Map<String, Value>>,
    /// Model used by prompts without an explicit binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Per-configuration model-to-parser overrides, applied at load time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_parsers: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// A parameterized, versioned AI configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    #[serde(default)]
    pub schema_version: SchemaVersion,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: ConfigMetadata,
    #[serde(default)]
    pub prompts: Vec<Prompt>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Derived name index; in lockstep with `prompts` at every yield point.
    #[serde(skip)]
    prompt_index: HashMap<String, usize>,
    /// Path this document was loaded from or last saved to.
    #[serde(skip)]
    file_path: Option<PathBuf>,
}

/// Equality is document equality: bookkeeping (index, bound path) excluded.
impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.schema_version == other.schema_version
            && self.description == other.description
            && self.metadata == other.metadata
            && self.prompts == other.prompts
            && self.extra == other.extra
    }
}

impl Configuration {
    /// Create a fresh empty configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_version: SchemaVersion::default(),
            description: String::new(),
            metadata: ConfigMetadata::default(),
            prompts: Vec::new(),
            extra: Map::new(),
            prompt_index: HashMap::new(),
            file_path: None,
        }
    }

    // ========================================================================
    // PROMPT CRUD
    // ========================================================================

    /// The ordered prompt sequence.
    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    /// Position of a prompt in the sequence.
    pub fn prompt_position(&self, name: &str) -> Option<usize> {
        self.prompt_index.get(name).copied()
    }

    /// Look up a prompt by name.
    pub fn get_prompt(&self, name: &str) -> ArsenalResult<&Prompt> {
        let index = self.require_position(name)?;
        Ok(&self.prompts[index])
    }

    /// Look up a prompt by name, mutably.
    pub fn get_prompt_mut(&mut self, name: &str) -> ArsenalResult<&mut Prompt> {
        let index = self.require_position(name)?;
        Ok(&mut self.prompts[index])
    }

    /// Prompts strictly earlier in the sequence than `name`.
    pub fn prompts_before(&self, name: &str) -> ArsenalResult<&[Prompt]> {
        let index = self.require_position(name)?;
        Ok(&self.prompts[..index])
    }

    /// Insert a prompt. An out-of-range or missing index appends.
    pub fn add_prompt(&mut self, prompt: Prompt, index: Option<usize>) -> ArsenalResult<()> {
        if self.prompt_index.contains_key(&prompt.name) {
            return Err(ConfigError::DuplicatePrompt {
                name: prompt.name.clone(),
            }
            .into());
        }
        let at = index.unwrap_or(self.prompts.len()).min(self.prompts.len());
        self.prompts.insert(at, prompt);
        self.rebuild_index();
        Ok(())
    }

    /// Replace the prompt named `name`. Renames re-key the index.
    pub fn update_prompt(&mut self, name: &str, prompt: Prompt) -> ArsenalResult<()> {
        let index = self.require_position(name)?;
        if prompt.name != name && self.prompt_index.contains_key(&prompt.name) {
            return Err(ConfigError::DuplicatePrompt {
                name: prompt.name.clone(),
            }
            .into());
        }
        self.prompts[index] = prompt;
        self.rebuild_index();
        Ok(())
    }

    /// Remove and return the prompt named `name`.
    pub fn delete_prompt(&mut self, name: &str) -> ArsenalResult<Prompt> {
        let index = self.require_position(name)?;
        let prompt = self.prompts.remove(index);
        self.rebuild_index();
        Ok(prompt)
    }

    /// Update the document name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Update the document description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    // ========================================================================
    // PARAMETERS
    // ========================================================================

    /// Parameters for the configuration, or for one prompt.
    pub fn get_parameters(&self, prompt_name: Option<&str>) -> ArsenalResult<Map<String, Value>> {
        match prompt_name {
            None => Ok(self.metadata.parameters.clone()),
            Some(name) => {
                let prompt = self.get_prompt(name)?;
                Ok(prompt.parameters().cloned().unwrap_or_default())
            }
        }
    }

    /// Set one parameter, globally or prompt-scoped.
    pub fn set_parameter(
        &mut self,
        name: &str,
        value: Value,
        prompt_name: Option<&str>,
    ) -> ArsenalResult<()> {
        validate_parameter_name(name)?;
        match prompt_name {
            None => {
                self.metadata.parameters.insert(name.to_string(), value);
            }
            Some(prompt_name) => {
                let prompt = self.get_prompt_mut(prompt_name)?;
                let metadata = prompt.metadata.get_or_insert_with(Default::default);
                metadata.parameters.insert(name.to_string(), value);
            }
        }
        Ok(())
    }

    /// Merge a parameter map, globally or prompt-scoped.
    pub fn set_parameters(
        &mut self,
        parameters: Map<String, Value>,
        prompt_name: Option<&str>,
    ) -> ArsenalResult<()> {
        for name in parameters.keys() {
            validate_parameter_name(name)?;
        }
        for (name, value) in parameters {
            self.set_parameter(&name, value, prompt_name)?;
        }
        Ok(())
    }

    /// Delete one parameter, globally or prompt-scoped.
    pub fn delete_parameter(&mut self, name: &str, prompt_name: Option<&str>) -> ArsenalResult<()> {
        let removed = match prompt_name {
            None => self.metadata.parameters.remove(name),
            Some(prompt_name) => {
                let prompt = self.get_prompt_mut(prompt_name)?;
                prompt
                    .metadata
                    .as_mut()
                    .and_then(|m| m.parameters.remove(name))
            }
        };
        match removed {
            Some(_) => Ok(()),
            None => Err(ConfigError::ParameterNotFound {
                name: name.to_string(),
            }
            .into()),
        }
    }

    // ========================================================================
    // MODELS
    // ========================================================================

    /// Set model settings, config-scoped or prompt-scoped.
    pub fn update_model(
        &mut self,
        model_name: &str,
        settings: Map<String, Value>,
        prompt_name: Option<&str>,
    ) -> ArsenalResult<()> {
        match prompt_name {
            None => {
                self.metadata
                    .models
                    .insert(model_name.to_string(), settings);
            }
            Some(prompt_name) => {
                let prompt = self.get_prompt_mut(prompt_name)?;
                let metadata = prompt.metadata.get_or_insert_with(Default::default);
                metadata.model = Some(crate::ModelRef::Full(crate::ModelMetadata {
                    name: model_name.to_string(),
                    settings,
                }));
            }
        }
        Ok(())
    }

    /// Remove a model's global settings entry.
    pub fn delete_model(&mut self, model_name: &str) -> ArsenalResult<()> {
        match self.metadata.models.remove(model_name) {
            Some(_) => Ok(()),
            None => Err(ConfigError::ModelNotFound {
                name: model_name.to_string(),
            }
            .into()),
        }
    }

    /// Resolve a prompt's effective model name: prompt binding, else the
    /// configuration default.
    pub fn model_name_for(&self, prompt: &Prompt) -> ArsenalResult<String> {
        if let Some(model) = prompt.model_ref() {
            return Ok(model.name().to_string());
        }
        self.metadata
            .default_model
            .clone()
            .ok_or_else(|| {
                ConfigError::NoModelSpecified {
                    prompt: prompt.name.clone(),
                }
                .into()
            })
    }

    /// Global default settings for a model, when configured.
    pub fn global_model_settings(&self, model_name: &str) -> Option<&Map<String, Value>> {
        self.metadata.models.get(model_name)
    }

    // ========================================================================
    // OUTPUTS
    // ========================================================================

    /// Append an output to a prompt, or replace its history.
    pub fn add_output(
        &mut self,
        prompt_name: &str,
        output: Output,
        overwrite: bool,
    ) -> ArsenalResult<()> {
        let prompt = self.get_prompt_mut(prompt_name)?;
        if overwrite {
            prompt.outputs.clear();
        }
        prompt.outputs.push(output);
        Ok(())
    }

    /// Replace a prompt's outputs wholesale.
    pub fn set_outputs(&mut self, prompt_name: &str, outputs: Vec<Output>) -> ArsenalResult<()> {
        let prompt = self.get_prompt_mut(prompt_name)?;
        prompt.outputs = outputs;
        Ok(())
    }

    /// Clear and return a prompt's outputs.
    pub fn delete_outputs(&mut self, prompt_name: &str) -> ArsenalResult<Vec<Output>> {
        let prompt = self.get_prompt_mut(prompt_name)?;
        Ok(std::mem::take(&mut prompt.outputs))
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Load a configuration from a JSON file.
    ///
    /// Duplicate prompt names fail the load; the bound path is recorded so a
    /// later `save(None, ..)` writes back to the same file.
    pub fn load(path: impl AsRef<Path>) -> ArsenalResult<Configuration> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PersistenceError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let contents = std::fs::read_to_string(path).map_err(PersistenceError::Io)?;
        let mut config: Configuration =
            serde_json::from_str(&contents).map_err(PersistenceError::Json)?;
        config.validate_unique_names()?;
        config.rebuild_index();
        config.file_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON.
    ///
    /// With `path == None` the bound path is used. `include_outputs = false`
    /// strips outputs from the serialized form without touching the
    /// in-memory document. Returns the path written.
    pub fn save(&mut self, path: Option<&Path>, include_outputs: bool) -> ArsenalResult<PathBuf> {
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => self
                .file_path
                .clone()
                .ok_or(PersistenceError::NoPathBound)?,
        };
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(PersistenceError::Io)?;
            }
        }
        let value = self.to_json(include_outputs)?;
        let contents = serde_json::to_string_pretty(&value).map_err(PersistenceError::Json)?;
        std::fs::write(&target, contents).map_err(PersistenceError::Io)?;
        self.file_path = Some(target.clone());
        Ok(target)
    }

    /// Serialize to a JSON value, optionally stripping outputs.
    pub fn to_json(&self, include_outputs: bool) -> ArsenalResult<Value> {
        if include_outputs {
            return serde_json::to_value(self)
                .map_err(|e| PersistenceError::Json(e).into());
        }
        let mut stripped = self.clone();
        for prompt in &mut stripped.prompts {
            prompt.outputs.clear();
        }
        serde_json::to_value(&stripped).map_err(|e| PersistenceError::Json(e).into())
    }

    /// The path this document is bound to, when any.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Bind the document to a path without writing.
    pub fn set_file_path(&mut self, path: Option<PathBuf>) {
        self.file_path = path;
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn require_position(&self, name: &str) -> Result<usize, ConfigError> {
        self.prompt_index
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::PromptNotFound {
                name: name.to_string(),
            })
    }

    /// Rebuild the derived name index from the sequence.
    ///
    /// Called by every sequence mutation before control returns to the
    /// caller, and after deserialization (the index is not serialized).
    pub fn rebuild_index(&mut self) {
        self.prompt_index = self
            .prompts
            .iter()
            .enumerate()
            .map(|(index, prompt)| (prompt.name.clone(), index))
            .collect();
    }

    fn validate_unique_names(&self) -> Result<(), ConfigError> {
        let mut seen = HashMap::with_capacity(self.prompts.len());
        for prompt in &self.prompts {
            if seen.insert(prompt.name.as_str(), ()).is_some() {
                return Err(ConfigError::DuplicatePrompt {
                    name: prompt.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Validate a parameter identifier: only `[a-zA-Z0-9_.]` is allowed.
pub fn validate_parameter_name(name: &str) -> Result<(), ConfigError> {
    if PARAMETER_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameterName {
            name: name.to_string(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PromptMetadata;
    use serde_json::json;

    fn config_with(names: &[&str]) -> Configuration {
        let mut config = Configuration::new("test");
        for name in names {
            config
                .add_prompt(Prompt::new(*name, "template"), None)
                .unwrap();
        }
        config
    }

    #[test]
    fn test_add_prompt_maintains_index() {
        let config = config_with(&["p1", "p2", "p3"]);
        assert_eq!(config.prompt_position("p1"), Some(0));
        assert_eq!(config.prompt_position("p3"), Some(2));
        assert_eq!(config.prompts().len(), 3);
    }

    #[test]
    fn test_add_prompt_at_index() {
        let mut config = config_with(&["p1", "p3"]);
        config
            .add_prompt(Prompt::new("p2", "template"), Some(1))
            .unwrap();
        let names: Vec<_> = config.prompts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["p1", "p2", "p3"]);
        assert_eq!(config.prompt_position("p3"), Some(2));
    }

    #[test]
    fn test_add_prompt_out_of_range_index_appends() {
        let mut config = config_with(&["p1"]);
        config
            .add_prompt(Prompt::new("p2", "template"), Some(99))
            .unwrap();
        assert_eq!(config.prompt_position("p2"), Some(1));
    }

    #[test]
    fn test_duplicate_prompt_rejected() {
        let mut config = config_with(&["p1"]);
        let err = config
            .add_prompt(Prompt::new("p1", "other"), None)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::ArsenalError::Config(ConfigError::DuplicatePrompt { .. })
        ));
    }

    #[test]
    fn test_delete_prompt_reindexes() {
        let mut config = config_with(&["p1", "p2", "p3"]);
        config.delete_prompt("p2").unwrap();
        assert_eq!(config.prompt_position("p3"), Some(1));
        assert!(config.prompt_position("p2").is_none());
    }

    #[test]
    fn test_update_prompt_rename() {
        let mut config = config_with(&["p1", "p2"]);
        config
            .update_prompt("p1", Prompt::new("first", "changed"))
            .unwrap();
        assert!(config.prompt_position("p1").is_none());
        assert_eq!(config.prompt_position("first"), Some(0));

        let err = config
            .update_prompt("first", Prompt::new("p2", "clash"))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::ArsenalError::Config(ConfigError::DuplicatePrompt { .. })
        ));
    }

    #[test]
    fn test_unknown_prompt_lookup_fails() {
        let config = config_with(&[]);
        assert!(matches!(
            config.get_prompt("ghost").unwrap_err(),
            crate::ArsenalError::Config(ConfigError::PromptNotFound { .. })
        ));
    }

    #[test]
    fn test_parameter_scoping() {
        let mut config = config_with(&["p1"]);
        config
            .set_parameter("city", json!("Rotterdam"), None)
            .unwrap();
        config
            .set_parameter("city", json!("Utrecht"), Some("p1"))
            .unwrap();

        assert_eq!(
            config.get_parameters(None).unwrap()["city"],
            json!("Rotterdam")
        );
        assert_eq!(
            config.get_parameters(Some("p1")).unwrap()["city"],
            json!("Utrecht")
        );
    }

    #[test]
    fn test_parameter_name_validation() {
        let mut config = config_with(&[]);
        assert!(config.set_parameter("ok_name.v2", json!(1), None).is_ok());
        let err = config
            .set_parameter("not allowed", json!(1), None)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::ArsenalError::Config(ConfigError::InvalidParameterName { .. })
        ));
    }

    #[test]
    fn test_delete_parameter() {
        let mut config = config_with(&["p1"]);
        config.set_parameter("k", json!(1), Some("p1")).unwrap();
        config.delete_parameter("k", Some("p1")).unwrap();
        assert!(matches!(
            config.delete_parameter("k", Some("p1")).unwrap_err(),
            crate::ArsenalError::Config(ConfigError::ParameterNotFound { .. })
        ));
    }

    #[test]
    fn test_model_name_resolution() {
        let mut config = config_with(&["p1"]);
        let prompt = config.get_prompt("p1").unwrap().clone();

        // No binding anywhere.
        assert!(config.model_name_for(&prompt).is_err());

        // Configuration default.
        config.metadata.default_model = Some("default-model".to_string());
        assert_eq!(config.model_name_for(&prompt).unwrap(), "default-model");

        // Prompt binding wins.
        let bound = prompt.clone().with_model("prompt-model");
        assert_eq!(config.model_name_for(&bound).unwrap(), "prompt-model");
    }

    #[test]
    fn test_update_model_scopes() {
        let mut config = config_with(&["p1"]);
        let mut settings = Map::new();
        settings.insert("temperature".to_string(), json!(0.7));

        config.update_model("m", settings.clone(), None).unwrap();
        assert_eq!(
            config.global_model_settings("m").unwrap()["temperature"],
            json!(0.7)
        );

        config.update_model("m", settings, Some("p1")).unwrap();
        let prompt = config.get_prompt("p1").unwrap();
        assert_eq!(prompt.model_ref().unwrap().name(), "m");
    }

    #[test]
    fn test_outputs_lifecycle() {
        let mut config = config_with(&["p1"]);
        config
            .add_output("p1", Output::text("first"), false)
            .unwrap();
        config
            .add_output("p1", Output::text("second"), false)
            .unwrap();
        assert_eq!(config.get_prompt("p1").unwrap().outputs.len(), 2);

        config
            .add_output("p1", Output::text("only"), true)
            .unwrap();
        assert_eq!(config.get_prompt("p1").unwrap().outputs.len(), 1);

        let removed = config.delete_outputs("p1").unwrap();
        assert_eq!(removed.len(), 1);
        assert!(config.get_prompt("p1").unwrap().outputs.is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");

        let mut config = config_with(&["p1", "p2"]);
        config.set_description("round trip");
        config
            .set_parameter("global_key", json!("G"), None)
            .unwrap();
        config
            .set_parameter("local_key", json!("L"), Some("p1"))
            .unwrap();
        config.add_output("p1", Output::text("out"), false).unwrap();

        config.save(Some(&path), true).unwrap();
        let loaded = Configuration::load(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.file_path(), Some(path.as_path()));
        assert_eq!(
            loaded.get_parameters(Some("p1")).unwrap()["local_key"],
            json!("L")
        );
    }

    #[test]
    fn test_save_without_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean.json");

        let mut config = config_with(&["p1"]);
        config.add_output("p1", Output::text("out"), false).unwrap();
        config.save(Some(&path), false).unwrap();

        // In-memory outputs untouched, on-disk outputs stripped.
        assert_eq!(config.get_prompt("p1").unwrap().outputs.len(), 1);
        let loaded = Configuration::load(&path).unwrap();
        assert!(loaded.get_prompt("p1").unwrap().outputs.is_empty());
    }

    #[test]
    fn test_save_to_bound_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bound.json");

        let mut config = config_with(&["p1"]);
        assert!(config.save(None, true).is_err());

        config.save(Some(&path), true).unwrap();
        config.set_description("updated");
        config.save(None, true).unwrap();

        let loaded = Configuration::load(&path).unwrap();
        assert_eq!(loaded.description, "updated");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Configuration::load("/nonexistent/cfg.json").unwrap_err();
        assert!(matches!(
            err,
            crate::ArsenalError::Persistence(PersistenceError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_load_rejects_duplicate_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.json");
        std::fs::write(
            &path,
            json!({
                "name": "dup",
                "prompts": [
                    {"name": "p1", "input": "a"},
                    {"name": "p1", "input": "b"}
                ]
            })
            .to_string(),
        )
        .unwrap();

        assert!(matches!(
            Configuration::load(&path).unwrap_err(),
            crate::ArsenalError::Config(ConfigError::DuplicatePrompt { .. })
        ));
    }

    #[test]
    fn test_unknown_top_level_keys_roundtrip() {
        let raw = json!({
            "name": "x",
            "schema_version": "latest",
            "description": "",
            "prompts": [],
            "vendor_extension": {"a": [1, 2]}
        });
        let config: Configuration = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(config.extra["vendor_extension"], json!({"a": [1, 2]}));
        let out = serde_json::to_value(&config).unwrap();
        assert_eq!(out["vendor_extension"], raw["vendor_extension"]);
    }

    #[test]
    fn test_bookkeeping_keys_not_serialized() {
        let mut config = config_with(&["p1"]);
        config.set_file_path(Some(PathBuf::from("/tmp/x.json")));
        let value = config.to_json(true).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("prompt_index"));
        assert!(!object.contains_key("file_path"));
    }

    #[test]
    fn test_prompt_local_metadata_survives_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");

        let mut config = Configuration::new("meta");
        let prompt = Prompt::new("p1", "hi").with_metadata(PromptMetadata {
            tags: Some(vec!["greeting".to_string()]),
            ..Default::default()
        });
        config.add_prompt(prompt, None).unwrap();
        config.save(Some(&path), true).unwrap();

        let loaded = Configuration::load(&path).unwrap();
        let tags = loaded
            .get_prompt("p1")
            .unwrap()
            .metadata
            .as_ref()
            .unwrap()
            .tags
            .clone();
        assert_eq!(tags, Some(vec!["greeting".to_string()]));
    }
}
