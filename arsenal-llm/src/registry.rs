//! Model parser registry
//!
//! Process-wide mapping from model identifier to parser. Admin mutations
//! (register/remove/clear) are sequenced before any run; per-configuration
//! `model_parsers` overrides are applied at configuration load without
//! touching other bindings.

use crate::parser::ModelParser;
use arsenal_core::{ArsenalResult, Configuration, Prompt, RegistryError};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

static GLOBAL_REGISTRY: Lazy<Arc<ParserRegistry>> = Lazy::new(|| Arc::new(ParserRegistry::new()));

/// Registry of model parsers keyed by model id.
pub struct ParserRegistry {
    parsers: RwLock<HashMap<String, Arc<dyn ModelParser>>>,
}

impl ParserRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            parsers: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<ParserRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Bind a parser under each given id, or under its own id when none are
    /// given. Rebinding an id replaces the previous parser.
    pub fn register(
        &self,
        parser: Arc<dyn ModelParser>,
        ids: Option<&[&str]>,
    ) -> ArsenalResult<()> {
        let mut parsers = self
            .parsers
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;
        match ids {
            Some(ids) => {
                for id in ids {
                    parsers.insert(id.to_string(), Arc::clone(&parser));
                }
            }
            None => {
                parsers.insert(parser.id().to_string(), parser);
            }
        }
        Ok(())
    }

    /// Look up the parser bound to a model id.
    pub fn get(&self, model_id: &str) -> ArsenalResult<Arc<dyn ModelParser>> {
        let parsers = self
            .parsers
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?;
        parsers
            .get(model_id)
            .cloned()
            .ok_or_else(|| {
                RegistryError::UnknownModel {
                    model_id: model_id.to_string(),
                }
                .into()
            })
    }

    /// Resolve a prompt's effective model name, then look up its parser.
    pub fn get_for_prompt(
        &self,
        prompt: &Prompt,
        config: &Configuration,
    ) -> ArsenalResult<Arc<dyn ModelParser>> {
        let model_name = config.model_name_for(prompt)?;
        self.get(&model_name)
    }

    /// Remove one binding.
    pub fn remove(&self, id: &str) -> ArsenalResult<()> {
        let mut parsers = self
            .parsers
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;
        parsers.remove(id);
        Ok(())
    }

    /// Remove all bindings.
    pub fn clear(&self) -> ArsenalResult<()> {
        let mut parsers = self
            .parsers
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;
        parsers.clear();
        Ok(())
    }

    /// All bound ids, sorted.
    pub fn ids(&self) -> ArsenalResult<Vec<String>> {
        let parsers = self
            .parsers
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?;
        let mut ids: Vec<String> = parsers.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Apply a configuration's `model_parsers` overrides: each
    /// `model_id -> parser_id` entry binds `model_id` to the parser
    /// currently registered under `parser_id`.
    ///
    /// An unknown `parser_id` fails, which in turn fails the configuration
    /// load that triggered it.
    pub fn apply_config_overrides(&self, config: &Configuration) -> ArsenalResult<()> {
        let overrides = match &config.metadata.model_parsers {
            Some(overrides) => overrides.clone(),
            None => return Ok(()),
        };

        for (model_id, parser_id) in overrides {
            let parser = self.get(&parser_id).map_err(|_| RegistryError::UnknownParser {
                parser_id: parser_id.clone(),
            })?;
            self.register(parser, Some(&[model_id.as_str()]))?;
        }
        Ok(())
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.parsers.read().map(|p| p.len()).unwrap_or(0);
        f.debug_struct("ParserRegistry")
            .field("parsers", &count)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockCompletionParser;
    use arsenal_core::{ArsenalError, Prompt};

    fn registry_with(ids: &[&str]) -> ParserRegistry {
        let registry = ParserRegistry::new();
        for id in ids {
            registry
                .register(Arc::new(MockCompletionParser::new(*id)), None)
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_register_and_get() {
        let registry = registry_with(&["mock"]);
        assert_eq!(registry.get("mock").unwrap().id(), "mock");
    }

    #[test]
    fn test_register_under_explicit_ids() {
        let registry = ParserRegistry::new();
        registry
            .register(
                Arc::new(MockCompletionParser::new("mock")),
                Some(&["model-a", "model-b"]),
            )
            .unwrap();

        assert_eq!(registry.get("model-a").unwrap().id(), "mock");
        assert_eq!(registry.get("model-b").unwrap().id(), "mock");
        assert!(registry.get("mock").is_err());
    }

    #[test]
    fn test_unknown_model_fails() {
        let registry = ParserRegistry::new();
        assert!(matches!(
            registry.get("ghost").unwrap_err(),
            ArsenalError::Registry(RegistryError::UnknownModel { .. })
        ));
    }

    #[test]
    fn test_remove_and_clear() {
        let registry = registry_with(&["a", "b"]);
        registry.remove("a").unwrap();
        assert!(registry.get("a").is_err());
        assert!(registry.get("b").is_ok());

        registry.clear().unwrap();
        assert!(registry.ids().unwrap().is_empty());
    }

    #[test]
    fn test_ids_sorted() {
        let registry = registry_with(&["zulu", "alpha", "mike"]);
        assert_eq!(registry.ids().unwrap(), vec!["alpha", "mike", "zulu"]);
    }

    #[test]
    fn test_get_for_prompt_uses_default_model() {
        let registry = registry_with(&["default-model"]);
        let mut config = Configuration::new("t");
        config.metadata.default_model = Some("default-model".to_string());
        config.add_prompt(Prompt::new("p1", "hi"), None).unwrap();

        let parser = registry
            .get_for_prompt(config.get_prompt("p1").unwrap(), &config)
            .unwrap();
        assert_eq!(parser.id(), "default-model");
    }

    #[test]
    fn test_get_for_prompt_prompt_binding_wins() {
        let registry = registry_with(&["default-model", "bound-model"]);
        let mut config = Configuration::new("t");
        config.metadata.default_model = Some("default-model".to_string());
        config
            .add_prompt(Prompt::new("p1", "hi").with_model("bound-model"), None)
            .unwrap();

        let parser = registry
            .get_for_prompt(config.get_prompt("p1").unwrap(), &config)
            .unwrap();
        assert_eq!(parser.id(), "bound-model");
    }

    #[test]
    fn test_apply_config_overrides() {
        let registry = registry_with(&["mock"]);
        let mut config = Configuration::new("t");
        config.metadata.model_parsers = Some(
            [("my-finetune".to_string(), "mock".to_string())]
                .into_iter()
                .collect(),
        );

        registry.apply_config_overrides(&config).unwrap();
        assert_eq!(registry.get("my-finetune").unwrap().id(), "mock");
    }

    #[test]
    fn test_apply_config_overrides_unknown_parser_fails() {
        let registry = ParserRegistry::new();
        let mut config = Configuration::new("t");
        config.metadata.model_parsers = Some(
            [("model".to_string(), "missing".to_string())]
                .into_iter()
                .collect(),
        );

        assert!(matches!(
            registry.apply_config_overrides(&config).unwrap_err(),
            ArsenalError::Registry(RegistryError::UnknownParser { .. })
        ));
    }
}
