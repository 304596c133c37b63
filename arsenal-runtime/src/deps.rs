//! Prompt dependency analysis
//!
//! Cross-prompt references (`{{other.input}}`, `{{other.output}}`) induce a
//! dependency graph over the configuration's prompt sequence. Only upstream
//! references count: a name that appears at or after the referencing prompt
//! in the sequence is not a dependency, so the graph is acyclic by
//! construction.

use arsenal_core::{ArsenalResult, Configuration, Prompt};
use arsenal_llm::ParserRegistry;
use arsenal_template::extract_names;
use std::collections::HashMap;

/// Direct-upstream dependency graph rooted at `root`.
///
/// Keys are prompt names reachable from the root; values are each prompt's
/// direct dependencies in sequence order. Prompts without dependencies get
/// no entry.
pub fn dependency_graph(
    root: &str,
    config: &Configuration,
    registry: &ParserRegistry,
) -> ArsenalResult<HashMap<String, Vec<String>>> {
    let mut graph = HashMap::new();
    let mut visited = Vec::new();
    visit(root, config, registry, &mut graph, &mut visited)?;
    Ok(graph)
}

fn visit(
    name: &str,
    config: &Configuration,
    registry: &ParserRegistry,
    graph: &mut HashMap<String, Vec<String>>,
    visited: &mut Vec<String>,
) -> ArsenalResult<()> {
    if visited.iter().any(|seen| seen == name) {
        return Ok(());
    }
    visited.push(name.to_string());

    let prompt = config.get_prompt(name)?;
    let dependencies = direct_dependencies(prompt, config, registry)?;

    for dependency in &dependencies {
        visit(dependency, config, registry, graph, visited)?;
    }
    if !dependencies.is_empty() {
        graph.insert(name.to_string(), dependencies);
    }
    Ok(())
}

/// A prompt's direct upstream dependencies, in sequence order.
fn direct_dependencies(
    prompt: &Prompt,
    config: &Configuration,
    registry: &ParserRegistry,
) -> ArsenalResult<Vec<String>> {
    let position = match config.prompt_position(&prompt.name) {
        Some(position) => position,
        None => return Ok(Vec::new()),
    };

    // The parser may override the template used for reference collection;
    // prompts without a resolvable parser fall back to their raw input.
    let template = match registry.get_for_prompt(prompt, config) {
        Ok(parser) => match parser.get_prompt_template(prompt, config) {
            Ok(template) => template,
            Err(_) => return Ok(Vec::new()),
        },
        Err(_) => match prompt.input.template() {
            Some(template) => template.to_string(),
            None => return Ok(Vec::new()),
        },
    };

    let mut dependencies: Vec<(usize, String)> = extract_names(&template)?
        .into_keys()
        .filter_map(|name| {
            config
                .prompt_position(&name)
                .filter(|&candidate| candidate < position)
                .map(|candidate| (candidate, name))
        })
        .collect();
    dependencies.sort();

    Ok(dependencies.into_iter().map(|(_, name)| name).collect())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use arsenal_core::Prompt;

    fn four_prompt_config() -> Configuration {
        let mut config = Configuration::new("deps");
        // p2 references p4 downstream; that edge must be dropped.
        config.add_prompt(Prompt::new("p1", "a literal"), None).unwrap();
        config
            .add_prompt(Prompt::new("p2", "{{p1.input}} and {{p4.output}}"), None)
            .unwrap();
        config
            .add_prompt(Prompt::new("p3", "{{p2.input}}"), None)
            .unwrap();
        config
            .add_prompt(Prompt::new("p4", "{{p3.output}} with {{p1.output}}"), None)
            .unwrap();
        config
    }

    #[test]
    fn test_graph_keeps_only_upstream_edges() {
        let config = four_prompt_config();
        let registry = ParserRegistry::new();
        let graph = dependency_graph("p4", &config, &registry).unwrap();

        let mut expected = HashMap::new();
        expected.insert("p4".to_string(), vec!["p1".to_string(), "p3".to_string()]);
        expected.insert("p3".to_string(), vec!["p2".to_string()]);
        expected.insert("p2".to_string(), vec!["p1".to_string()]);
        assert_eq!(graph, expected);
    }

    #[test]
    fn test_every_edge_points_upstream() {
        let config = four_prompt_config();
        let registry = ParserRegistry::new();
        let graph = dependency_graph("p4", &config, &registry).unwrap();

        for (node, dependencies) in &graph {
            let node_position = config.prompt_position(node).unwrap();
            for dependency in dependencies {
                assert!(config.prompt_position(dependency).unwrap() < node_position);
            }
        }
    }

    #[test]
    fn test_literal_prompt_has_no_entry() {
        let config = four_prompt_config();
        let registry = ParserRegistry::new();
        let graph = dependency_graph("p4", &config, &registry).unwrap();
        assert!(!graph.contains_key("p1"));
    }

    #[test]
    fn test_missing_referenced_prompt_ignored() {
        let mut config = Configuration::new("deps");
        config
            .add_prompt(Prompt::new("p1", "{{ghost.output}} {{name}}"), None)
            .unwrap();
        let registry = ParserRegistry::new();
        let graph = dependency_graph("p1", &config, &registry).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn test_unknown_root_fails() {
        let config = four_prompt_config();
        let registry = ParserRegistry::new();
        assert!(dependency_graph("ghost", &config, &registry).is_err());
    }
}
