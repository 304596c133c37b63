//! Reference extraction
//!
//! Reports which names a template references, and which sub-fields of each
//! name, in a single pass over the tag stream. The context stack discipline
//! mirrors the resolver: `#each`/`#with` rebind the context, so names seen
//! inside those blocks attribute to the block operand's root.

use crate::error::TemplateError;
use crate::scanner::Scanner;
use crate::token::{BlockKind, Segment, Tag};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// NAME REFERENCES
// ============================================================================

/// How a template references a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameRef {
    /// The whole value is referenced (`{{name}}`).
    Whole,
    /// Specific sub-fields are referenced (`{{name.input}}`).
    Fields(BTreeSet<String>),
}

impl NameRef {
    fn add_field(&mut self, field: &str) {
        match self {
            NameRef::Whole => {
                let mut fields = BTreeSet::new();
                fields.insert(field.to_string());
                *self = NameRef::Fields(fields);
            }
            NameRef::Fields(fields) => {
                fields.insert(field.to_string());
            }
        }
    }

    /// Check whether a specific sub-field is referenced.
    pub fn references_field(&self, field: &str) -> bool {
        match self {
            NameRef::Whole => false,
            NameRef::Fields(fields) => fields.contains(field),
        }
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Extract the names referenced by a template.
///
/// Top-level keys are referenced identifiers; a [`NameRef::Fields`] value
/// lists the accessed sub-fields. Comment tags are ignored, `else` is a
/// no-op, and block closes pop the context stack.
pub fn extract_names(template: &str) -> Result<BTreeMap<String, NameRef>, TemplateError> {
    let segments = Scanner::new(template).scan()?;
    let mut names: BTreeMap<String, NameRef> = BTreeMap::new();
    let mut context_stack: Vec<Option<String>> = Vec::new();

    for segment in segments {
        let tag = match segment {
            Segment::Tag(tag) => tag,
            Segment::Literal(_) => continue,
        };

        match tag {
            Tag::Comment | Tag::Else => {}
            Tag::Expression(path) => {
                record(&mut names, &context_stack, &path);
            }
            Tag::BlockOpen { kind, operand } => {
                record(&mut names, &context_stack, &operand);
                match kind {
                    // each/with rebind the context for nested names.
                    BlockKind::Each | BlockKind::With => {
                        context_stack.push(Some(root_of(&context_stack, &operand)))
                    }
                    BlockKind::If | BlockKind::Unless => context_stack.push(None),
                }
            }
            Tag::BlockClose { .. } => {
                context_stack.pop();
            }
        }
    }

    Ok(names)
}

/// Record one referenced path against the current context.
fn record(names: &mut BTreeMap<String, NameRef>, context_stack: &[Option<String>], path: &str) {
    let context = innermost_context(context_stack);

    match context {
        Some(root) => {
            // Inside a rebound context every name is a field of the root.
            let field = path.strip_prefix("this.").unwrap_or(path);
            if field == "this" {
                return;
            }
            names
                .entry(root.to_string())
                .or_insert_with(|| NameRef::Fields(BTreeSet::new()))
                .add_field(field.split('.').next().unwrap_or(field));
        }
        None => {
            let mut parts = path.splitn(2, '.');
            let root = parts.next().unwrap_or(path);
            if root == "this" || root.is_empty() {
                return;
            }
            match parts.next() {
                Some(field) => {
                    let first = field.split('.').next().unwrap_or(field);
                    names
                        .entry(root.to_string())
                        .or_insert_with(|| NameRef::Fields(BTreeSet::new()))
                        .add_field(first);
                }
                None => {
                    names.entry(root.to_string()).or_insert(NameRef::Whole);
                }
            }
        }
    }
}

fn innermost_context(context_stack: &[Option<String>]) -> Option<&str> {
    context_stack
        .iter()
        .rev()
        .find_map(|ctx| ctx.as_deref())
}

fn root_of(context_stack: &[Option<String>], operand: &str) -> String {
    match innermost_context(context_stack) {
        Some(root) => root.to_string(),
        None => operand
            .split('.')
            .next()
            .unwrap_or(operand)
            .to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> NameRef {
        NameRef::Fields(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_extract_plain_and_dotted() {
        let names =
            extract_names("Hello, {{name}}, see {{prompt1.input}} and {{prompt1.output}}.")
                .unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("name".to_string(), NameRef::Whole);
        expected.insert("prompt1".to_string(), fields(&["input", "output"]));
        assert_eq!(names, expected);
    }

    #[test]
    fn test_extract_ignores_comments_and_else() {
        let names = extract_names("{{! note }}{{#if a}}{{b}}{{else}}{{c}}{{/if}}").unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("a".to_string(), NameRef::Whole);
        expected.insert("b".to_string(), NameRef::Whole);
        expected.insert("c".to_string(), NameRef::Whole);
        assert_eq!(names, expected);
    }

    #[test]
    fn test_extract_each_context() {
        let names = extract_names("{{#each rows}}{{title}}/{{this.body}}{{/each}}").unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("rows".to_string(), fields(&["title", "body"]));
        assert_eq!(names, expected);
    }

    #[test]
    fn test_extract_with_context() {
        let names = extract_names("{{#with obj}}{{field}}{{/with}}{{after}}").unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("obj".to_string(), fields(&["field"]));
        expected.insert("after".to_string(), NameRef::Whole);
        assert_eq!(names, expected);
    }

    #[test]
    fn test_extract_if_does_not_rebind() {
        let names = extract_names("{{#if flag}}{{p.output}}{{/if}}").unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("flag".to_string(), NameRef::Whole);
        expected.insert("p".to_string(), fields(&["output"]));
        assert_eq!(names, expected);
    }

    #[test]
    fn test_extract_whole_upgrades_to_fields() {
        let names = extract_names("{{p}} then {{p.input}}").unwrap();
        assert_eq!(names.get("p"), Some(&fields(&["input"])));
    }

    #[test]
    fn test_extract_this_is_skipped() {
        let names = extract_names("{{#each xs}}{{this}}{{/each}}").unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("xs".to_string(), NameRef::Whole);
        assert_eq!(names, expected);
    }

    #[test]
    fn test_extract_empty_template() {
        assert!(extract_names("no references at all").unwrap().is_empty());
    }

    #[test]
    fn test_references_field() {
        let r = fields(&["input"]);
        assert!(r.references_field("input"));
        assert!(!r.references_field("output"));
        assert!(!NameRef::Whole.references_field("input"));
    }
}
