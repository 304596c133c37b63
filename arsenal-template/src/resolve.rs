//! Template rendering
//!
//! Renders a scanned template against a parameter scope. Substitutions are
//! HTML-escaped with the handlebars escape set; consumers that need the raw
//! value store it in the scope and read it back out of the completion
//! payload instead of round-tripping through a template.

use crate::error::TemplateError;
use crate::scanner::Scanner;
use crate::token::{BlockKind, Segment, Tag};
use serde_json::{Map, Value};

// ============================================================================
// PUBLIC API
// ============================================================================

/// Resolve a template against a parameter scope.
///
/// Unknown references render as the empty string (handlebars default).
/// Invalid template syntax fails with [`TemplateError`].
pub fn resolve(template: &str, scope: &Map<String, Value>) -> Result<String, TemplateError> {
    let segments = Scanner::new(template).scan()?;
    let nodes = parse_nodes(segments)?;
    let context = Value::Object(scope.clone());
    let mut out = String::with_capacity(template.len());
    render_nodes(&nodes, &context, &mut out);
    Ok(out)
}

// ============================================================================
// NODE TREE
// ============================================================================

#[derive(Debug)]
enum Node {
    Text(String),
    Variable(String),
    Block {
        kind: BlockKind,
        operand: String,
        body: Vec<Node>,
        else_body: Vec<Node>,
    },
}

struct Frame {
    kind: BlockKind,
    operand: String,
    body: Vec<Node>,
    else_body: Vec<Node>,
    in_else: bool,
}

impl Frame {
    fn push(&mut self, node: Node) {
        if self.in_else {
            self.else_body.push(node);
        } else {
            self.body.push(node);
        }
    }
}

/// Fold the flat segment stream into a block tree.
fn parse_nodes(segments: Vec<Segment>) -> Result<Vec<Node>, TemplateError> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    let mut emit = |stack: &mut Vec<Frame>, root: &mut Vec<Node>, node: Node| {
        match stack.last_mut() {
            Some(frame) => frame.push(node),
            None => root.push(node),
        }
    };

    for segment in segments {
        match segment {
            Segment::Literal(text) => emit(&mut stack, &mut root, Node::Text(text)),
            Segment::Tag(Tag::Comment) => {}
            Segment::Tag(Tag::Expression(path)) => {
                emit(&mut stack, &mut root, Node::Variable(path))
            }
            Segment::Tag(Tag::BlockOpen { kind, operand }) => {
                stack.push(Frame {
                    kind,
                    operand,
                    body: Vec::new(),
                    else_body: Vec::new(),
                    in_else: false,
                });
            }
            Segment::Tag(Tag::Else) => match stack.last_mut() {
                Some(frame) => frame.in_else = true,
                None => return Err(TemplateError::DanglingElse),
            },
            Segment::Tag(Tag::BlockClose { kind }) => {
                let frame = stack.pop().ok_or_else(|| TemplateError::UnexpectedClose {
                    name: kind.name().to_string(),
                })?;
                if frame.kind != kind {
                    return Err(TemplateError::MismatchedClose {
                        expected: frame.kind.name().to_string(),
                        found: kind.name().to_string(),
                    });
                }
                let node = Node::Block {
                    kind: frame.kind,
                    operand: frame.operand,
                    body: frame.body,
                    else_body: frame.else_body,
                };
                emit(&mut stack, &mut root, node);
            }
        }
    }

    if let Some(frame) = stack.pop() {
        return Err(TemplateError::UnclosedBlock {
            name: frame.kind.name().to_string(),
        });
    }

    Ok(root)
}

// ============================================================================
// RENDERING
// ============================================================================

fn render_nodes(nodes: &[Node], context: &Value, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable(path) => {
                let value = lookup(path, context);
                out.push_str(&escape_html(&render_value(value.as_ref())));
            }
            Node::Block {
                kind,
                operand,
                body,
                else_body,
            } => render_block(*kind, operand, body, else_body, context, out),
        }
    }
}

fn render_block(
    kind: BlockKind,
    operand: &str,
    body: &[Node],
    else_body: &[Node],
    context: &Value,
    out: &mut String,
) {
    let value = lookup(operand, context);
    match kind {
        BlockKind::If => {
            if is_truthy(value.as_ref()) {
                render_nodes(body, context, out);
            } else {
                render_nodes(else_body, context, out);
            }
        }
        BlockKind::Unless => {
            if is_truthy(value.as_ref()) {
                render_nodes(else_body, context, out);
            } else {
                render_nodes(body, context, out);
            }
        }
        BlockKind::Each => match value {
            Some(Value::Array(items)) if !items.is_empty() => {
                for item in &items {
                    render_nodes(body, item, out);
                }
            }
            _ => render_nodes(else_body, context, out),
        },
        BlockKind::With => match value {
            Some(inner) if is_truthy(Some(&inner)) => render_nodes(body, &inner, out),
            _ => render_nodes(else_body, context, out),
        },
    }
}

/// Look up a dotted path in the current context.
///
/// `this` names the context itself. Inside `#each`/`#with` the context is
/// the bound element; plain names do not fall back to outer scopes.
fn lookup(path: &str, context: &Value) -> Option<Value> {
    let mut current = context.clone();
    let mut first = true;

    for component in path.split('.') {
        if first && component == "this" {
            first = false;
            continue;
        }
        first = false;
        current = current.get(component)?.clone();
    }

    Some(current)
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        // Compound values render as compact JSON.
        Some(other) => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Handlebars truthiness: false, null, missing, "", 0 and [] are falsy.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(_)) => true,
    }
}

/// The handlebars escape set, byte-for-byte.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================
