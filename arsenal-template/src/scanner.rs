//! Template scanner
//!
//! Splits a template into literal runs and `{{ ... }}` tags. Both the
//! resolver and the name extractor consume this stream, which keeps the two
//! passes in agreement about tag boundaries and comment handling.

use crate::error::TemplateError;
use crate::token::{BlockKind, Segment, Tag};

// ============================================================================
// SCANNER
// ============================================================================

/// Scanner over a template source.
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given template.
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    /// Scan the entire template into segments.
    pub fn scan(mut self) -> Result<Vec<Segment>, TemplateError> {
        let mut segments = Vec::new();

        while self.pos < self.source.len() {
            match self.source[self.pos..].find("{{") {
                None => {
                    segments.push(Segment::Literal(self.source[self.pos..].to_string()));
                    self.pos = self.source.len();
                }
                Some(offset) => {
                    if offset > 0 {
                        let end = self.pos + offset;
                        segments.push(Segment::Literal(self.source[self.pos..end].to_string()));
                    }
                    self.pos += offset;
                    let tag = self.scan_tag()?;
                    segments.push(Segment::Tag(tag));
                }
            }
        }

        Ok(segments)
    }

    /// Scan one tag starting at `{{`.
    fn scan_tag(&mut self) -> Result<Tag, TemplateError> {
        let start = self.pos;
        let rest = &self.source[start + 2..];

        // Long comments use a dedicated terminator so `}}` may appear inside.
        if rest.starts_with("!--") {
            return match rest.find("--}}") {
                Some(end) => {
                    self.pos = start + 2 + end + 4;
                    Ok(Tag::Comment)
                }
                None => Err(TemplateError::UnclosedTag { position: start }),
            };
        }

        let end = rest
            .find("}}")
            .ok_or(TemplateError::UnclosedTag { position: start })?;
        let raw = rest[..end].trim();
        self.pos = start + 2 + end + 2;

        classify_tag(raw)
    }
}

/// Classify the trimmed interior of a `{{ ... }}` tag.
fn classify_tag(raw: &str) -> Result<Tag, TemplateError> {
    if raw.starts_with('!') {
        return Ok(Tag::Comment);
    }

    if let Some(body) = raw.strip_prefix('#') {
        let mut parts = body.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let kind = BlockKind::from_name(name).ok_or_else(|| TemplateError::UnknownBlock {
            name: name.to_string(),
        })?;
        let operand = parts.next().map(str::trim).unwrap_or_default();
        if operand.is_empty() {
            return Err(TemplateError::MissingOperand {
                name: name.to_string(),
            });
        }
        return Ok(Tag::BlockOpen {
            kind,
            operand: operand.to_string(),
        });
    }

    if let Some(name) = raw.strip_prefix('/') {
        let name = name.trim();
        let kind = BlockKind::from_name(name).ok_or_else(|| TemplateError::UnknownBlock {
            name: name.to_string(),
        })?;
        return Ok(Tag::BlockClose { kind });
    }

    if raw == "else" {
        return Ok(Tag::Else);
    }

    Ok(Tag::Expression(raw.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================
