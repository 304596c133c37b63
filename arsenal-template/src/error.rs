//! Template error types

use thiserror::Error;

/// Errors raised while scanning or rendering a template.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unclosed tag starting at byte {position}")]
    UnclosedTag { position: usize },

    #[error("Unknown block helper: #{name}")]
    UnknownBlock { name: String },

    #[error("Block #{name} is missing its operand")]
    MissingOperand { name: String },

    #[error("Closing tag {{{{/{found}}}}} does not match open block #{expected}")]
    MismatchedClose { expected: String, found: String },

    #[error("Closing tag {{{{/{name}}}}} has no matching open block")]
    UnexpectedClose { name: String },

    #[error("Block #{name} is never closed")]
    UnclosedBlock { name: String },

    #[error("{{{{else}}}} outside of a block")]
    DanglingElse,
}
