//! ARSENAL Template - Handlebars-subset resolver
//!
//! Prompt inputs are handlebars-style templates. This crate implements the
//! subset the configuration format actually uses: plain substitutions
//! (`{{name}}`, `{{obj.field}}`), the block forms `#if`, `#unless`, `#each`
//! and `#with` (each with an optional `{{else}}` branch), and comments
//! (`{{! ... }}`, `{{!-- ... --}}`).
//!
//! Two entry points share one scanner so they always agree on what counts
//! as a reference:
//!
//! - [`resolve`] renders a template against a parameter scope. Substituted
//!   values are HTML-escaped with the handlebars escape set; unknown
//!   references render as the empty string.
//! - [`extract_names`] walks the tag stream once and reports which names a
//!   template references, including which sub-fields of each name.

mod error;
mod extract;
mod resolve;
mod scanner;
mod token;

pub use error::TemplateError;
pub use extract::{extract_names, NameRef};
pub use resolve::resolve;
pub use scanner::Scanner;
pub use token::{BlockKind, Segment, Tag};

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
