//! ssr-html - Clone-and-patch rendering of tagged HTML templates
//!
//! Templates are written as literal markup fragments with value holes. Each
//! distinct template is parsed once into a prototype tree; rendering clones
//! that tree, binds a part to every hole and fills the parts with values.
//! Re-rendering the same template patches the existing tree, touching only
//! what changed, and the tree serializes to an HTML string.
//!
//! # Example
//!
//! ```rust
//! use ssr_html::{html, Renderer, TemplateResult};
//!
//! fn row(name: &str, done: bool) -> TemplateResult {
//!     html!("<li class=\"" {if done { "done" } else { "open" }} "\">" {name} "</li>")
//! }
//!
//! let items = vec![row("write", true), row("ship", false)];
//! let page = html!("<ul>" {items} "</ul>");
//!
//! let out = Renderer::default().render(page).unwrap();
//! assert_eq!(out, "<ul><li class=\"done\">write</li><li class=\"open\">ship</li></ul>");
//! ```

pub mod directives;
pub mod dom;
pub mod error;
pub mod parser;
pub mod part;
pub mod renderer;
pub mod template;
pub mod value;

pub use error::ParseError;
pub use part::FlushReport;
pub use renderer::{render_once, ConfigError, RenderConfig, RenderRoot, Renderer, SerializeConfig};
pub use template::{Template, TemplateCache, TemplateKind, TemplateResult, TemplateStrings};
pub use value::{deferred, Deferred, Fragment, Primitive, Resolver, Settlement, Value};

use thiserror::Error;

/// Errors that can occur while rendering
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template markup failed to parse
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    /// A compiled part landed on a node of the wrong kind
    #[error("part at node {index} expected {expected}")]
    PartMismatch { index: usize, expected: &'static str },

    /// Strict mode: the update supplied the wrong number of values
    #[error("template expects {expected} values, got {found}")]
    ValueCount { expected: usize, found: usize },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<Vec<ParseError>> for RenderError {
    fn from(errors: Vec<ParseError>) -> Self {
        RenderError::Parse(errors)
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
