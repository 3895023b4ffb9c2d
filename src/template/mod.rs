//! Template rendering.
//!
//! The pipeline only depends on the [`TemplateRenderer`] capability. The
//! bundled [`Templates`] engine keeps every template in memory and supports
//! `{{ key }}` substitution with `{{ key|filter }}` filters; the relative-time
//! helper in [`filters`] is registered as `datetime`.

mod engine;
pub mod filters;

use serde_json::{Map, Value};
use thiserror::Error;

pub use engine::{Filter, TemplateOptions, Templates};
pub use filters::{relative_time, relative_time_at, Locale};

/// Key-value pairs a template is rendered with.
pub type Context = Map<String, Value>;

/// Something that turns a named template and a context into text.
///
/// Implementations are shared by every request for the life of the process,
/// so they must be safe to call concurrently without locking.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, name: &str, context: &Context) -> Result<String, RenderError>;
}

/// Errors that can occur while loading or rendering templates.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No template is registered under the name.
    #[error("Template not found: {0}")]
    NotFound(String),

    /// The template name is not a string.
    #[error("Invalid template name: {0}")]
    InvalidName(String),

    /// A tag refers to a filter that was never registered.
    #[error("Unknown filter '{filter}' in template {template}")]
    UnknownFilter { template: String, filter: String },

    /// The template source is malformed.
    #[error("Syntax error in template {template}: {message}")]
    Syntax { template: String, message: String },

    /// Reading templates from disk failed.
    #[error("I/O error loading templates: {0}")]
    Io(#[from] std::io::Error),
}
