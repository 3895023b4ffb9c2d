//! In-memory template engine.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use serde_json::Value;

use crate::template::filters::{datetime_filter, Locale};
use crate::template::{Context, RenderError, TemplateRenderer};

const TAG_OPEN: &str = "{{";
const TAG_CLOSE: &str = "}}";

/// A named value transform applied inside a tag, e.g. `{{ created_at|datetime }}`.
pub type Filter = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Rendering options.
#[derive(Debug, Clone)]
pub struct TemplateOptions {
    /// HTML-escape every substituted value.
    pub autoescape: bool,
    /// Wording of the built-in `datetime` filter.
    pub locale: Locale,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            autoescape: true,
            locale: Locale::English,
        }
    }
}

/// Templates held in memory, keyed by name.
///
/// Loaded once at startup and read-only afterwards; rendering never touches
/// the filesystem.
#[derive(Clone)]
pub struct Templates {
    sources: HashMap<String, String>,
    filters: HashMap<String, Filter>,
    options: TemplateOptions,
}

impl Templates {
    /// An empty set of templates with default options.
    pub fn new() -> Self {
        Self::with_options(TemplateOptions::default())
    }

    /// An empty set of templates. The `datetime` filter is always registered.
    pub fn with_options(options: TemplateOptions) -> Self {
        let locale = options.locale;
        let mut templates = Self {
            sources: HashMap::new(),
            filters: HashMap::new(),
            options,
        };
        templates.add_filter("datetime", move |value| datetime_filter(value, locale));
        templates
    }

    /// Load every regular file in `dir` as a template named after the file.
    pub fn from_dir(dir: impl AsRef<Path>, options: TemplateOptions) -> Result<Self, RenderError> {
        let dir = dir.as_ref();
        info!("Loading templates from {}", dir.display());

        let mut templates = Self::with_options(options);
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let source = fs::read_to_string(entry.path())?;
            debug!("Loaded template {name} ({} bytes)", source.len());
            templates.add_template(name, source);
        }

        Ok(templates)
    }

    /// Register (or replace) a template.
    pub fn add_template(&mut self, name: impl Into<String>, source: impl Into<String>) -> &mut Self {
        self.sources.insert(name.into(), source.into());
        self
    }

    /// Builder form of [`add_template`](Self::add_template).
    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.add_template(name, source);
        self
    }

    /// Register (or replace) a filter.
    pub fn add_filter<F>(&mut self, name: impl Into<String>, filter: F) -> &mut Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(filter));
        self
    }

    /// Whether a template with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    fn evaluate(&self, template: &str, expression: &str, context: &Context) -> Result<String, RenderError> {
        let mut parts = expression.split('|').map(str::trim);
        let key = parts.next().unwrap_or_default();
        if key.is_empty() {
            return Err(RenderError::Syntax {
                template: template.to_string(),
                message: format!("empty tag '{TAG_OPEN}{expression}{TAG_CLOSE}'"),
            });
        }

        let mut value = lookup(context, key).cloned().unwrap_or(Value::Null);
        for name in parts {
            let filter = self.filters.get(name).ok_or_else(|| RenderError::UnknownFilter {
                template: template.to_string(),
                filter: name.to_string(),
            })?;
            value = Value::String(filter(&value));
        }

        let text = match value {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        };

        Ok(if self.options.autoescape { escape_html(&text) } else { text })
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Templates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.sources.keys().collect();
        names.sort();
        let mut filters: Vec<&String> = self.filters.keys().collect();
        filters.sort();
        f.debug_struct("Templates")
            .field("templates", &names)
            .field("filters", &filters)
            .field("options", &self.options)
            .finish()
    }
}

impl TemplateRenderer for Templates {
    fn render(&self, name: &str, context: &Context) -> Result<String, RenderError> {
        let source = self
            .sources
            .get(name)
            .ok_or_else(|| RenderError::NotFound(name.to_string()))?;

        let mut output = String::with_capacity(source.len());
        let mut rest = source.as_str();
        while let Some(start) = rest.find(TAG_OPEN) {
            output.push_str(&rest[..start]);
            let after_open = &rest[start + TAG_OPEN.len()..];
            let end = after_open.find(TAG_CLOSE).ok_or_else(|| RenderError::Syntax {
                template: name.to_string(),
                message: "unterminated tag".to_string(),
            })?;
            output.push_str(&self.evaluate(name, &after_open[..end], context)?);
            rest = &after_open[end + TAG_CLOSE.len()..];
        }
        output.push_str(rest);

        Ok(output)
    }
}

/// Resolve a dotted key (`user.name`) against the context.
fn lookup<'a>(context: &'a Context, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let mut current = context.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
