//! Template interpolation for generated sources
//!
//! Handles `{{ variable }}` interpolation in the generator's templates.
//! Supports nested access like `{{ model.name }}` and `{{ vars.fields }}`.

use crate::error::{Error, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}")
        .expect("template regex is valid")
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Values describing the model being rendered
    pub model: Value,
    /// Generator-wide values (crate path, pretty name, ...)
    pub generator: Value,
    /// Additional context variables (pre-rendered blocks)
    pub vars: Value,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create context with model values
    pub fn with_model(model: Value) -> Self {
        Self {
            model,
            ..Default::default()
        }
    }

    /// Set model values
    pub fn set_model(&mut self, model: Value) -> &mut Self {
        self.model = model;
        self
    }

    /// Set generator values
    pub fn set_generator(&mut self, generator: Value) -> &mut Self {
        self.generator = generator;
        self
    }

    /// Set additional variables
    pub fn set_vars(&mut self, vars: Value) -> &mut Self {
        self.vars = vars;
        self
    }

    /// Set a single variable under `vars`
    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        if !self.vars.is_object() {
            self.vars = Value::Object(serde_json::Map::new());
        }
        if let Value::Object(map) = &mut self.vars {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Get a value by path (e.g., "model.name")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();
        let first = *parts.first()?;

        // First part determines the root object
        let root = match first {
            "model" => &self.model,
            "generator" => &self.generator,
            "vars" => &self.vars,
            // Bare names resolve against vars, then model
            _ => {
                if let Some(val) = get_nested_value(&self.vars, &parts) {
                    return Some(val);
                }
                return get_nested_value(&self.model, &parts);
            }
        };

        if parts.len() == 1 {
            Some(root)
        } else {
            get_nested_value(root, &parts[1..])
        }
    }
}

/// Get a nested value from a JSON value by path
fn get_nested_value<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for part in path {
        match current {
            Value::Object(map) => {
                current = map.get(*part)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut errors = Vec::new();

    let result = TEMPLATE_REGEX.replace_all(template, |cap: &Captures<'_>| {
        let var_path = &cap[1];
        if let Some(value) = ctx.get(var_path) {
            value_to_string(value)
        } else {
            errors.push(var_path.to_string());
            cap[0].to_string()
        }
    });

    if errors.is_empty() {
        Ok(result.into_owned())
    } else {
        Err(Error::undefined_var(errors.join(", ")))
    }
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Convert a JSON value to a string for template substitution
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // For complex types, use JSON serialization
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
