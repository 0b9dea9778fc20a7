//! YAML loader for schema definitions

use crate::error::{Error, Result};
use crate::schema::types::{ModelDefinition, SchemaDefinition};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load a schema definition from a YAML file
pub fn load_schema(path: impl AsRef<Path>) -> Result<SchemaDefinition> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config(format!("Schema file '{}' not found", path.display()))
        } else {
            Error::config(format!(
                "Failed to read schema file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;

    let schema = load_schema_from_str(&content)?;
    tracing::debug!(
        path = %path.display(),
        models = schema.models.len(),
        "Loaded schema"
    );
    Ok(schema)
}

/// Load a schema definition from a YAML string
pub fn load_schema_from_str(yaml: &str) -> Result<SchemaDefinition> {
    let schema: SchemaDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::schema(format!("Failed to parse schema YAML: {e}")))?;

    validate_schema(&schema)?;
    Ok(schema)
}

/// Validate a schema definition
pub fn validate_schema(schema: &SchemaDefinition) -> Result<()> {
    if schema.models.is_empty() {
        return Err(Error::schema("Schema must define at least one model"));
    }

    let mut delegate_names = HashSet::new();
    for model in &schema.models {
        validate_model(model)?;
        if !delegate_names.insert(model.delegate_name()) {
            return Err(Error::schema(format!(
                "Duplicate model name '{}'",
                model.name
            )));
        }
    }

    Ok(())
}

/// Validate a model definition
fn validate_model(model: &ModelDefinition) -> Result<()> {
    if model.name.is_empty() {
        return Err(Error::schema("Model name cannot be empty"));
    }

    if !is_identifier(&model.name) {
        return Err(Error::schema(format!(
            "Model name '{}' must be a valid identifier",
            model.name
        )));
    }

    let mut names = HashSet::new();
    for field in &model.fields {
        if field.name.is_empty() {
            return Err(Error::schema(format!(
                "Model '{}' has a field with an empty name",
                model.name
            )));
        }
        if !is_identifier(&field.name) {
            return Err(Error::schema(format!(
                "Field '{}' of model '{}' must be a valid identifier",
                field.name, model.name
            )));
        }
        if !names.insert(field.name.as_str()) {
            return Err(Error::schema(format!(
                "Model '{}' has duplicate field '{}'",
                model.name, field.name
            )));
        }
    }

    if model.fields.iter().filter(|f| f.is_id).count() > 1 {
        return Err(Error::schema(format!(
            "Model '{}' has more than one id field",
            model.name
        )));
    }

    Ok(())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
