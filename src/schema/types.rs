//! Schema types
//!
//! Model metadata consumed by the generator and by client construction.

use crate::util::lower_first;
use serde::{Deserialize, Serialize};

/// Complete schema: the set of models a client exposes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Models in declaration order
    #[serde(default)]
    pub models: Vec<ModelDefinition>,
}

impl SchemaDefinition {
    /// Look up a model by its name or delegate name
    pub fn model(&self, name: &str) -> Option<&ModelDefinition> {
        self.models
            .iter()
            .find(|m| m.name == name || m.delegate_name() == name)
    }

    /// Model names in declaration order
    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    /// `(model name, default cursor field)` for every model
    pub fn default_cursor_fields(&self) -> Vec<(&str, Option<&str>)> {
        self.models
            .iter()
            .map(|m| (m.name.as_str(), m.default_cursor_field()))
            .collect()
    }
}

/// A single model (table/collection)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Model name, PascalCase by convention (e.g. "User")
    pub name: String,

    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl ModelDefinition {
    /// Create a model with no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field, builder style
    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Name the model's delegate is registered under (`UserProfile` -> `userProfile`)
    pub fn delegate_name(&self) -> String {
        lower_first(&self.name)
    }

    /// The id field, else the first unique field, else `None`
    pub fn default_cursor_field(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.is_id)
            .or_else(|| self.fields.iter().find(|f| f.is_unique))
            .map(|f| f.name.as_str())
    }

    /// Every field usable as a cursor (id or unique), in declaration order
    pub fn cursor_field_candidates(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_cursor_candidate())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Whether any field is a relation
    pub fn has_relations(&self) -> bool {
        self.fields.iter().any(|f| f.relation_name.is_some())
    }
}

/// A single field of a model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name as it appears on records
    pub name: String,

    /// Type hint (informational)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    /// Primary identifier
    #[serde(default)]
    pub is_id: bool,

    /// Unique constraint
    #[serde(default)]
    pub is_unique: bool,

    /// Relation this field belongs to, for relation fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_name: Option<String>,
}

impl FieldDefinition {
    /// Create a plain field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Mark as the id field
    #[must_use]
    pub fn id(mut self) -> Self {
        self.is_id = true;
        self
    }

    /// Mark as unique
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Mark as a relation field
    #[must_use]
    pub fn relation(mut self, name: impl Into<String>) -> Self {
        self.relation_name = Some(name.into());
        self
    }

    /// Id or unique
    pub fn is_cursor_candidate(&self) -> bool {
        self.is_id || self.is_unique
    }
}
