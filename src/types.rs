//! Common types used throughout cursor-paginate
//!
//! This module contains shared type definitions, type aliases,
//! and the ordering types passed to delegates.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A single record returned by a delegate
pub type Record = JsonObject;

/// One bounded batch of records produced by a single fetch
pub type Page = Vec<Record>;

// ============================================================================
// Sort Order
// ============================================================================

/// Sort direction for a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// SQL keyword for this direction
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Check if this is descending
    pub fn is_desc(self) -> bool {
        matches!(self, SortOrder::Desc)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::invalid_argument(
                "orderBy",
                format!("expected 'asc' or 'desc', got '{other}'"),
            )),
        }
    }
}

// ============================================================================
// Order By
// ============================================================================

/// A field paired with its sort direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderField {
    /// Field name
    pub field: String,
    /// Direction
    pub order: SortOrder,
}

impl OrderField {
    /// Create a new order field
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

impl FromStr for OrderField {
    type Err = Error;

    /// Parse `field` or `field:asc` / `field:desc`
    fn from_str(s: &str) -> Result<Self> {
        let (field, order) = match s.split_once(':') {
            Some((field, order)) => (field.trim(), order.parse()?),
            None => (s.trim(), SortOrder::Asc),
        };
        if field.is_empty() {
            return Err(Error::invalid_argument("orderBy", "field name cannot be empty"));
        }
        Ok(Self::new(field, order))
    }
}

/// Ordered sort specification
///
/// Entries are applied left to right: the first entry is the primary sort key.
/// A field appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBy(Vec<OrderField>);

impl OrderBy {
    /// Create an empty ordering
    pub fn new() -> Self {
        Self::default()
    }

    /// Append (or re-direct) a field, builder style
    #[must_use]
    pub fn then(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.set(field, order);
        self
    }

    /// Shorthand for `then(field, Asc)`
    #[must_use]
    pub fn asc(self, field: impl Into<String>) -> Self {
        self.then(field, SortOrder::Asc)
    }

    /// Shorthand for `then(field, Desc)`
    #[must_use]
    pub fn desc(self, field: impl Into<String>) -> Self {
        self.then(field, SortOrder::Desc)
    }

    /// Set a field's direction, keeping its position if already present
    pub fn set(&mut self, field: impl Into<String>, order: SortOrder) {
        let field = field.into();
        match self.0.iter_mut().find(|f| f.field == field) {
            Some(existing) => existing.order = order,
            None => self.0.push(OrderField { field, order }),
        }
    }

    /// Direction for a field, if present
    pub fn get(&self, field: &str) -> Option<SortOrder> {
        self.0.iter().find(|f| f.field == field).map(|f| f.order)
    }

    /// Iterate entries in priority order
    pub fn iter(&self) -> std::slice::Iter<'_, OrderField> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse `{"name": "desc"}` or `[{"name": "desc"}, {"id": "asc"}]`
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut order = Self::new();
        match value {
            Value::Object(map) => order.extend_from_object(map)?,
            Value::Array(items) => {
                for item in items {
                    let Value::Object(map) = item else {
                        return Err(Error::invalid_argument(
                            "orderBy",
                            format!("expected an object, got {item}"),
                        ));
                    };
                    order.extend_from_object(map)?;
                }
            }
            Value::Null => {}
            other => {
                return Err(Error::invalid_argument(
                    "orderBy",
                    format!("expected an object or array, got {other}"),
                ))
            }
        }
        Ok(order)
    }

    fn extend_from_object(&mut self, map: &JsonObject) -> Result<()> {
        for (field, direction) in map {
            let direction = direction.as_str().ok_or_else(|| {
                Error::invalid_argument(
                    "orderBy",
                    format!("direction for '{field}' must be a string"),
                )
            })?;
            self.set(field.clone(), direction.parse()?);
        }
        Ok(())
    }

    /// Render as `[{"field": "asc"}, ...]`
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|f| {
                    let mut entry = JsonObject::new();
                    entry.insert(f.field.clone(), Value::String(f.order.to_string()));
                    Value::Object(entry)
                })
                .collect(),
        )
    }
}

impl FromIterator<OrderField> for OrderBy {
    fn from_iter<I: IntoIterator<Item = OrderField>>(iter: I) -> Self {
        let mut order = Self::new();
        for f in iter {
            order.set(f.field, f.order);
        }
        order
    }
}

impl<'a> IntoIterator for &'a OrderBy {
    type Item = &'a OrderField;
    type IntoIter = std::slice::Iter<'a, OrderField>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for OrderBy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OrderBy {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        OrderBy::from_value(&value).map_err(serde::de::Error::custom)
    }
}
