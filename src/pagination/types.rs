//! Pagination types
//!
//! Defines the caller-facing arguments, the per-fetch delegate arguments and
//! the state carried by a page sequence.

use crate::error::{Error, Result};
use crate::types::{JsonObject, OrderBy, SortOrder};
use crate::util::omit;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys that control pagination and are never forwarded to the delegate
pub const CONTROL_FIELDS: [&str; 3] = ["cursorField", "pageSize", "orderBy"];

// ============================================================================
// Paginate Args
// ============================================================================

/// Per-call pagination arguments
///
/// Everything in `pass_through` (`where`, `select`, `include`, `distinct`, ...)
/// is forwarded verbatim to the delegate on every fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginateArgs {
    /// Maximum records per page
    pub page_size: usize,
    /// Overrides the model's default cursor field
    pub cursor_field: Option<String>,
    /// Caller ordering, merged with ascending order on the cursor field
    pub order_by: Option<OrderBy>,
    /// Delegate arguments forwarded untouched
    pub pass_through: JsonObject,
}

impl PaginateArgs {
    /// Create args with the given page size
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }

    /// Set the cursor field
    #[must_use]
    pub fn cursor_field(mut self, field: impl Into<String>) -> Self {
        self.cursor_field = Some(field.into());
        self
    }

    /// Set the caller ordering
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    /// Set the `where` filter
    #[must_use]
    pub fn filter(self, filter: Value) -> Self {
        self.arg("where", filter)
    }

    /// Set the `select` projection
    #[must_use]
    pub fn select(self, select: Value) -> Self {
        self.arg("select", select)
    }

    /// Set the `include` relations
    #[must_use]
    pub fn include(self, include: Value) -> Self {
        self.arg("include", include)
    }

    /// Set the `distinct` fields
    #[must_use]
    pub fn distinct<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|f| Value::String(f.into()))
            .collect();
        self.arg("distinct", Value::Array(fields))
    }

    /// Set an arbitrary pass-through argument
    #[must_use]
    pub fn arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.pass_through.insert(key.into(), value);
        self
    }

    /// Parse `{ "pageSize": 10, "cursorField": "id", "orderBy": {...}, ...rest }`
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(object) = value else {
            return Err(Error::invalid_argument(
                "args",
                format!("expected an object, got {value}"),
            ));
        };

        let page_size = match object.get("pageSize") {
            Some(v) => v
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    Error::invalid_argument("pageSize", format!("expected a positive integer, got {v}"))
                })?,
            None => return Err(Error::invalid_argument("pageSize", "is required")),
        };

        let cursor_field = match object.get("cursorField") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(Error::invalid_argument(
                    "cursorField",
                    format!("expected a string, got {other}"),
                ))
            }
        };

        let order_by = match object.get("orderBy") {
            None | Some(Value::Null) => None,
            Some(v) => Some(OrderBy::from_value(v)?),
        };

        Ok(Self {
            page_size,
            cursor_field,
            order_by,
            pass_through: omit(object, &CONTROL_FIELDS),
        })
    }

    /// Render back into the JSON shape accepted by [`PaginateArgs::from_value`]
    pub fn to_value(&self) -> Value {
        let mut object = self.pass_through.clone();
        object.insert("pageSize".to_string(), Value::from(self.page_size));
        if let Some(field) = &self.cursor_field {
            object.insert("cursorField".to_string(), Value::String(field.clone()));
        }
        if let Some(order) = &self.order_by {
            object.insert("orderBy".to_string(), order.to_value());
        }
        Value::Object(object)
    }
}

impl Serialize for PaginateArgs {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PaginateArgs {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        PaginateArgs::from_value(&value).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Find Many Args
// ============================================================================

/// Position marker: start strictly after the record whose `field` equals `value`
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    /// Cursor field name
    pub field: String,
    /// Cursor field value of the anchor record
    pub value: Value,
}

/// Arguments handed to a delegate for a single fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindManyArgs {
    /// Caller arguments forwarded untouched
    pub pass_through: JsonObject,
    /// Anchor record, if resuming
    pub cursor: Option<Cursor>,
    /// Records to skip from the anchor (1 when resuming, so the anchor itself is excluded)
    pub skip: usize,
    /// Maximum records to return
    pub take: usize,
    /// Effective ordering
    pub order_by: OrderBy,
}

impl FindManyArgs {
    /// The `where` filter, if any
    pub fn filter(&self) -> Option<&JsonObject> {
        self.pass_through.get("where").and_then(Value::as_object)
    }

    /// The `select` projection, if any
    pub fn select(&self) -> Option<&JsonObject> {
        self.pass_through.get("select").and_then(Value::as_object)
    }

    /// The `distinct` field list (empty when absent)
    pub fn distinct(&self) -> Vec<String> {
        match self.pass_through.get("distinct") {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Render as a single JSON object (`cursor`, `skip`, `take`, `orderBy` merged over pass-through)
    pub fn to_value(&self) -> Value {
        let mut object = self.pass_through.clone();
        if let Some(cursor) = &self.cursor {
            let mut position = serde_json::Map::new();
            position.insert(cursor.field.clone(), cursor.value.clone());
            object.insert("cursor".to_string(), Value::Object(position));
            object.insert("skip".to_string(), Value::from(self.skip));
        }
        object.insert("take".to_string(), Value::from(self.take));
        if !self.order_by.is_empty() {
            object.insert("orderBy".to_string(), self.order_by.to_value());
        }
        Value::Object(object)
    }
}

/// Combine a forced ascending order on the cursor field with the caller's ordering
///
/// The cursor field always comes first. An explicit direction for it in
/// `caller` replaces the ascending default; other caller fields follow in the
/// order given.
pub fn effective_order(cursor_field: &str, caller: Option<&OrderBy>) -> OrderBy {
    let mut order = OrderBy::new().then(cursor_field, SortOrder::Asc);
    if let Some(caller) = caller {
        for entry in caller {
            order.set(entry.field.clone(), entry.order);
        }
    }
    order
}

// ============================================================================
// Pagination State
// ============================================================================

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginationState {
    /// Cursor field value of the last record of the most recent page
    pub last_cursor: Option<Value>,
    /// Non-empty pages yielded so far
    pub pages_fetched: usize,
    /// Records yielded so far
    pub records_fetched: usize,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a yielded page
    pub fn advance(&mut self, cursor: Value, count: usize) {
        self.last_cursor = Some(cursor);
        self.pages_fetched += 1;
        self.records_fetched += count;
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }
}
