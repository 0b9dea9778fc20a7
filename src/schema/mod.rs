//! Schema module
//!
//! Model metadata: which models exist, their fields, and which of those
//! fields can anchor a cursor.
//!
//! # Cursor field resolution
//!
//! A model's default cursor field is its id field, else its first unique
//! field, else none. A model without one can still be paginated, but every
//! call must name a cursor field explicitly.

mod loader;
mod types;

pub use loader::{load_schema, load_schema_from_str, validate_schema};
pub use types::{FieldDefinition, ModelDefinition, SchemaDefinition};
