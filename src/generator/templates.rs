//! Source templates for generated modules
//!
//! Rendered with [`crate::template::render`]. `model.*` is the model being
//! rendered, `generator.*` the generator settings and `vars.*` blocks
//! assembled by the generator.

pub const MOD_RS: &str = r"//! {{ generator.pretty_name }}: typed pagination for every model.
//!
//! Generated by cursor-paginate. Do not edit by hand.

pub mod client;
pub mod types;

pub use client::{with_pagination, PaginateModels, DEFAULT_CURSOR_FIELDS};
pub use types::*;
";

pub const TYPES_HEADER: &str = r"//! Pagination argument types for every model.
//!
//! Generated by cursor-paginate. Do not edit by hand.

use {{ generator.crate_path }}::pagination::PaginateArgs;
use {{ generator.crate_path }}::types::{JsonObject, JsonValue, OrderBy};";

pub const CURSOR_FIELD_ENUM: &str = r"/// Fields usable as a cursor when paginating `{{ model.name }}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash{{ vars.extra_derives }})]
pub enum {{ model.name }}CursorField {
{{ vars.variants }}
}

impl {{ model.name }}CursorField {
    /// Field name as it appears on records
    pub const fn as_str(self) -> &'static str {
        match self {
{{ vars.arms }}
        }
    }
}

impl std::fmt::Display for {{ model.name }}CursorField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}";

pub const INCLUDE_FIELD: &str = r"/// Choose which related records to fetch as well.
pub include: Option<JsonObject>,";

pub const INCLUDE_CONVERSION: &str = r"if let Some(include) = args.include {
    out = out.include(JsonValue::Object(include));
}";

pub const PAGINATE_ARGS: &str = r"/// Pagination arguments for `{{ model.name }}`.
#[derive(Debug, Clone, Default)]
pub struct {{ model.name }}PaginateArgs {
    /// Select specific fields to fetch from the {{ model.name }}.
    pub select: Option<JsonObject>,{{ vars.include_field }}
    /// Filter which {{ model.name }} records to fetch.
    pub r#where: Option<JsonObject>,
    /// Determine the order of {{ model.name }} records to fetch.
    pub order_by: Option<OrderBy>,
    /// Records fetched per page.
    pub page_size: usize,
    /// Collapse records that share these field values.
    pub distinct: Option<Vec<String>>,
    /// Cursor field to paginate through; defaults to {{ vars.default_doc }}.
    pub cursor_field: Option<{{ model.name }}CursorField>,
}

impl From<{{ model.name }}PaginateArgs> for PaginateArgs {
    fn from(args: {{ model.name }}PaginateArgs) -> Self {
        let mut out = PaginateArgs::new(args.page_size);
        if let Some(select) = args.select {
            out = out.select(JsonValue::Object(select));
        }{{ vars.include_conversion }}
        if let Some(filter) = args.r#where {
            out = out.filter(JsonValue::Object(filter));
        }
        if let Some(order) = args.order_by {
            out = out.order_by(order);
        }
        if let Some(distinct) = args.distinct {
            out = out.distinct(distinct);
        }
        if let Some(field) = args.cursor_field {
            out = out.cursor_field(field.as_str());
        }
        out
    }
}";

pub const CLIENT_RS: &str = r"//! Installs pagination on every model of the schema.
//!
//! Generated by cursor-paginate. Do not edit by hand.

use super::types::*;
use {{ generator.crate_path }}::client::PaginatedClient;
use {{ generator.crate_path }}::delegate::DelegateRegistry;
use {{ generator.crate_path }}::pagination::PageSequence;
use {{ generator.crate_path }}::Result;

/// `(delegate name, default cursor field)` for every model
pub const DEFAULT_CURSOR_FIELDS: &[(&str, Option<&str>)] = &[
{{ vars.defaults }}
];

/// Wrap `base` so every model can be paginated
pub fn with_pagination(base: DelegateRegistry) -> Result<PaginatedClient> {
    DEFAULT_CURSOR_FIELDS
        .iter()
        .fold(PaginatedClient::builder(base), |builder, (name, field)| {
            builder.model(*name, field.map(String::from))
        })
        .build()
}

/// Typed `paginate` for every model
pub trait PaginateModels {
{{ vars.trait_methods }}
}

impl PaginateModels for PaginatedClient {
{{ vars.impl_methods }}
}
";

pub const TRAIT_METHOD: &str = r"/// Paginate `{{ model.name }}` records
fn paginate_{{ vars.method }}(&self, args: {{ model.name }}PaginateArgs) -> Result<PageSequence>;";

pub const IMPL_METHOD: &str = r#"fn paginate_{{ vars.method }}(&self, args: {{ model.name }}PaginateArgs) -> Result<PageSequence> {
    self.paginate("{{ model.delegate }}", args.into())
}"#;
