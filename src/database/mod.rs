//! Database delegates via DuckDB
//!
//! `TableDelegate` serves `find_many` from a DuckDB table with the same
//! contract as the in-memory delegate. Queries run on the blocking pool with
//! the connection behind a mutex.

mod delegate;
mod engine;
mod query;

pub use delegate::{shared, SharedEngine, TableDelegate};
pub use engine::{DatabaseEngine, TableColumn};
pub use query::{build_find_many, quote_ident, sql_literal, where_clause};
