// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # cursor-paginate
//!
//! Cursor-based pagination over model delegates, plus a generator for the
//! typed arguments and client installation code.
//!
//! ## Features
//!
//! - **Lazy page sequences**: each page is fetched on demand, resuming just after the last record
//! - **Stable ordering**: the cursor field always leads the effective order
//! - **Explicit composition**: a `PaginatedClient` wraps a `DelegateRegistry` instead of patching it
//! - **Code generation**: per-model `CursorField` enums and `PaginateArgs` structs
//! - **DuckDB delegates**: the same contract served from a DuckDB table
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cursor_paginate::{DelegateRegistry, MemoryDelegate, PaginateArgs, PaginatedClient, Result};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let users = MemoryDelegate::from_values("user", load_users())?;
//!     let registry = DelegateRegistry::new().with("user", Arc::new(users));
//!
//!     let client = PaginatedClient::builder(registry)
//!         .model("user", Some("id".to_string()))
//!         .build()?;
//!
//!     let mut pages = client.paginate("user", PaginateArgs::new(100))?;
//!     while let Some(page) = pages.next_page().await? {
//!         // Process page
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      PaginatedClient                         │
//! │   paginate(model, args) → PageSequence (Stream<Item = Page>) │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌───────────────┬─────────────┴────────────┬───────────────────┐
//! │   Paginator   │        Delegates         │     Generator     │
//! ├───────────────┼──────────────────────────┼───────────────────┤
//! │ Effective     │ MemoryDelegate           │ types.rs          │
//! │ order         │ TableDelegate (DuckDB)   │ client.rs         │
//! │ Cursor state  │ DelegateRegistry         │ mod.rs            │
//! └───────────────┴──────────────────────────┴───────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// String and object helpers
pub mod util;

/// Template interpolation
pub mod template;

/// Generator configuration
pub mod config;

/// Data-access delegates
pub mod delegate;

/// Cursor pagination core
pub mod pagination;

/// Client composition
pub mod client;

/// Schema metadata
pub mod schema;

/// Source generator
pub mod generator;

/// DuckDB delegates
pub mod database;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use client::{PaginatedClient, PaginatedClientBuilder};
pub use delegate::{Delegate, DelegateRegistry, MemoryDelegate};
pub use pagination::{PageSequence, PaginateArgs, Paginator};
pub use schema::{load_schema, load_schema_from_str, SchemaDefinition};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
