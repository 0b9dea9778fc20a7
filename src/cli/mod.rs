//! CLI module
//!
//! Command-line interface for the generator and the DuckDB paginator.
//!
//! # Commands
//!
//! - `generate` - Write pagination types and client installation code
//! - `models` - List models with their cursor fields
//! - `manifest` - Show the generator manifest
//! - `paginate` - Page through a DuckDB table

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{PaginateOptions, Runner};
