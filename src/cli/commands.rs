//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cursor pagination generator and runner
#[derive(Parser, Debug)]
#[command(name = "cursor-paginate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Schema definition file (YAML)
    #[arg(short, long, global = true)]
    pub schema: Option<PathBuf>,

    /// Generator configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate pagination types and client installation code
    Generate {
        /// Output directory (overrides the configuration)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List models with their cursor fields
    Models,

    /// Show the generator manifest
    Manifest,

    /// Page through a DuckDB table, one line per page
    Paginate {
        /// DuckDB database file
        #[arg(long)]
        database: PathBuf,

        /// Model to paginate (name or delegate name)
        #[arg(short, long)]
        model: String,

        /// Table to read (defaults to the model's delegate name)
        #[arg(long)]
        table: Option<String>,

        /// Records per page
        #[arg(long, default_value = "100")]
        page_size: usize,

        /// Cursor field (defaults to the model's id or first unique field)
        #[arg(long)]
        cursor_field: Option<String>,

        /// Ordering as `field[:asc|desc]`, repeatable
        #[arg(long = "order-by")]
        order_by: Vec<String>,

        /// `where` filter as JSON
        #[arg(long = "where")]
        filter: Option<String>,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
