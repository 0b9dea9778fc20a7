//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::PaginatedClient;
use crate::config::GeneratorConfig;
use crate::database::{shared, DatabaseEngine, TableDelegate};
use crate::delegate::DelegateRegistry;
use crate::error::{Error, Result};
use crate::generator::{manifest, Generator};
use crate::pagination::PaginateArgs;
use crate::schema::{load_schema, SchemaDefinition};
use crate::types::{OrderBy, OrderField};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options for the `paginate` command
#[derive(Debug, Clone)]
pub struct PaginateOptions {
    pub database: PathBuf,
    pub model: String,
    pub table: Option<String>,
    pub page_size: usize,
    pub cursor_field: Option<String>,
    pub order_by: Vec<String>,
    pub filter: Option<String>,
    pub max_pages: Option<usize>,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Generate { output } => self.generate(output.as_deref()).await,
            Commands::Models => self.models(),
            Commands::Manifest => self.manifest(),
            Commands::Paginate {
                database,
                model,
                table,
                page_size,
                cursor_field,
                order_by,
                filter,
                max_pages,
            } => {
                let options = PaginateOptions {
                    database: database.clone(),
                    model: model.clone(),
                    table: table.clone(),
                    page_size: *page_size,
                    cursor_field: cursor_field.clone(),
                    order_by: order_by.clone(),
                    filter: filter.clone(),
                    max_pages: *max_pages,
                };
                self.paginate(&options).await.map(|_| ())
            }
        }
    }

    /// Load the generator configuration (defaults when no file is given)
    fn load_config(&self) -> Result<GeneratorConfig> {
        match &self.cli.config {
            Some(path) => GeneratorConfig::load(path),
            None => {
                let mut config = GeneratorConfig::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Load the schema named on the command line, else the one in the configuration
    fn load_schema(&self, config: &GeneratorConfig) -> Result<SchemaDefinition> {
        let path = self
            .cli
            .schema
            .as_ref()
            .or(config.schema.as_ref())
            .ok_or_else(|| Error::config("Schema file not specified (use -s flag)"))?;
        load_schema(path)
    }

    /// Write generated sources
    async fn generate(&self, output: Option<&Path>) -> Result<()> {
        let config = self.load_config()?;
        let schema = self.load_schema(&config)?;
        let output = output.map_or_else(|| config.output.clone(), Path::to_path_buf);

        let generator = Generator::new(config);
        let written = generator.write(&schema, &output).await?;

        tracing::info!(
            output = %output.display(),
            models = schema.models.len(),
            "Generated pagination sources"
        );

        self.output_message(&json!({
            "type": "GENERATED",
            "output": output.display().to_string(),
            "files": written
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
        }));

        Ok(())
    }

    /// List models with their cursor fields
    fn models(&self) -> Result<()> {
        let config = self.load_config()?;
        let schema = self.load_schema(&config)?;

        let models: Vec<Value> = schema
            .models
            .iter()
            .map(|model| {
                json!({
                    "name": model.name,
                    "delegate": model.delegate_name(),
                    "default_cursor_field": model.default_cursor_field(),
                    "cursor_fields": model.cursor_field_candidates()
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "MODELS",
            "models": models
        }));

        Ok(())
    }

    /// Show the generator manifest
    fn manifest(&self) -> Result<()> {
        let config = self.load_config()?;
        self.output_message(&json!({
            "type": "MANIFEST",
            "manifest": manifest(&config)
        }));
        Ok(())
    }

    /// Page through a table, emitting one message per page
    ///
    /// Returns the number of records read.
    pub async fn paginate(&self, options: &PaginateOptions) -> Result<usize> {
        let config = self.load_config()?;
        let schema = self.load_schema(&config)?;
        let model = schema
            .model(&options.model)
            .ok_or_else(|| Error::unknown_model(&options.model))?;

        let delegate_name = model.delegate_name();
        let table = options
            .table
            .clone()
            .unwrap_or_else(|| delegate_name.clone());

        let engine = shared(DatabaseEngine::open(&options.database)?);
        let registry = DelegateRegistry::new().with(
            &delegate_name,
            Arc::new(TableDelegate::new(&delegate_name, table, engine)),
        );
        let client = PaginatedClient::builder(registry)
            .model(&delegate_name, model.default_cursor_field().map(String::from))
            .build()?;

        let mut seq = client.paginate(&delegate_name, build_args(options)?)?;

        let mut pages = 0usize;
        let mut records = 0usize;
        while options.max_pages.map_or(true, |max| pages < max) {
            let Some(page) = seq.next_page().await? else {
                break;
            };
            pages += 1;
            records += page.len();

            self.output_message(&json!({
                "type": "PAGE",
                "page": pages,
                "cursor": seq.last_cursor(),
                "records": page
            }));
        }

        tracing::info!(
            model = %delegate_name,
            pages,
            records,
            exhausted = seq.is_exhausted(),
            "Pagination finished"
        );

        Ok(records)
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Translate command-line options into pagination arguments
fn build_args(options: &PaginateOptions) -> Result<PaginateArgs> {
    let mut args = PaginateArgs::new(options.page_size);

    if let Some(field) = &options.cursor_field {
        args = args.cursor_field(field);
    }

    if !options.order_by.is_empty() {
        let order = options
            .order_by
            .iter()
            .map(|spec| spec.parse::<OrderField>())
            .collect::<Result<OrderBy>>()?;
        args = args.order_by(order);
    }

    if let Some(filter) = &options.filter {
        let filter: Value = serde_json::from_str(filter)?;
        if !filter.is_object() {
            return Err(Error::invalid_argument("where", "expected a JSON object"));
        }
        args = args.filter(filter);
    }

    Ok(args)
}
