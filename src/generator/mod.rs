//! Generator module
//!
//! Emits, from a schema, a Rust module with:
//!
//! - `types.rs` - a `<Model>CursorField` enum and `<Model>PaginateArgs` struct per model
//! - `client.rs` - `with_pagination`, which installs a bound paginator on every
//!   model using its default cursor field, and the `PaginateModels` trait
//! - `mod.rs` - re-exports

mod templates;

use crate::config::GeneratorConfig;
use crate::error::{Error, Result, ResultExt};
use crate::schema::{ModelDefinition, SchemaDefinition};
use crate::template::{self, TemplateContext};
use crate::util::{indent_string, to_pascal_case, to_snake_case};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Static description of the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorManifest {
    /// Human-readable name
    pub pretty_name: String,
    /// Where output goes when none is configured
    pub default_output: String,
    /// Generators that must run first
    pub requires_generators: Vec<String>,
}

/// Manifest for the given configuration
pub fn manifest(config: &GeneratorConfig) -> GeneratorManifest {
    GeneratorManifest {
        pretty_name: config.pretty_name.clone(),
        default_output: crate::config::DEFAULT_OUTPUT.to_string(),
        requires_generators: Vec::new(),
    }
}

/// A rendered file, relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Renders pagination sources for a schema
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    /// Create a generator
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Render every file for `schema`
    pub fn generate(&self, schema: &SchemaDefinition) -> Result<Vec<GeneratedFile>> {
        check_model_names(schema)?;
        let ctx = self.base_context();
        Ok(vec![
            GeneratedFile {
                path: PathBuf::from("mod.rs"),
                contents: template::render(templates::MOD_RS, &ctx)?,
            },
            GeneratedFile {
                path: PathBuf::from("types.rs"),
                contents: self.render_types(schema)?,
            },
            GeneratedFile {
                path: PathBuf::from("client.rs"),
                contents: self.render_client(schema)?,
            },
        ])
    }

    /// Render and write every file under `output_dir`, creating it if needed
    pub async fn write(&self, schema: &SchemaDefinition, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let files = self.generate(schema)?;
        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("Failed to create '{}'", output_dir.display()))?;

        let mut written = Vec::with_capacity(files.len());
        for file in files {
            let path = output_dir.join(&file.path);
            tokio::fs::write(&path, file.contents)
                .await
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            tracing::info!(path = %path.display(), "Wrote generated file");
            written.push(path);
        }
        Ok(written)
    }

    /// Render `types.rs`
    pub fn render_types(&self, schema: &SchemaDefinition) -> Result<String> {
        let mut sections = vec![template::render(
            templates::TYPES_HEADER,
            &self.base_context(),
        )?];

        for model in &schema.models {
            let ctx = self.model_context(model)?;
            sections.push(template::render(templates::CURSOR_FIELD_ENUM, &ctx)?);
            sections.push(template::render(templates::PAGINATE_ARGS, &ctx)?);
        }

        Ok(finish(&sections.join("\n\n")))
    }

    /// Render `client.rs`
    pub fn render_client(&self, schema: &SchemaDefinition) -> Result<String> {
        let mut defaults = Vec::new();
        let mut trait_methods = Vec::new();
        let mut impl_methods = Vec::new();

        for model in &schema.models {
            let field = match model.default_cursor_field() {
                Some(f) => format!("Some({f:?})"),
                None => "None".to_string(),
            };
            defaults.push(format!("({:?}, {field}),", model.delegate_name()));

            let ctx = self.model_context(model)?;
            trait_methods.push(template::render(templates::TRAIT_METHOD, &ctx)?);
            impl_methods.push(template::render(templates::IMPL_METHOD, &ctx)?);
        }

        let mut ctx = self.base_context();
        ctx.set_var("defaults", indent_string(&defaults.join("\n"), 4));
        ctx.set_var("trait_methods", indent_string(&trait_methods.join("\n\n"), 4));
        ctx.set_var("impl_methods", indent_string(&impl_methods.join("\n\n"), 4));

        Ok(finish(&template::render(templates::CLIENT_RS, &ctx)?))
    }

    fn base_context(&self) -> TemplateContext {
        let mut ctx = TemplateContext::new();
        ctx.set_generator(json!({
            "crate_path": self.config.crate_path,
            "pretty_name": self.config.pretty_name,
        }));
        ctx
    }

    fn model_context(&self, model: &ModelDefinition) -> Result<TemplateContext> {
        let candidates = model.cursor_field_candidates();
        let default = model.default_cursor_field();

        let mut seen: HashMap<String, &str> = HashMap::new();
        for field in &candidates {
            if let Some(other) = seen.insert(to_pascal_case(field), field) {
                return Err(Error::schema(format!(
                    "Model '{}': cursor fields '{other}' and '{field}' both map to variant '{}'",
                    model.name,
                    to_pascal_case(field)
                )));
            }
        }

        let variants: Vec<String> = candidates
            .iter()
            .map(|field| {
                let attr = if Some(*field) == default { "#[default]\n" } else { "" };
                format!("{attr}{},", to_pascal_case(field))
            })
            .collect();
        let arms: Vec<String> = candidates
            .iter()
            .map(|field| format!("Self::{} => {field:?},", to_pascal_case(field)))
            .collect();

        // optional blocks open with a newline so an empty one leaves no trace
        let (include_field, include_conversion) = if model.has_relations() {
            (
                format!("\n{}", indent_string(templates::INCLUDE_FIELD, 4)),
                format!("\n{}", indent_string(templates::INCLUDE_CONVERSION, 8)),
            )
        } else {
            (String::new(), String::new())
        };
        let extra_derives = if default.is_some() { ", Default" } else { "" };
        let default_doc = match default {
            Some(field) => format!("`{field}`"),
            None => "none; pass one explicitly".to_string(),
        };

        let mut ctx = self.base_context();
        ctx.set_model(json!({
            "name": model.name,
            "delegate": model.delegate_name(),
        }));
        ctx.set_vars(json!({
            "variants": indent_string(&variants.join("\n"), 4),
            "arms": indent_string(&arms.join("\n"), 12),
            "extra_derives": extra_derives,
            "default_doc": default_doc,
            "include_field": include_field,
            "include_conversion": include_conversion,
            "method": to_snake_case(&model.name),
        }));
        Ok(ctx)
    }
}

/// Distinct models must not share a client method name
fn check_model_names(schema: &SchemaDefinition) -> Result<()> {
    let mut methods: HashMap<String, &str> = HashMap::new();
    for model in &schema.models {
        let name = model.name.as_str();
        if let Some(other) = methods.insert(to_snake_case(name), name) {
            return Err(Error::schema(format!(
                "Models '{other}' and '{name}' generate the same client method"
            )));
        }
    }
    Ok(())
}

/// Collapse blank runs and end with a single newline
fn finish(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut prev_blank = false;
    for line in source.lines() {
        let blank = line.trim().is_empty();
        if blank && prev_blank {
            continue;
        }
        // models without cursor candidates render empty braces
        if blank && out.trim_end().ends_with('{') {
            continue;
        }
        out.push_str(if blank { "" } else { line });
        out.push('\n');
        prev_blank = blank;
    }
    format!("{}\n", out.trim_end())
}
