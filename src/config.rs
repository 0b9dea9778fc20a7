//! Generator configuration
//!
//! Loaded from YAML, with environment overrides applied on top:
//!
//! - `CURSOR_PAGINATE_OUTPUT` replaces `output`
//! - `CURSOR_PAGINATE_CRATE_PATH` replaces `crate_path`

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the output directory
pub const OUTPUT_ENV: &str = "CURSOR_PAGINATE_OUTPUT";

/// Environment variable overriding the crate path used in generated code
pub const CRATE_PATH_ENV: &str = "CURSOR_PAGINATE_CRATE_PATH";

/// Default output directory for generated sources
pub const DEFAULT_OUTPUT: &str = "src/generated/pagination";

/// Generator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Schema file (YAML)
    #[serde(default)]
    pub schema: Option<PathBuf>,

    /// Directory the generated module is written to
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Path generated code uses to refer to this crate
    #[serde(default = "default_crate_path")]
    pub crate_path: String,

    /// Human-readable generator name
    #[serde(default = "default_pretty_name")]
    pub pretty_name: String,
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

fn default_crate_path() -> String {
    "cursor_paginate".to_string()
}

fn default_pretty_name() -> String {
    "Cursor Pagination".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            schema: None,
            output: default_output(),
            crate_path: default_crate_path(),
            pretty_name: default_pretty_name(),
        }
    }
}

impl GeneratorConfig {
    /// Load from a YAML file and apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::from_yaml(&content)?;

        // relative schema/output paths are resolved against the config file
        if let Some(dir) = path.parent() {
            if let Some(schema) = &config.schema {
                if schema.is_relative() {
                    config.schema = Some(dir.join(schema));
                }
            }
            if config.output.is_relative() {
                config.output = dir.join(&config.output);
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse from a YAML string (no environment overrides)
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CURSOR_PAGINATE_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(output) = lookup(OUTPUT_ENV).filter(|v| !v.is_empty()) {
            tracing::debug!(output = %output, "Output overridden from environment");
            self.output = PathBuf::from(output);
        }
        if let Some(crate_path) = lookup(CRATE_PATH_ENV).filter(|v| !v.is_empty()) {
            self.crate_path = crate_path;
        }
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.crate_path.is_empty() {
            return Err(Error::config("crate_path cannot be empty"));
        }
        let valid_path = self.crate_path.split("::").all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if !valid_path {
            return Err(Error::config(format!(
                "crate_path '{}' is not a valid Rust path",
                self.crate_path
            )));
        }
        if self.output.as_os_str().is_empty() {
            return Err(Error::config("output cannot be empty"));
        }
        Ok(())
    }
}
