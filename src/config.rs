//! Configuration management for the validator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (vbrief.toml)
//! - Environment variables (VBRIEF_*)
//!
//! ## Example config file (vbrief.toml):
//! ```toml
//! [schema]
//! path = "schemas/vbrief-core.schema.json"
//! search_paths = ["schemas/vbrief-core.schema.json"]
//!
//! [output]
//! format = "text"
//! show_warnings = true
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

/// Main configuration for the validator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// JSON Schema settings
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Report settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where to find the JSON Schema used for structural validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Explicit schema file. A configured path that does not exist makes the
    /// schema check unavailable rather than falling back to `search_paths`.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Locations probed, in order, when no explicit path is set
    #[serde(default = "default_search_paths")]
    pub search_paths: Vec<PathBuf>,
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format (text or json)
    #[serde(default)]
    pub format: OutputFormat,

    /// Print conformance warnings
    #[serde(default = "default_true")]
    pub show_warnings: bool,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// Default value functions
fn default_search_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("schemas/vbrief-core.schema.json"),
        PathBuf::from("vbrief-core.schema.json"),
    ]
}

fn default_true() -> bool {
    true
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            path: None,
            search_paths: default_search_paths(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            show_warnings: true,
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = ["vbrief.toml", ".vbrief.toml", "config/vbrief.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "vbrief", "vbrief") {
            let xdg_config = config_dir.config_dir().join("vbrief.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // VBRIEF_OUTPUT__FORMAT=json, VBRIEF_SCHEMA__PATH=...
        builder = builder.add_source(
            Environment::with_prefix("VBRIEF")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// The schema file to use: the explicit path if set, otherwise the first
    /// search path that exists.
    pub fn schema_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.schema.path {
            return Some(path.clone());
        }
        self.schema
            .search_paths
            .iter()
            .find(|candidate| candidate.exists())
            .cloned()
    }
}
