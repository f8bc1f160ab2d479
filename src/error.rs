//! Error types for the validator
//!
//! Only failures that abort a validation run live here. Rule violations found
//! inside a document are reported as [`crate::Diagnostic`] values instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for validator operations
pub type Result<T> = std::result::Result<T, VbriefError>;

/// Fatal validator errors
#[derive(Error, Debug)]
pub enum VbriefError {
    #[error("Invalid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Schema file {} is not valid JSON: {source}", path.display())]
    SchemaParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Schema {} could not be compiled: {message}", path.display())]
    SchemaCompile { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
