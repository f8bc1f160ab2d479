//! JSON Schema structural validation
//!
//! Structural checks are delegated to the `jsonschema` crate. The check is
//! optional: when no schema is configured, the file does not exist, or the
//! crate was built without the `schema` feature, validation still runs and the
//! report states why the schema check did not.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::diagnostics::Diagnostic;
#[cfg(feature = "schema")]
use crate::diagnostics::DiagnosticCode;
use crate::error::Result;
#[cfg(feature = "schema")]
use crate::error::VbriefError;

/// Outcome of the structural check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum SchemaOutcome {
    Passed,
    Failed { violations: Vec<Diagnostic> },
    Unavailable { reason: String },
}

impl SchemaOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// A schema ready to validate documents, or the reason there is none
#[derive(Debug)]
pub enum SchemaCheck {
    #[cfg(feature = "schema")]
    Available(DocumentSchema),
    Unavailable(String),
}

impl SchemaCheck {
    /// Load the schema at `path`.
    ///
    /// A missing path or file yields `Unavailable`. A file that exists but is
    /// not valid JSON, or is not a valid schema, is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::unavailable("no schema configured"));
        };
        if !path.exists() {
            tracing::warn!(path = %path.display(), "schema file not found");
            return Ok(Self::unavailable(format!(
                "Schema file not found: {}",
                path.display()
            )));
        }
        Self::load_existing(path)
    }

    #[cfg(feature = "schema")]
    fn load_existing(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let schema: Value =
            serde_json::from_str(&content).map_err(|source| VbriefError::SchemaParse {
                path: path.to_path_buf(),
                source,
            })?;
        DocumentSchema::compile(path, &schema).map(Self::Available)
    }

    #[cfg(not(feature = "schema"))]
    fn load_existing(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "schema support not compiled in");
        Ok(Self::unavailable(
            "JSON Schema support was not compiled in (enable the `schema` feature)",
        ))
    }

    /// Use an in-memory schema
    #[cfg(feature = "schema")]
    pub fn from_value(schema: &Value) -> Result<Self> {
        DocumentSchema::compile(Path::new("<inline>"), schema).map(Self::Available)
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable(_))
    }

    /// Validate a document against the schema
    pub fn run(&self, document: &Value) -> SchemaOutcome {
        match self {
            #[cfg(feature = "schema")]
            Self::Available(schema) => schema.check(document),
            Self::Unavailable(reason) => SchemaOutcome::Unavailable {
                reason: reason.clone(),
            },
        }
    }
}

/// A compiled JSON Schema
#[cfg(feature = "schema")]
pub struct DocumentSchema {
    compiled: jsonschema::JSONSchema,
}

#[cfg(feature = "schema")]
impl std::fmt::Debug for DocumentSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSchema").finish_non_exhaustive()
    }
}

#[cfg(feature = "schema")]
impl DocumentSchema {
    pub fn compile(path: &Path, schema: &Value) -> Result<Self> {
        let compiled =
            jsonschema::JSONSchema::compile(schema).map_err(|e| VbriefError::SchemaCompile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self { compiled })
    }

    pub fn check(&self, document: &Value) -> SchemaOutcome {
        let violations: Vec<Diagnostic> = match self.compiled.validate(document) {
            Ok(()) => return SchemaOutcome::Passed,
            Err(errors) => errors
                .map(|e| {
                    let path = e.instance_path.clone().into_vec().join(".");
                    let diagnostic =
                        Diagnostic::new(DiagnosticCode::SchemaViolation, e.to_string());
                    if path.is_empty() {
                        diagnostic
                    } else {
                        diagnostic.at(path)
                    }
                })
                .collect(),
        };
        SchemaOutcome::Failed { violations }
    }
}
