//! Document Validation
//!
//! Runs every check over one document and folds the results into a single
//! report: schema, then conformance, then DAG. Only a document that fails to
//! parse stops the run early; every other finding is collected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

use crate::config::ValidatorConfig;
use crate::conformance::{check_conformance, ConformanceReport};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Severity};
use crate::error::{Result, VbriefError};
use crate::graph::{validate_plan_dag, DagOutcome};
use crate::model::plan_of;
use crate::schema::{SchemaCheck, SchemaOutcome};

/// Which pass produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Schema,
    Conformance,
    Dag,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Conformance => write!(f, "conformance"),
            Self::Dag => write!(f, "dag"),
        }
    }
}

/// One line of a validation report, tagged with its originating check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMessage {
    pub check: CheckKind,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<DiagnosticCode>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ReportMessage {
    fn from_diagnostic(check: CheckKind, diagnostic: &Diagnostic) -> Self {
        Self {
            check,
            severity: diagnostic.severity,
            code: Some(diagnostic.code),
            text: diagnostic.message.clone(),
            path: diagnostic.path.clone(),
        }
    }

    fn info(check: CheckKind, text: impl Into<String>) -> Self {
        Self {
            check,
            severity: Severity::Info,
            code: None,
            text: text.into(),
            path: None,
        }
    }
}

/// Combined result of validating one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub schema: SchemaOutcome,
    pub conformance: ConformanceReport,
    pub dag: DagOutcome,
}

impl ValidationReport {
    /// Valid unless the schema check failed, a conformance error was found,
    /// or DAG validation failed. Warnings and skipped checks never count.
    pub fn is_valid(&self) -> bool {
        !self.schema.is_failed() && self.conformance.is_conformant() && !self.dag.is_failed()
    }

    /// Every message in check order: schema, conformance errors, conformance
    /// warnings, DAG.
    pub fn messages(&self) -> Vec<ReportMessage> {
        let mut messages = Vec::new();

        match &self.schema {
            SchemaOutcome::Passed => {}
            SchemaOutcome::Failed { violations } => messages.extend(
                violations
                    .iter()
                    .map(|d| ReportMessage::from_diagnostic(CheckKind::Schema, d)),
            ),
            SchemaOutcome::Unavailable { reason } => messages.push(ReportMessage::info(
                CheckKind::Schema,
                format!("Schema check unavailable: {}", reason),
            )),
        }

        messages.extend(
            self.conformance
                .errors
                .iter()
                .chain(&self.conformance.warnings)
                .map(|d| ReportMessage::from_diagnostic(CheckKind::Conformance, d)),
        );

        match &self.dag {
            DagOutcome::Skipped => messages.push(ReportMessage::info(
                CheckKind::Dag,
                "No edges to validate (DAG validation skipped)",
            )),
            DagOutcome::Passed => {}
            DagOutcome::Failed(errors) => messages.extend(
                errors
                    .iter()
                    .map(|d| ReportMessage::from_diagnostic(CheckKind::Dag, d)),
            ),
        }

        messages
    }
}

/// Parse document text; failure is the only fatal validation outcome.
///
/// The parser rejects input nested deeper than 128 JSON levels. Each item
/// level takes two (`subItems` object and array), so plans nested beyond
/// roughly 60 item levels fail here as invalid JSON.
pub fn parse_document(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(VbriefError::Parse)
}

/// Validate an already-parsed document
pub fn validate_value(document: &Value, schema: &SchemaCheck) -> ValidationReport {
    let schema = schema.run(document);
    let conformance = check_conformance(document);
    let dag = match plan_of(document) {
        Some(plan) => validate_plan_dag(plan),
        None => DagOutcome::Skipped,
    };

    let report = ValidationReport {
        schema,
        conformance,
        dag,
    };
    tracing::info!(valid = report.is_valid(), "document validated");
    report
}

/// Validates documents against a fixed schema setup
#[derive(Debug)]
pub struct Validator {
    schema: SchemaCheck,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(SchemaCheck::unavailable("no schema configured"))
    }
}

impl Validator {
    pub fn new(schema: SchemaCheck) -> Self {
        Self { schema }
    }

    /// Build a validator from configuration, loading the schema it names
    pub fn from_config(config: &ValidatorConfig) -> Result<Self> {
        let schema_path = config.schema_path();
        Ok(Self::new(SchemaCheck::load(schema_path.as_deref())?))
    }

    pub fn schema(&self) -> &SchemaCheck {
        &self.schema
    }

    pub fn validate_value(&self, document: &Value) -> ValidationReport {
        validate_value(document, &self.schema)
    }

    pub fn validate_str(&self, text: &str) -> Result<ValidationReport> {
        let document = parse_document(text)?;
        Ok(self.validate_value(&document))
    }

    pub fn validate_file(&self, path: &Path) -> Result<ValidationReport> {
        if !path.exists() {
            return Err(VbriefError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let _span = tracing::info_span!("validate", path = %path.display()).entered();
        let text = std::fs::read_to_string(path)?;
        self.validate_str(&text)
    }
}
