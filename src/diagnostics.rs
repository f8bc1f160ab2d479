//! Diagnostics
//!
//! Non-fatal findings produced by the conformance and DAG passes. Every
//! finding carries a stable code so reports can be filtered and diffed.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing findings, serialized as its stable code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Document ===
    /// vBRIEFInfo missing
    #[serde(rename = "V001")]
    MissingInfo,
    /// vBRIEFInfo.version is not the supported version
    #[serde(rename = "V002")]
    UnsupportedVersion,
    /// `plan` missing
    #[serde(rename = "V003")]
    MissingPlan,
    /// `plan` is not an object
    #[serde(rename = "V004")]
    InvalidPlan,
    /// todoList / playbook container present
    #[serde(rename = "V005")]
    LegacyContainer,

    // === Plan ===
    /// title / status / items missing on the plan
    #[serde(rename = "V006")]
    MissingPlanField,
    /// `items` is not an array
    #[serde(rename = "V007")]
    ItemsNotArray,
    /// `edges` is present but not an array
    #[serde(rename = "V008")]
    EdgesNotArray,
    /// Status outside the closed status set
    #[serde(rename = "V009")]
    InvalidStatus,
    /// ID does not follow dotted hierarchical syntax
    #[serde(rename = "V010")]
    InvalidId,
    /// planRef is not a fragment, file or http(s) URI
    #[serde(rename = "V011")]
    InvalidPlanRef,
    /// Two items resolve to the same fully-qualified ID
    #[serde(rename = "V012")]
    DuplicateId,
    /// Narrative key is not TitleCase
    #[serde(rename = "W001")]
    NarrativeKeyCase,
    /// Narrative key contains spaces
    #[serde(rename = "W002")]
    NarrativeKeySpace,

    // === DAG ===
    /// Edge has no `from`, `to` or `type`
    #[serde(rename = "D001")]
    MissingEdgeField,
    /// Edge endpoint does not resolve to an item
    #[serde(rename = "D002")]
    UnknownReference,
    /// Edges form a cycle
    #[serde(rename = "D003")]
    Cycle,

    // === Schema ===
    /// JSON Schema violation
    #[serde(rename = "S001")]
    SchemaViolation,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingInfo => "V001",
            Self::UnsupportedVersion => "V002",
            Self::MissingPlan => "V003",
            Self::InvalidPlan => "V004",
            Self::LegacyContainer => "V005",
            Self::MissingPlanField => "V006",
            Self::ItemsNotArray => "V007",
            Self::EdgesNotArray => "V008",
            Self::InvalidStatus => "V009",
            Self::InvalidId => "V010",
            Self::InvalidPlanRef => "V011",
            Self::DuplicateId => "V012",
            Self::NarrativeKeyCase => "W001",
            Self::NarrativeKeySpace => "W002",
            Self::MissingEdgeField => "D001",
            Self::UnknownReference => "D002",
            Self::Cycle => "D003",
            Self::SchemaViolation => "S001",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::NarrativeKeyCase | Self::NarrativeKeySpace => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic
// =============================================================================

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Document path the finding refers to (`items[0].subItems[2]`, `edges[3]`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: message.into(),
            path: None,
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let codes = [
            DiagnosticCode::MissingInfo,
            DiagnosticCode::UnsupportedVersion,
            DiagnosticCode::MissingPlan,
            DiagnosticCode::InvalidPlan,
            DiagnosticCode::LegacyContainer,
            DiagnosticCode::MissingPlanField,
            DiagnosticCode::ItemsNotArray,
            DiagnosticCode::EdgesNotArray,
            DiagnosticCode::InvalidStatus,
            DiagnosticCode::InvalidId,
            DiagnosticCode::InvalidPlanRef,
            DiagnosticCode::DuplicateId,
            DiagnosticCode::NarrativeKeyCase,
            DiagnosticCode::NarrativeKeySpace,
            DiagnosticCode::MissingEdgeField,
            DiagnosticCode::UnknownReference,
            DiagnosticCode::Cycle,
            DiagnosticCode::SchemaViolation,
        ];
        let unique: std::collections::HashSet<_> = codes.iter().map(|c| c.as_str()).collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_codes_serialize_as_stable_codes() {
        let diagnostic = Diagnostic::new(DiagnosticCode::Cycle, "Cycle detected: a -> a");
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["code"], "D003");
        assert_eq!(json["severity"], "error");

        let code: DiagnosticCode = serde_json::from_value(serde_json::json!("V012")).unwrap();
        assert_eq!(code, DiagnosticCode::DuplicateId);
        assert_eq!(serde_json::to_value(code).unwrap(), code.as_str());
    }

    #[test]
    fn test_narrative_codes_are_warnings() {
        let warning = Diagnostic::new(DiagnosticCode::NarrativeKeyCase, "lowercase key");
        assert!(!warning.is_error());

        let error = Diagnostic::new(DiagnosticCode::InvalidStatus, "bad status").at("items[0]");
        assert!(error.is_error());
        assert_eq!(error.path.as_deref(), Some("items[0]"));
        assert_eq!(error.to_string(), "bad status");
    }
}
