//! vBRIEF vocabulary
//!
//! Documents are validated as raw [`serde_json::Value`] trees so that every
//! check stays total over malformed input. This module holds the closed and
//! open value sets the checks compare against, plus small field accessors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The only document version this validator accepts
pub const SUPPORTED_VERSION: &str = "0.5";

/// Top-level key holding document metadata
pub const INFO_KEY: &str = "vBRIEFInfo";

/// Containers removed in v0.5, with the migration hint for each
pub const LEGACY_CONTAINERS: [(&str, &str); 2] = [
    ("todoList", "TodoList container is removed in v0.5. Use Plan instead."),
    ("playbook", "Playbook container is removed in v0.5. Use Plan with narratives instead."),
];

// =============================================================================
// Status
// =============================================================================

/// Lifecycle status of a plan or item.
///
/// Statuses are a closed set: anything else parses to `Unrecognized` and keeps
/// the raw text so it can be reported back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Draft,
    Proposed,
    Approved,
    Pending,
    Running,
    Completed,
    Blocked,
    Cancelled,
    Unrecognized(String),
}

impl Status {
    /// Every recognised status, in lifecycle order
    pub const KNOWN: [Status; 8] = [
        Status::Draft,
        Status::Proposed,
        Status::Approved,
        Status::Pending,
        Status::Running,
        Status::Completed,
        Status::Blocked,
        Status::Cancelled,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw {
            "draft" => Self::Draft,
            "proposed" => Self::Proposed,
            "approved" => Self::Approved,
            "pending" => Self::Pending,
            "running" => Self::Running,
            "completed" => Self::Completed,
            "blocked" => Self::Blocked,
            "cancelled" => Self::Cancelled,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Parse a JSON value; non-strings are never a valid status
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::parse(s),
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "draft",
            Self::Proposed => "proposed",
            Self::Approved => "approved",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
            Self::Cancelled => "cancelled",
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Comma-separated list of the valid statuses, for error messages
    pub fn known_list() -> String {
        Self::KNOWN
            .iter()
            .map(Status::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Edge Type
// =============================================================================

/// Relation carried by a plan edge.
///
/// Unlike statuses, edge types are open: any non-empty string is a legal edge
/// type and is preserved as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdgeType {
    /// Target cannot start until source completes
    Blocks,
    /// Source provides context to target
    Informs,
    /// Completing source invalidates target
    Invalidates,
    /// Soft recommendation
    Suggests,
    Other(String),
}

impl EdgeType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "blocks" => Self::Blocks,
            "informs" => Self::Informs,
            "invalidates" => Self::Invalidates,
            "suggests" => Self::Suggests,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Blocks => "blocks",
            Self::Informs => "informs",
            Self::Invalidates => "invalidates",
            Self::Suggests => "suggests",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_core(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for EdgeType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<EdgeType> for String {
    fn from(kind: EdgeType) -> Self {
        match kind {
            EdgeType::Other(raw) => raw,
            core => core.as_str().to_string(),
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Field Access
// =============================================================================

/// True for values that count as "not provided": null, empty string, false,
/// zero, and empty containers.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Look up `key` on an object, treating blank values as absent.
///
/// Non-object receivers have no fields.
pub fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !is_blank(v))
}

/// Render a field value for a message: strings bare, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

static NULL: Value = Value::Null;

/// A plan's `items` value, or null when absent
pub fn plan_items(plan: &Value) -> &Value {
    plan.get("items").unwrap_or(&NULL)
}

/// The `plan` object of a document, if there is one
pub fn plan_of(document: &Value) -> Option<&Value> {
    document.get("plan").filter(|p| p.is_object())
}
