//! vBRIEF Validator
//!
//! Validates vBRIEF v0.5 planning documents: a JSON document holding a single
//! `plan` whose items nest through `subItems` and whose `edges` form a
//! dependency graph between fully-qualified item IDs.
//!
//! ## Checks
//!
//! - **Schema**: optional structural validation against the vBRIEF JSON Schema
//! - **Conformance**: version, container, status, ID, planRef and narrative
//!   rules the schema cannot express
//! - **DAG**: every edge endpoint resolves to an item and the edges are acyclic
//!
//! Rule violations never abort a run. Only unreadable or unparseable input is
//! an [`VbriefError`].
//!
//! ## Example
//!
//! ```
//! use vbrief_validator::Validator;
//!
//! let report = Validator::default()
//!     .validate_str(r#"{
//!         "vBRIEFInfo": {"version": "0.5"},
//!         "plan": {"title": "Ship", "status": "draft", "items": []}
//!     }"#)
//!     .unwrap();
//! assert!(report.is_valid());
//! ```

pub mod config;
pub mod conformance;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod ids;
pub mod model;
pub mod schema;
pub mod validate;

pub use config::{OutputFormat, ValidatorConfig};
pub use conformance::{check_conformance, ConformanceReport};
pub use diagnostics::{Diagnostic, DiagnosticCode, Severity};
pub use error::{Result, VbriefError};
pub use graph::{find_cycle, validate_dag, validate_plan_dag, Cycle, DagOutcome, DependencyGraph};
pub use ids::{resolve_ids, walk_items, IdIndex};
pub use model::{EdgeType, Status};
pub use schema::{SchemaCheck, SchemaOutcome};
pub use validate::{
    parse_document, validate_value, CheckKind, ReportMessage, ValidationReport, Validator,
};
