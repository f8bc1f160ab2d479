//! vBRIEF v0.5 Conformance Rules
//!
//! Document-level rules that hold independently of the dependency graph.
//!
//! ## Rules
//! 1. **Version**: `vBRIEFInfo.version` is `"0.5"`
//! 2. **Containers**: exactly one `plan`; no legacy `todoList` / `playbook`
//! 3. **Plan fields**: `title`, `status` and an `items` array are present
//! 4. **Status**: every status is in the closed status set
//! 5. **IDs**: plan and item IDs use dotted hierarchical syntax, and no two
//!    items resolve to the same fully-qualified ID
//! 6. **planRef**: `#id`, `file://…` or `http(s)://…`
//! 7. **Narratives**: keys SHOULD be TitleCase without spaces (warnings)
//!
//! Every rule runs on every document; one failing rule never hides another.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostics::{Diagnostic, DiagnosticCode, Severity};
use crate::ids::{resolve_ids, walk_items, ItemRef};
use crate::model::{
    display_value, field, plan_items, plan_of, Status, INFO_KEY, LEGACY_CONTAINERS,
    SUPPORTED_VERSION,
};

const ID_PATTERN: &str = r"^[a-zA-Z0-9_-]+(\.[a-zA-Z0-9_-]+)*$";
const URI_PATTERN: &str = r"^(#[a-zA-Z0-9_.-]+|file://.*|https?://.*)$";

static HIERARCHICAL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(ID_PATTERN).expect("hierarchical id pattern compiles"));
static PLAN_REF_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(URI_PATTERN).expect("planRef pattern compiles"));

/// Whether `id` is a well-formed hierarchical ID (`phase1.task-2`)
pub fn is_hierarchical_id(id: &str) -> bool {
    HIERARCHICAL_ID.is_match(id)
}

/// Whether `uri` is an accepted planRef (`#item`, `file://…`, `http(s)://…`)
pub fn is_plan_ref(uri: &str) -> bool {
    PLAN_REF_URI.is_match(uri)
}

/// Result of checking a document's conformance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceReport {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ConformanceReport {
    /// Warnings never affect conformance
    pub fn is_conformant(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning | Severity::Info => self.warnings.push(diagnostic),
        }
    }
}

/// Check every conformance rule against a parsed document
pub fn check_conformance(document: &Value) -> ConformanceReport {
    let mut checker = Checker {
        document,
        report: ConformanceReport::default(),
    };
    checker.run();

    tracing::debug!(
        errors = checker.report.errors.len(),
        warnings = checker.report.warnings.len(),
        "conformance check finished"
    );
    checker.report
}

struct Checker<'a> {
    document: &'a Value,
    report: ConformanceReport,
}

impl<'a> Checker<'a> {
    fn run(&mut self) {
        self.check_version();
        self.check_containers();

        let Some(plan) = plan_of(self.document) else {
            return;
        };
        self.check_plan_fields(plan);

        let items = walk_items(plan_items(plan));
        self.check_statuses(plan, &items);
        self.check_ids(plan, &items);
        self.check_plan_refs(&items);
        self.check_narratives(plan);
    }

    fn error(&mut self, code: DiagnosticCode, message: String, path: &str) {
        self.report.push(Diagnostic::new(code, message).at(path));
    }

    fn check_version(&mut self) {
        let Some(info) = field(self.document, INFO_KEY) else {
            self.error(
                DiagnosticCode::MissingInfo,
                format!("Missing required field: {}", INFO_KEY),
                INFO_KEY,
            );
            return;
        };

        let path = format!("{}.version", INFO_KEY);
        match info.get("version") {
            Some(Value::String(v)) if v == SUPPORTED_VERSION => {}
            Some(v) => self.error(
                DiagnosticCode::UnsupportedVersion,
                format!(
                    "Invalid version: expected '{}', got '{}'",
                    SUPPORTED_VERSION,
                    display_value(v)
                ),
                &path,
            ),
            None => self.error(
                DiagnosticCode::UnsupportedVersion,
                format!("Invalid version: expected '{}', got nothing", SUPPORTED_VERSION),
                &path,
            ),
        }
    }

    fn check_containers(&mut self) {
        match self.document.get("plan") {
            None => self.error(
                DiagnosticCode::MissingPlan,
                "Missing required field: plan".to_string(),
                "plan",
            ),
            Some(plan) if !plan.is_object() => self.error(
                DiagnosticCode::InvalidPlan,
                "Plan must be an object".to_string(),
                "plan",
            ),
            Some(_) => {}
        }

        for (key, hint) in LEGACY_CONTAINERS {
            if self.document.get(key).is_some() {
                self.error(DiagnosticCode::LegacyContainer, hint.to_string(), key);
            }
        }
    }

    fn check_plan_fields(&mut self, plan: &Value) {
        for required in ["title", "status", "items"] {
            if plan.get(required).is_none() {
                self.error(
                    DiagnosticCode::MissingPlanField,
                    format!("Plan missing required field: {}", required),
                    &format!("plan.{}", required),
                );
            }
        }

        if let Some(items) = plan.get("items") {
            if !items.is_array() {
                self.error(
                    DiagnosticCode::ItemsNotArray,
                    "Plan.items must be an array".to_string(),
                    "plan.items",
                );
            }
        }

        if let Some(edges) = plan.get("edges") {
            if !edges.is_array() && !edges.is_null() {
                self.error(
                    DiagnosticCode::EdgesNotArray,
                    "Plan.edges must be an array".to_string(),
                    "plan.edges",
                );
            }
        }
    }

    fn check_statuses(&mut self, plan: &Value, items: &[ItemRef<'_>]) {
        if let Some(raw) = field(plan, "status") {
            let status = Status::from_value(raw);
            if !status.is_known() {
                self.error(
                    DiagnosticCode::InvalidStatus,
                    format!(
                        "Invalid plan status: '{}'. Must be one of {}",
                        status,
                        Status::known_list()
                    ),
                    "plan.status",
                );
            }
        }

        for item in items {
            let Some(raw) = field(item.item, "status") else {
                continue;
            };
            let status = Status::from_value(raw);
            if !status.is_known() {
                self.error(
                    DiagnosticCode::InvalidStatus,
                    format!(
                        "Invalid status at {}: '{}'. Must be one of {}",
                        item.path,
                        status,
                        Status::known_list()
                    ),
                    &item.path,
                );
            }
        }
    }

    fn check_ids(&mut self, plan: &Value, items: &[ItemRef<'_>]) {
        if let Some(id) = field(plan, "id") {
            if !id.as_str().is_some_and(is_hierarchical_id) {
                self.error(
                    DiagnosticCode::InvalidId,
                    format!(
                        "Invalid plan ID format: '{}'. Must match pattern: {}",
                        display_value(id),
                        pattern_body(ID_PATTERN)
                    ),
                    "plan.id",
                );
            }
        }

        for item in items {
            let Some(id) = field(item.item, "id") else {
                continue;
            };
            if !id.as_str().is_some_and(is_hierarchical_id) {
                self.error(
                    DiagnosticCode::InvalidId,
                    format!(
                        "Invalid ID format at {}: '{}'. Must match pattern: {}",
                        item.path,
                        display_value(id),
                        pattern_body(ID_PATTERN)
                    ),
                    &item.path,
                );
            }
        }

        let ids = resolve_ids(plan_items(plan));
        for duplicate in ids.duplicates() {
            self.error(
                DiagnosticCode::DuplicateId,
                format!(
                    "Duplicate item ID '{}' at {} (first declared at {})",
                    duplicate.id, duplicate.path, duplicate.first_path
                ),
                &duplicate.path,
            );
        }
    }

    fn check_plan_refs(&mut self, items: &[ItemRef<'_>]) {
        for item in items {
            let Some(plan_ref) = field(item.item, "planRef") else {
                continue;
            };
            if !plan_ref.as_str().is_some_and(is_plan_ref) {
                self.error(
                    DiagnosticCode::InvalidPlanRef,
                    format!(
                        "Invalid planRef URI at {}: '{}'. Must match: #item-id, file://..., or https://...",
                        item.path,
                        display_value(plan_ref)
                    ),
                    &item.path,
                );
            }
        }
    }

    fn check_narratives(&mut self, plan: &Value) {
        let Some(narratives) = plan.get("narratives").and_then(Value::as_object) else {
            return;
        };

        for key in narratives.keys() {
            let path = format!("plan.narratives.{}", key);
            if !key.chars().next().is_some_and(char::is_uppercase) {
                self.report.push(
                    Diagnostic::new(
                        DiagnosticCode::NarrativeKeyCase,
                        format!(
                            "Narrative key '{}' SHOULD use TitleCase (e.g., '{}')",
                            key,
                            title_case(key)
                        ),
                    )
                    .at(&path),
                );
            }
            if key.contains(' ') {
                self.report.push(
                    Diagnostic::new(
                        DiagnosticCode::NarrativeKeySpace,
                        format!("Narrative key '{}' SHOULD not contain spaces", key),
                    )
                    .at(&path),
                );
            }
        }
    }
}

/// The pattern without anchors, as shown to users
fn pattern_body(pattern: &str) -> &str {
    pattern.trim_start_matches('^').trim_end_matches('$')
}

/// Word-wise capitalisation: each run of letters starts uppercase and
/// continues lowercase.
fn title_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut in_word = false;
    for c in key.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_document() -> Value {
        json!({
            "vBRIEFInfo": {"version": "0.5"},
            "plan": {
                "id": "release-1",
                "title": "Release",
                "status": "running",
                "items": [
                    {"id": "build", "title": "Build", "status": "completed"},
                    {
                        "id": "ship",
                        "title": "Ship",
                        "status": "pending",
                        "planRef": "#build",
                        "subItems": [{"id": "notes", "title": "Notes", "status": "draft"}]
                    }
                ],
                "narratives": {"Proposal": "Ship it"}
            }
        })
    }

    fn codes(report: &ConformanceReport) -> Vec<DiagnosticCode> {
        report.errors.iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_valid_document_is_conformant() {
        let report = check_conformance(&valid_document());
        assert!(report.is_conformant(), "{:?}", report.errors);
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_wrong_version() {
        let mut doc = valid_document();
        doc["vBRIEFInfo"]["version"] = json!("0.4");
        let report = check_conformance(&doc);
        assert_eq!(codes(&report), vec![DiagnosticCode::UnsupportedVersion]);
        assert_eq!(report.errors[0].message, "Invalid version: expected '0.5', got '0.4'");
    }

    #[test]
    fn test_missing_or_empty_info() {
        let mut doc = valid_document();
        doc["vBRIEFInfo"] = json!({});
        assert_eq!(codes(&check_conformance(&doc)), vec![DiagnosticCode::MissingInfo]);

        doc.as_object_mut().unwrap().remove("vBRIEFInfo");
        assert_eq!(codes(&check_conformance(&doc)), vec![DiagnosticCode::MissingInfo]);
    }

    #[test]
    fn test_legacy_containers_without_plan() {
        let doc = json!({
            "vBRIEFInfo": {"version": "0.5"},
            "todoList": {"items": []},
            "playbook": {}
        });
        assert_eq!(
            codes(&check_conformance(&doc)),
            vec![
                DiagnosticCode::MissingPlan,
                DiagnosticCode::LegacyContainer,
                DiagnosticCode::LegacyContainer
            ]
        );
    }

    #[test]
    fn test_missing_plan_fields() {
        let doc = json!({"vBRIEFInfo": {"version": "0.5"}, "plan": {"items": {"id": "a"}}});
        let report = check_conformance(&doc);
        let messages: Vec<_> = report.errors.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Plan missing required field: title",
                "Plan missing required field: status",
                "Plan.items must be an array",
            ]
        );
    }

    #[test]
    fn test_plan_not_an_object() {
        let doc = json!({"vBRIEFInfo": {"version": "0.5"}, "plan": ["items"]});
        assert_eq!(codes(&check_conformance(&doc)), vec![DiagnosticCode::InvalidPlan]);
    }

    #[test]
    fn test_edges_must_be_array() {
        let mut doc = valid_document();
        doc["plan"]["edges"] = json!({"from": "build", "to": "ship"});
        assert_eq!(codes(&check_conformance(&doc)), vec![DiagnosticCode::EdgesNotArray]);
    }

    #[test]
    fn test_nested_status_path() {
        let mut doc = valid_document();
        doc["plan"]["items"][1]["subItems"][0]["status"] = json!("in_progress");
        let report = check_conformance(&doc);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path.as_deref(), Some("items[1].subItems[0]"));
        assert!(report.errors[0]
            .message
            .starts_with("Invalid status at items[1].subItems[0]: 'in_progress'"));
    }

    #[test]
    fn test_plan_status_checked() {
        let mut doc = valid_document();
        doc["plan"]["status"] = json!("done");
        let report = check_conformance(&doc);
        assert_eq!(report.errors[0].path.as_deref(), Some("plan.status"));
    }

    #[test]
    fn test_id_syntax() {
        assert!(is_hierarchical_id("phase_1.task-2"));
        assert!(!is_hierarchical_id("phase 1"));
        assert!(!is_hierarchical_id("a..b"));
        assert!(!is_hierarchical_id(".a"));
        assert!(!is_hierarchical_id("a/b"));

        let mut doc = valid_document();
        doc["plan"]["id"] = json!("bad id");
        doc["plan"]["items"][0]["id"] = json!(42);
        let report = check_conformance(&doc);
        let paths: Vec<_> = report.errors.iter().filter_map(|d| d.path.as_deref()).collect();
        assert_eq!(paths, vec!["plan.id", "items[0]"]);
    }

    #[test]
    fn test_duplicate_ids() {
        let mut doc = valid_document();
        doc["plan"]["items"][1]["id"] = json!("build");
        let report = check_conformance(&doc);
        assert_eq!(codes(&report), vec![DiagnosticCode::DuplicateId]);
        assert_eq!(
            report.errors[0].message,
            "Duplicate item ID 'build' at items[1] (first declared at items[0])"
        );
    }

    #[test]
    fn test_plan_ref_syntax() {
        assert!(is_plan_ref("#phase1.task-2"));
        assert!(is_plan_ref("file:///plans/other.vbrief.json"));
        assert!(is_plan_ref("https://example.com/plan.json"));
        assert!(!is_plan_ref("ftp://example.com/plan.json"));
        assert!(!is_plan_ref("#"));
        assert!(!is_plan_ref("plan.json"));

        let mut doc = valid_document();
        doc["plan"]["items"][1]["subItems"][0]["planRef"] = json!("../other.json");
        let report = check_conformance(&doc);
        assert_eq!(codes(&report), vec![DiagnosticCode::InvalidPlanRef]);
    }

    #[test]
    fn test_narrative_keys_warn_only() {
        let mut doc = valid_document();
        doc["plan"]["narratives"] = json!({"Risk Notes": "x", "background": "y"});
        let report = check_conformance(&doc);
        assert!(report.is_conformant());

        let messages: Vec<_> = report.warnings.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Narrative key 'Risk Notes' SHOULD not contain spaces",
                "Narrative key 'background' SHOULD use TitleCase (e.g., 'Background')",
            ]
        );
    }

    #[test]
    fn test_narrative_warnings_follow_document_order() {
        let doc: Value = serde_json::from_str(
            r#"{
                "vBRIEFInfo": {"version": "0.5"},
                "plan": {
                    "title": "Plan",
                    "status": "draft",
                    "items": [],
                    "narratives": {"zeta": "z", "Middle": "m", "alpha": "a"}
                }
            }"#,
        )
        .unwrap();
        let report = check_conformance(&doc);

        let keys: Vec<_> = report.warnings.iter().filter_map(|d| d.path.as_deref()).collect();
        assert_eq!(keys, vec!["plan.narratives.zeta", "plan.narratives.alpha"]);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("risk notes"), "Risk Notes");
        assert_eq!(title_case("fooBar"), "Foobar");
        assert_eq!(title_case("step_two"), "Step_Two");
    }

    #[test]
    fn test_non_object_document() {
        let report = check_conformance(&json!([1, 2, 3]));
        assert_eq!(
            codes(&report),
            vec![DiagnosticCode::MissingInfo, DiagnosticCode::MissingPlan]
        );
    }
}
