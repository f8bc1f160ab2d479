//! Edge reference validation.

use serde_json::Value;

use super::edge_field;
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::ids::IdIndex;

/// Check that every edge names a `from`, `to` and `type`, and that both
/// endpoints resolve to a known item.
///
/// All edges are checked and each edge can contribute several errors. An empty
/// result means every reference is valid.
pub fn validate_references(edges: &[Value], ids: &IdIndex<'_>) -> Vec<Diagnostic> {
    let mut errors = Vec::new();

    for (i, edge) in edges.iter().enumerate() {
        let path = format!("edges[{}]", i);

        for endpoint in ["from", "to"] {
            match edge_field(edge, endpoint) {
                None => errors.push(
                    Diagnostic::new(
                        DiagnosticCode::MissingEdgeField,
                        format!("Edge {}: missing '{}' field", i, endpoint),
                    )
                    .at(&path),
                ),
                Some(id) if !ids.contains(&id) => errors.push(
                    Diagnostic::new(
                        DiagnosticCode::UnknownReference,
                        format!("Edge {}: '{}' references non-existent item '{}'", i, endpoint, id),
                    )
                    .at(&path),
                ),
                Some(_) => {}
            }
        }

        if edge_field(edge, "type").is_none() {
            errors.push(
                Diagnostic::new(
                    DiagnosticCode::MissingEdgeField,
                    format!("Edge {}: missing 'type' field", i),
                )
                .at(&path),
            );
        }
    }

    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "edge reference errors");
    }
    errors
}
