//! Plan Dependency Graph
//!
//! Builds a petgraph `DiGraph` from a plan's edge list and resolved item IDs,
//! and runs the DAG checks over it: reference validation first, then cycle
//! detection only when every reference resolves.
//!
//! Edges name their endpoints by fully-qualified ID rather than pointing at
//! items, so a graph can always be built. Unknown sources become extra nodes
//! and unknown targets are kept aside as dangling; neither ever makes a lookup
//! fail.

pub mod cycles;
pub mod references;

pub use cycles::{find_cycle, Cycle};
pub use references::validate_references;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::ids::{resolve_ids, IdIndex};
use crate::model::{display_value, field, plan_items, EdgeType};

/// Fully-qualified item identifier
pub type ItemId = String;

/// Read an edge endpoint or type, treating blank values as missing
pub(crate) fn edge_field(edge: &Value, key: &str) -> Option<String> {
    field(edge, key).map(display_value)
}

// =============================================================================
// Dependency Graph
// =============================================================================

/// Adjacency structure over fully-qualified item IDs
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Node weight = item ID, edge weight = edge type (`None` when missing)
    graph: DiGraph<ItemId, Option<EdgeType>>,
    node_indices: HashMap<ItemId, NodeIndex>,
    /// `(from, to)` pairs whose target is not a node
    dangling: Vec<(ItemId, ItemId)>,
}

impl DependencyGraph {
    /// Build the graph from resolved IDs and a raw edge list.
    ///
    /// Every ID gets a node, even with no edges. Edges missing `from` or `to`
    /// are left out; reference validation reports them.
    pub fn build<'a>(ids: impl IntoIterator<Item = &'a str>, edges: &[Value]) -> Self {
        let mut this = Self::default();

        for id in ids {
            this.add_node(id);
        }

        let endpoints: Vec<_> = edges
            .iter()
            .filter_map(|edge| {
                let from = edge_field(edge, "from")?;
                let to = edge_field(edge, "to")?;
                let kind = edge_field(edge, "type").map(|t| EdgeType::parse(&t));
                Some((from, to, kind))
            })
            .collect();

        // Sources first, so a target that is only declared as a source later
        // in the list still resolves to a node
        for (from, _, _) in &endpoints {
            this.add_node(from);
        }

        for (from, to, kind) in endpoints {
            let source = this.node_indices[&from];
            match this.node_indices.get(&to) {
                Some(&target) => {
                    this.graph.add_edge(source, target, kind);
                }
                None => this.dangling.push((from, to)),
            }
        }

        tracing::debug!(
            nodes = this.graph.node_count(),
            edges = this.graph.edge_count(),
            dangling = this.dangling.len(),
            "built dependency graph"
        );
        this
    }

    fn add_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.node_indices.insert(id.to_string(), idx);
        idx
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Node IDs in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_weights().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Outgoing targets of `id` in edge-declaration order
    pub fn successors(&self, id: &str) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(id) else {
            return Vec::new();
        };
        self.successor_indices(idx)
            .into_iter()
            .map(|target| self.graph[target].as_str())
            .collect()
    }

    /// Typed edges as `(from, to, type)` in declaration order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, Option<&EdgeType>)> + '_ {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].as_str(),
                self.graph[e.target()].as_str(),
                e.weight().as_ref(),
            )
        })
    }

    pub fn dangling(&self) -> &[(ItemId, ItemId)] {
        &self.dangling
    }

    /// The underlying petgraph graph
    pub fn inner(&self) -> &DiGraph<ItemId, Option<EdgeType>> {
        &self.graph
    }

    pub(crate) fn successor_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        // petgraph walks outgoing edges newest-first
        let mut outgoing: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        outgoing.sort_by_key(|(edge, _)| *edge);
        outgoing.into_iter().map(|(_, target)| target).collect()
    }

    pub(crate) fn name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }
}

// =============================================================================
// DAG Validation
// =============================================================================

/// Outcome of DAG validation for a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "errors", rename_all = "lowercase")]
pub enum DagOutcome {
    /// The plan has no edges to check
    Skipped,
    Passed,
    Failed(Vec<Diagnostic>),
}

impl DagOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn errors(&self) -> &[Diagnostic] {
        match self {
            Self::Failed(errors) => errors,
            _ => &[],
        }
    }
}

/// Validate DAG constraints for items and a non-empty edge list.
///
/// References are checked first; a cycle search only runs over a graph whose
/// references all resolve.
pub fn validate_dag(ids: &IdIndex<'_>, edges: &[Value]) -> DagOutcome {
    let mut errors = validate_references(edges, ids);

    if errors.is_empty() {
        let graph = DependencyGraph::build(ids.ids(), edges);
        if let Some(cycle) = find_cycle(&graph) {
            tracing::info!(cycle = %cycle, "dependency cycle detected");
            errors.push(Diagnostic::new(
                DiagnosticCode::Cycle,
                format!("Cycle detected: {}", cycle),
            ));
        }
    }

    if errors.is_empty() {
        DagOutcome::Passed
    } else {
        DagOutcome::Failed(errors)
    }
}

/// Validate a plan's DAG, skipping when `edges` is absent, empty or not an
/// array.
pub fn validate_plan_dag(plan: &Value) -> DagOutcome {
    let edges = match plan.get("edges").and_then(Value::as_array) {
        Some(edges) if !edges.is_empty() => edges,
        _ => return DagOutcome::Skipped,
    };

    let items = plan_items(plan);
    let ids = resolve_ids(items);
    validate_dag(&ids, edges)
}
