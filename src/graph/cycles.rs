//! Cycle detection over a plan dependency graph.
//!
//! Three-colour depth-first search: white nodes are unvisited, gray nodes are
//! on the current DFS path, black nodes are finished. An edge into a gray node
//! is a back edge and closes a cycle. The search is iterative, with an explicit
//! frame stack that doubles as the path used to reconstruct the cycle.

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::DependencyGraph;

/// A witness cycle: node IDs in traversal order, first and last equal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle(Vec<String>);

impl Cycle {
    pub fn nodes(&self) -> &[String] {
        &self.0
    }

    /// Number of entries, counting the repeated start node
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|n| n == id)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" -> "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    cursor: usize,
}

impl Frame {
    fn enter(graph: &DependencyGraph, node: NodeIndex) -> Self {
        Self {
            node,
            successors: graph.successor_indices(node),
            cursor: 0,
        }
    }
}

/// Find the first cycle reachable in node-insertion order.
///
/// Roots are tried in the order nodes were added (item declaration order,
/// then unknown edge sources). Only the first back edge found is reported;
/// no minimality is implied. Runs in O(V + E).
pub fn find_cycle(graph: &DependencyGraph) -> Option<Cycle> {
    let inner = graph.inner();
    let mut color = vec![Color::White; inner.node_count()];

    for root in inner.node_indices() {
        if color[root.index()] != Color::White {
            continue;
        }

        color[root.index()] = Color::Gray;
        let mut stack = vec![Frame::enter(graph, root)];

        while let Some(frame) = stack.last_mut() {
            let Some(&next) = frame.successors.get(frame.cursor) else {
                color[frame.node.index()] = Color::Black;
                stack.pop();
                continue;
            };
            frame.cursor += 1;

            match color[next.index()] {
                Color::White => {
                    color[next.index()] = Color::Gray;
                    stack.push(Frame::enter(graph, next));
                }
                Color::Gray => return Some(reconstruct(graph, &stack, next)),
                Color::Black => {}
            }
        }
    }

    None
}

/// Gray nodes are exactly the frames on the stack, so the cycle is the stack
/// suffix starting at `target`, closed by `target` again.
fn reconstruct(graph: &DependencyGraph, stack: &[Frame], target: NodeIndex) -> Cycle {
    let start = stack
        .iter()
        .position(|frame| frame.node == target)
        .unwrap_or(0);

    let mut nodes: Vec<String> = stack[start..]
        .iter()
        .map(|frame| graph.name(frame.node).to_string())
        .collect();
    nodes.push(graph.name(target).to_string());
    Cycle(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn graph(ids: &[&str], edges: Value) -> DependencyGraph {
        let edges = edges.as_array().cloned().unwrap_or_default();
        DependencyGraph::build(ids.iter().copied(), &edges)
    }

    #[test]
    fn test_no_edges_no_cycle() {
        assert!(find_cycle(&graph(&["a", "b", "c"], json!([]))).is_none());
    }

    #[test]
    fn test_forest_has_no_cycle() {
        let g = graph(
            &["a", "b", "c", "d", "e"],
            json!([
                {"from": "a", "to": "b", "type": "blocks"},
                {"from": "a", "to": "c", "type": "blocks"},
                {"from": "d", "to": "e", "type": "informs"}
            ]),
        );
        assert!(find_cycle(&g).is_none());
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let g = graph(
            &["a", "b", "c", "d"],
            json!([
                {"from": "a", "to": "b", "type": "blocks"},
                {"from": "a", "to": "c", "type": "blocks"},
                {"from": "b", "to": "d", "type": "blocks"},
                {"from": "c", "to": "d", "type": "blocks"}
            ]),
        );
        assert!(find_cycle(&g).is_none());
    }

    #[test]
    fn test_three_node_cycle() {
        let g = graph(
            &["A", "B", "C"],
            json!([
                {"from": "A", "to": "B", "type": "blocks"},
                {"from": "B", "to": "C", "type": "blocks"},
                {"from": "C", "to": "A", "type": "blocks"}
            ]),
        );
        let cycle = find_cycle(&g).expect("cycle");
        assert_eq!(cycle.len(), 4);
        assert_eq!(cycle.nodes().first(), cycle.nodes().last());
        for id in ["A", "B", "C"] {
            assert!(cycle.contains(id));
        }
        assert_eq!(cycle.nodes(), &["A", "B", "C", "A"]);
    }

    #[test]
    fn test_self_loop() {
        let g = graph(&["a"], json!([{"from": "a", "to": "a", "type": "blocks"}]));
        assert_eq!(find_cycle(&g).unwrap().to_string(), "a -> a");
    }

    #[test]
    fn test_cycle_below_entry_path() {
        // Entry at root, cycle only among b, c, d
        let g = graph(
            &["root", "b", "c", "d"],
            json!([
                {"from": "root", "to": "b", "type": "blocks"},
                {"from": "b", "to": "c", "type": "blocks"},
                {"from": "c", "to": "d", "type": "blocks"},
                {"from": "d", "to": "b", "type": "blocks"}
            ]),
        );
        assert_eq!(find_cycle(&g).unwrap().nodes(), &["b", "c", "d", "b"]);
    }

    #[test]
    fn test_cross_edge_to_finished_node() {
        let g = graph(
            &["a", "b", "c"],
            json!([
                {"from": "a", "to": "b", "type": "blocks"},
                {"from": "c", "to": "b", "type": "blocks"},
                {"from": "c", "to": "a", "type": "blocks"}
            ]),
        );
        assert!(find_cycle(&g).is_none());
    }

    #[test]
    fn test_unknown_nodes_do_not_crash() {
        let g = graph(
            &["B"],
            json!([
                {"from": "X", "to": "B", "type": "blocks"},
                {"from": "B", "to": "ghost", "type": "blocks"}
            ]),
        );
        assert!(find_cycle(&g).is_none());
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let ids: Vec<String> = (0..20_000).map(|i| format!("n{}", i)).collect();
        let mut edges: Vec<Value> = ids
            .windows(2)
            .map(|w| json!({"from": w[0], "to": w[1], "type": "blocks"}))
            .collect();
        edges.push(json!({"from": ids[ids.len() - 1], "to": ids[0], "type": "blocks"}));

        let g = DependencyGraph::build(ids.iter().map(String::as_str), &edges);
        let cycle = find_cycle(&g).expect("cycle");
        assert_eq!(cycle.len(), ids.len() + 1);
    }
}
