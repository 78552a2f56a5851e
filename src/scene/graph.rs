//! petgraph-based view of the nodes in scope for one submission.
//!
//! Nodes live in an arena keyed by path; edges point from an upstream node to
//! the node consuming it. Insertion order is discovery order.

use std::collections::{HashMap, VecDeque};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::debug;

use super::NodeAdapter;
use crate::error::ValidationIssue;
use crate::job::TraversalMode;

pub struct SceneGraph {
    pub graph: DiGraph<String, ()>,
    pub node_indices: HashMap<String, NodeIndex>,
}

impl SceneGraph {
    /// Walk the adapter breadth-first from `seed`, collecting every node the
    /// traversal mode puts in scope. Connections to unknown paths are dropped
    /// with a warning on the referencing node.
    ///
    /// The caller is expected to have checked that `seed` exists.
    pub fn discover(
        adapter: &dyn NodeAdapter,
        seed: &str,
        mode: TraversalMode,
    ) -> (Self, Vec<ValidationIssue>) {
        let mut scope = SceneGraph {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
        };
        let mut issues = Vec::new();

        scope.insert(seed);
        if mode == TraversalMode::SingleNode {
            return (scope, issues);
        }

        let mut queue = VecDeque::from([seed.to_string()]);
        while let Some(path) = queue.pop_front() {
            let idx = scope.node_indices[&path];

            for input in adapter.upstream(&path) {
                if adapter.kind(&input).is_none() {
                    issues.push(dangling_connection(&path, &input));
                    continue;
                }
                let (input_idx, is_new) = scope.insert(&input);
                scope.graph.update_edge(input_idx, idx, ());
                if is_new {
                    queue.push_back(input);
                }
            }

            if mode == TraversalMode::FullConnectedTree {
                for output in adapter.downstream(&path) {
                    if adapter.kind(&output).is_none() {
                        issues.push(dangling_connection(&path, &output));
                        continue;
                    }
                    let (output_idx, is_new) = scope.insert(&output);
                    scope.graph.update_edge(idx, output_idx, ());
                    if is_new {
                        queue.push_back(output);
                    }
                }
            }
        }

        debug!(seed, ?mode, nodes = scope.len(), "discovered submission scope");
        (scope, issues)
    }

    fn insert(&mut self, path: &str) -> (NodeIndex, bool) {
        if let Some(&idx) = self.node_indices.get(path) {
            return (idx, false);
        }
        let idx = self.graph.add_node(path.to_string());
        self.node_indices.insert(path.to_string(), idx);
        (idx, true)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, path: &str) -> bool {
        self.node_indices.contains_key(path)
    }

    /// Node paths in discovery order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(|idx| self.graph[idx].as_str())
    }

    /// In-scope direct upstream nodes of `path`.
    pub fn predecessors(&self, path: &str) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(path) else {
            return vec![];
        };
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| self.graph[n].as_str())
            .collect()
    }

    /// A node on a cycle, if the discovered connections contain one.
    pub fn find_cycle(&self) -> Option<&str> {
        toposort(&self.graph, None)
            .err()
            .map(|cycle| self.graph[cycle.node_id()].as_str())
    }
}

fn dangling_connection(node: &str, missing: &str) -> ValidationIssue {
    ValidationIssue::warning(
        "G002",
        format!("Connected node '{}' does not exist and was ignored", missing),
        node,
    )
}
