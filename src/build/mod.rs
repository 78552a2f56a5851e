//! Graph builder: selection + traversal mode → `SubmissionGraph`.

pub mod params;
pub mod topo;

use tracing::{debug, warn};

use crate::error::{GraphError, ValidationIssue};
use crate::job::{SubmissionGraph, TraversalMode};
use crate::scene::{NodeAdapter, SceneGraph, profile};

/// A built graph together with the non-fatal issues found while walking the
/// node network.
#[derive(Debug)]
pub struct BuiltGraph {
    pub graph: SubmissionGraph,
    pub issues: Vec<ValidationIssue>,
}

/// Walk the node network from `seed` and create one job per supported node.
///
/// A job depends on the jobs of its direct upstream nodes that are part of
/// the submission. Unsupported nodes are traversed but get no job, and
/// connections through them are not bridged.
pub fn build_graph(
    adapter: &dyn NodeAdapter,
    seed: &str,
    mode: TraversalMode,
) -> Result<BuiltGraph, GraphError> {
    // 1. The seed must exist and be submittable
    let seed_kind = adapter.kind(seed).ok_or_else(|| GraphError::UnknownNode {
        node: seed.to_string(),
    })?;
    if !seed_kind.is_supported() {
        return Err(GraphError::UnsupportedSeed {
            node: seed.to_string(),
            type_name: seed_kind.type_name().to_string(),
        });
    }

    // 2. Discover the scope
    let (scope, mut issues) = SceneGraph::discover(adapter, seed, mode);
    if let Some(node) = scope.find_cycle() {
        return Err(GraphError::Cycle {
            node: node.to_string(),
        });
    }

    // 3. One job per supported node, in discovery order
    let mut graph = SubmissionGraph::new();
    for path in scope.paths() {
        let Some(kind) = adapter.kind(path) else {
            continue;
        };
        match profile(&kind) {
            Some(kind_profile) => {
                let params = params::resolve(adapter, path, kind_profile);
                graph.insert(path, kind, params);
            }
            None => {
                warn!(node = path, kind = %kind, "skipping unsupported node");
                issues.push(ValidationIssue::warning(
                    "G001",
                    format!("Node type '{}' is not supported and was skipped", kind),
                    path,
                ));
            }
        }
    }

    // 4. Dependencies mirror in-scope connections between supported nodes
    for path in scope.paths() {
        let Some(job) = graph.job_for_node(path).map(|j| j.id) else {
            continue;
        };
        for upstream in scope.predecessors(path) {
            if let Some(dep) = graph.job_for_node(upstream).map(|j| j.id) {
                graph.add_dependency(job, dep);
            }
        }
    }

    debug!(seed, jobs = graph.len(), issues = issues.len(), "built submission graph");
    Ok(BuiltGraph { graph, issues })
}
