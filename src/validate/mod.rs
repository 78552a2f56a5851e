//! Validation engine: run each job's rule list against its node.

pub mod registry;
pub mod rules;

pub use registry::{Rule, RuleRegistry, RuleTable};
pub use rules::RuleContext;

use crate::error::ValidationIssue;
use crate::job::SubmissionGraph;
use crate::scene::{NodeAdapter, profile};

/// Validate a single node. Every rule for the node's kind runs, in order;
/// nothing short-circuits. Unknown or unsupported nodes yield no issues.
pub fn validate(node: &str, registry: &RuleRegistry, adapter: &dyn NodeAdapter) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let Some(kind) = adapter.kind(node) else {
        return issues;
    };
    let Some(kind_profile) = profile(&kind) else {
        return issues;
    };

    let ctx = RuleContext {
        node,
        kind: &kind,
        profile: kind_profile,
        adapter,
    };
    for rule in registry.rules_for(&kind) {
        (rule.check)(&ctx, &mut issues);
    }
    issues
}

/// Validate every job of a submission graph, in job order.
pub fn validate_graph(
    graph: &SubmissionGraph,
    registry: &RuleRegistry,
    adapter: &dyn NodeAdapter,
) -> Vec<ValidationIssue> {
    graph
        .jobs()
        .iter()
        .flat_map(|job| validate(&job.node, registry, adapter))
        .collect()
}
