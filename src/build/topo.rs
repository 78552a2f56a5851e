//! Topological order of the submission graph.

use std::collections::BTreeSet;

use crate::job::{JobId, SubmissionGraph};

/// Job IDs in dependency order. Among jobs that are ready at the same time
/// the one discovered first goes first, so the order is deterministic.
///
/// The graph is acyclic by construction; jobs left over by a malformed graph
/// are appended in discovery order rather than dropped.
pub fn submission_order(graph: &SubmissionGraph) -> Vec<JobId> {
    let mut pending: Vec<usize> = graph
        .jobs()
        .iter()
        .map(|job| job.dependencies.len())
        .collect();
    let mut dependents: Vec<Vec<JobId>> = vec![Vec::new(); graph.len()];
    for job in graph.jobs() {
        for dep in &job.dependencies {
            dependents[dep.0].push(job.id);
        }
    }

    let mut ready: BTreeSet<JobId> = graph
        .jobs()
        .iter()
        .filter(|job| job.dependencies.is_empty())
        .map(|job| job.id)
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(id) = ready.pop_first() {
        order.push(id);
        for &next in &dependents[id.0] {
            pending[next.0] -= 1;
            if pending[next.0] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() < graph.len() {
        let placed: BTreeSet<JobId> = order.iter().copied().collect();
        order.extend(graph.jobs().iter().map(|j| j.id).filter(|id| !placed.contains(id)));
    }
    order
}
