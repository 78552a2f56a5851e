//! Submission graph: the DAG of jobs built for one submission call.

pub mod types;

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

pub use types::*;

use crate::scene::NodeKind;

/// Arena of `JobSpec`s indexed by `JobId`, in discovery order. Every
/// dependency points at a member of the same graph.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubmissionGraph {
    jobs: Vec<JobSpec>,
    #[serde(skip)]
    by_node: HashMap<String, JobId>,
}

impl SubmissionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job for `node`, or return the existing one.
    pub(crate) fn insert(&mut self, node: &str, kind: NodeKind, params: SubmissionParams) -> JobId {
        if let Some(&id) = self.by_node.get(node) {
            return id;
        }
        let id = JobId(self.jobs.len());
        self.jobs.push(JobSpec {
            id,
            node: node.to_string(),
            kind,
            params,
            tasks: Vec::new(),
            dependencies: BTreeSet::new(),
        });
        self.by_node.insert(node.to_string(), id);
        id
    }

    /// Record that `job` waits for `on`. Both must be members.
    pub(crate) fn add_dependency(&mut self, job: JobId, on: JobId) {
        debug_assert!(on.0 < self.jobs.len());
        self.jobs[job.0].dependencies.insert(on);
    }

    pub(crate) fn job_mut(&mut self, id: JobId) -> Option<&mut JobSpec> {
        self.jobs.get_mut(id.0)
    }

    pub fn jobs(&self) -> &[JobSpec] {
        &self.jobs
    }

    pub fn job(&self, id: JobId) -> Option<&JobSpec> {
        self.jobs.get(id.0)
    }

    pub fn job_for_node(&self, node: &str) -> Option<&JobSpec> {
        self.by_node.get(node).map(|id| &self.jobs[id.0])
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs that directly depend on `id`.
    pub fn dependents(&self, id: JobId) -> Vec<JobId> {
        self.jobs
            .iter()
            .filter(|job| job.dependencies.contains(&id))
            .map(|job| job.id)
            .collect()
    }

    /// Topological order; ties go to the job discovered first.
    pub fn submission_order(&self) -> Vec<JobId> {
        crate::build::topo::submission_order(self)
    }
}
