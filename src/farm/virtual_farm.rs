//! Simulated farm. Never leaves the process; hands out `F1`, `F2`, ... in
//! submission order and remembers every call.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::info;

use super::{FarmClient, FarmJobId};
use crate::error::SubmissionError;
use crate::job::JobSpec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualSubmission {
    pub node: String,
    pub farm_id: Option<FarmJobId>,
    pub dependencies: Vec<FarmJobId>,
}

/// Shared view of a virtual farm's call log. Stays readable after the farm
/// itself has been handed to a `Submitter`.
#[derive(Debug, Clone, Default)]
pub struct VirtualLog(Arc<Mutex<Vec<VirtualSubmission>>>);

impl VirtualLog {
    pub fn entries(&self) -> Vec<VirtualSubmission> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Nodes in the order they were sent.
    pub fn nodes(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.node).collect()
    }

    fn push(&self, entry: VirtualSubmission) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(entry);
    }
}

#[derive(Debug, Default)]
pub struct VirtualFarm {
    next_id: usize,
    failing: HashSet<String>,
    log: VirtualLog,
}

impl VirtualFarm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every job created for `node`.
    pub fn fail_on(mut self, node: &str) -> Self {
        self.failing.insert(node.to_string());
        self
    }

    pub fn log(&self) -> VirtualLog {
        self.log.clone()
    }
}

impl FarmClient for VirtualFarm {
    fn name(&self) -> &str {
        "virtual"
    }

    fn submit_job(&mut self, job: &JobSpec, dependencies: &[FarmJobId]) -> Result<FarmJobId, SubmissionError> {
        let result = if self.failing.contains(&job.node) {
            Err(SubmissionError::Farm {
                node: job.node.clone(),
                message: "rejected by virtual farm".to_string(),
            })
        } else {
            self.next_id += 1;
            Ok(FarmJobId(format!("F{}", self.next_id)))
        };

        self.log.push(VirtualSubmission {
            node: job.node.clone(),
            farm_id: result.as_ref().ok().cloned(),
            dependencies: dependencies.to_vec(),
        });
        if let Ok(id) = &result {
            info!(node = %job.node, farm_id = %id, tasks = job.tasks.len(), "virtual job created");
        }
        result
    }
}
