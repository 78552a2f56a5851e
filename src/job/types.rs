//! Job-side data model: what gets sent to the farm for each node.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chunk::{ChunkPolicy, FrameSet, TaskSpec};
use crate::scene::{JobPlugin, NodeKind};

/// Which nodes around the selected one take part in a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraversalMode {
    SingleNode,
    NodeAndUpstream,
    FullConnectedTree,
}

/// Index of a job in its `SubmissionGraph`. Ordered by discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub usize);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque job identifier assigned by the farm.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FarmJobId(pub String);

impl FarmJobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FarmJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FarmJobId {
    fn from(id: &str) -> Self {
        FarmJobId(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdvancedOverrides {
    pub enable_auto_timeout: bool,
    pub task_timeout_minutes: i64,
    pub limit_tasks_to_cpus: bool,
    pub concurrent_tasks: i64,
    pub machine_limit: i64,
    pub limit_groups: String,
    pub machine_list: String,
    /// `machine_list` is a blacklist instead of a whitelist.
    pub machine_list_is_blacklist: bool,
}

/// Scheduling settings for one farm job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmSettings {
    pub pool: String,
    pub secondary_pool: String,
    pub group: String,
    pub priority: i64,
    pub chunk_policy: ChunkPolicy,
    pub advanced: AdvancedOverrides,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionParams {
    pub job_name: String,
    pub comment: String,
    pub plugin: JobPlugin,
    /// `None` when the node's frame parameters could not be resolved.
    pub frames: Option<FrameSet>,
    pub farm: FarmSettings,
    /// IFD generation stage of two-stage render kinds.
    pub ifd_stage: Option<FarmSettings>,
    pub output_path: Option<String>,
    pub ifd_path: Option<String>,
    /// Extra `mantra` arguments taken from the node's render command.
    pub mantra_options: String,
    /// Farm job IDs outside this submission that the job must wait for.
    pub extra_dependencies: Vec<String>,
    pub submit_scene: bool,
}

/// One farm job per unique node in a submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSpec {
    pub id: JobId,
    pub node: String,
    pub kind: NodeKind,
    pub params: SubmissionParams,
    pub tasks: Vec<TaskSpec>,
    /// Jobs that must complete before this one starts.
    pub dependencies: BTreeSet<JobId>,
}
