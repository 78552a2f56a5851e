//! Submission orchestrator.
//!
//! Building → Validating → Chunking → Submitting. Everything before
//! Submitting is side-effect free, so an abort there leaves the farm
//! untouched.

pub mod cancel;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{error, info, warn};

pub use cancel::CancelToken;

use crate::build::build_graph;
use crate::chunk::compute_tasks_for_set;
use crate::config::SubmitterConfig;
use crate::error::{ChunkingError, ConfigError, GraphError, SubmissionError, ValidationIssue, has_errors};
use crate::farm::{self, FarmClient, FarmJobId};
use crate::job::{JobId, SubmissionGraph, TraversalMode};
use crate::scene::NodeAdapter;
use crate::validate::{RuleRegistry, validate_graph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionState {
    Idle,
    Building,
    Validating,
    Chunking,
    Submitting,
    Aborted,
    Committed,
    PartiallyFailed,
    /// Dry run finished: graph built, validated and chunked, nothing sent.
    Previewed,
}

/// Why a submission stopped before reaching the farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AbortReason {
    Graph(#[serde(serialize_with = "serialize_display")] GraphError),
    /// At least one Error issue; the full list is in `SubmissionResult::issues`.
    Validation,
    Chunking {
        node: String,
        #[serde(serialize_with = "serialize_display")]
        error: ChunkingError,
    },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobFailure {
    pub job: JobId,
    pub node: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: SubmissionError,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResult {
    pub status: SubmissionState,
    /// Build and validation issues, errors and warnings alike.
    pub issues: Vec<ValidationIssue>,
    pub graph: Option<SubmissionGraph>,
    pub farm_job_ids: BTreeMap<JobId, FarmJobId>,
    pub failures: Vec<JobFailure>,
    /// Jobs with no farm ID after Submitting, in submission order.
    pub not_submitted: Vec<JobId>,
    pub abort: Option<AbortReason>,
}

impl SubmissionResult {
    fn new() -> Self {
        SubmissionResult {
            status: SubmissionState::Idle,
            issues: Vec::new(),
            graph: None,
            farm_job_ids: BTreeMap::new(),
            failures: Vec::new(),
            not_submitted: Vec::new(),
            abort: None,
        }
    }

    fn aborted(mut self, reason: AbortReason) -> Self {
        warn!(?reason, "submission aborted");
        self.status = SubmissionState::Aborted;
        self.abort = Some(reason);
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, SubmissionState::Committed | SubmissionState::Previewed)
    }
}

fn serialize_display<T: std::fmt::Display, S: serde::Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Turns a node selection into farm jobs.
pub struct Submitter {
    farm: Box<dyn FarmClient>,
    registry: RuleRegistry,
}

impl Submitter {
    pub fn new(farm: Box<dyn FarmClient>, registry: RuleRegistry) -> Self {
        Submitter { farm, registry }
    }

    pub fn from_config(config: &SubmitterConfig) -> Result<Self, ConfigError> {
        let registry = config.registry()?;
        let farm = farm::connect(config)?;
        Ok(Submitter::new(farm, registry))
    }

    pub fn submit(
        &mut self,
        adapter: &dyn NodeAdapter,
        seed: &str,
        mode: TraversalMode,
        dry_run: bool,
    ) -> SubmissionResult {
        self.submit_with_cancel(adapter, seed, mode, dry_run, &CancelToken::new())
    }

    /// As `submit`, checking `cancel` between phases. Once jobs start going
    /// to the farm the call runs to completion.
    pub fn submit_with_cancel(
        &mut self,
        adapter: &dyn NodeAdapter,
        seed: &str,
        mode: TraversalMode,
        dry_run: bool,
        cancel: &CancelToken,
    ) -> SubmissionResult {
        let mut result = SubmissionResult::new();

        // 1. Building
        enter(&mut result, SubmissionState::Building, seed);
        if cancel.is_cancelled() {
            return result.aborted(AbortReason::Cancelled);
        }
        let built = match build_graph(adapter, seed, mode) {
            Ok(built) => built,
            Err(e) => return result.aborted(AbortReason::Graph(e)),
        };
        let mut graph = built.graph;
        result.issues = built.issues;

        // 2. Validating
        enter(&mut result, SubmissionState::Validating, seed);
        if cancel.is_cancelled() {
            result.graph = Some(graph);
            return result.aborted(AbortReason::Cancelled);
        }
        result.issues.extend(validate_graph(&graph, &self.registry, adapter));
        for issue in result.issues.iter().filter(|i| !i.is_error()) {
            warn!(%issue, "validation warning");
        }
        if has_errors(&result.issues) {
            result.graph = Some(graph);
            return result.aborted(AbortReason::Validation);
        }

        // 3. Chunking
        enter(&mut result, SubmissionState::Chunking, seed);
        if cancel.is_cancelled() {
            result.graph = Some(graph);
            return result.aborted(AbortReason::Cancelled);
        }
        if let Err((node, error)) = chunk_jobs(&mut graph) {
            result.graph = Some(graph);
            return result.aborted(AbortReason::Chunking { node, error });
        }

        if dry_run {
            result.status = SubmissionState::Previewed;
            info!(seed, jobs = graph.len(), "dry run complete");
            result.graph = Some(graph);
            return result;
        }
        if cancel.is_cancelled() {
            result.graph = Some(graph);
            return result.aborted(AbortReason::Cancelled);
        }

        // 4. Submitting
        enter(&mut result, SubmissionState::Submitting, seed);
        self.send_jobs(&graph, &mut result);
        result.status = if result.failures.is_empty() {
            SubmissionState::Committed
        } else {
            SubmissionState::PartiallyFailed
        };
        info!(
            seed,
            status = ?result.status,
            submitted = result.farm_job_ids.len(),
            failed = result.failures.len(),
            "submission finished"
        );
        result.graph = Some(graph);
        result
    }

    /// Send every job in dependency order. A job whose dependency has no farm
    /// ID is not sent; unrelated jobs carry on.
    fn send_jobs(&mut self, graph: &SubmissionGraph, result: &mut SubmissionResult) {
        for id in graph.submission_order() {
            let Some(job) = graph.job(id) else {
                continue;
            };

            let missing: BTreeSet<JobId> = job
                .dependencies
                .iter()
                .filter(|dep| !result.farm_job_ids.contains_key(*dep))
                .copied()
                .collect();
            if let Some(&dep) = missing.first() {
                let dependency = graph.job(dep).map(|d| d.node.clone()).unwrap_or_default();
                warn!(node = %job.node, %dependency, "skipping job with unsubmitted dependency");
                result.failures.push(JobFailure {
                    job: id,
                    node: job.node.clone(),
                    error: SubmissionError::DependencyNotSubmitted {
                        node: job.node.clone(),
                        dependency,
                    },
                });
                result.not_submitted.push(id);
                continue;
            }

            let dependencies: Vec<FarmJobId> = job
                .dependencies
                .iter()
                .filter_map(|dep| result.farm_job_ids.get(dep).cloned())
                .collect();
            match self.farm.submit_job(job, &dependencies) {
                Ok(farm_id) => {
                    info!(node = %job.node, farm = self.farm.name(), %farm_id, "job submitted");
                    result.farm_job_ids.insert(id, farm_id);
                }
                Err(e) => {
                    error!(node = %job.node, farm = self.farm.name(), error = %e, "job submission failed");
                    result.failures.push(JobFailure {
                        job: id,
                        node: job.node.clone(),
                        error: e,
                    });
                    result.not_submitted.push(id);
                }
            }
        }
    }
}

fn enter(result: &mut SubmissionResult, state: SubmissionState, seed: &str) {
    result.status = state;
    info!(seed, phase = ?state, "submission phase");
}

/// Compute the tasks of every job. The first failure wins, in job order.
fn chunk_jobs(graph: &mut SubmissionGraph) -> Result<(), (String, ChunkingError)> {
    for index in 0..graph.len() {
        let Some(job) = graph.job_mut(JobId(index)) else {
            continue;
        };
        let fail = |error: ChunkingError| (job.node.clone(), error);

        let frames = job.params.frames.as_ref().ok_or_else(|| {
            fail(ChunkingError::MissingFrameRange {
                node: job.node.clone(),
            })
        })?;
        let tasks = compute_tasks_for_set(frames, job.params.farm.chunk_policy).map_err(fail)?;
        if let Some(stage) = &job.params.ifd_stage {
            compute_tasks_for_set(frames, stage.chunk_policy).map_err(fail)?;
        }
        job.tasks = tasks;
    }
    Ok(())
}
