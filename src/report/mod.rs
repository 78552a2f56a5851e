//! Host-facing view of a submission: a serializable DTO and the plain-text
//! listing shown in the host's message dialog.

pub mod writer;

use serde::{Deserialize, Serialize};

pub use writer::ReportWriter;

use crate::error::{Severity, ValidationIssue};
use crate::submit::{AbortReason, SubmissionResult, SubmissionState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueDto {
    pub code: String,
    pub severity: String,
    pub message: String,
    pub node: String,
}

impl From<&ValidationIssue> for IssueDto {
    fn from(issue: &ValidationIssue) -> Self {
        IssueDto {
            code: issue.code.clone(),
            severity: issue.severity.to_string(),
            message: issue.message.clone(),
            node: issue.node.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDto {
    pub id: usize,
    pub node: String,
    pub name: String,
    pub frames: Option<String>,
    pub tasks: usize,
    pub dependencies: Vec<usize>,
    pub farm_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDto {
    pub node: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmissionReport {
    Submitted {
        jobs: Vec<JobDto>,
        issues: Vec<IssueDto>,
    },
    PartiallyFailed {
        jobs: Vec<JobDto>,
        issues: Vec<IssueDto>,
        failures: Vec<FailureDto>,
    },
    Preview {
        jobs: Vec<JobDto>,
        issues: Vec<IssueDto>,
    },
    Aborted {
        reason: String,
        issues: Vec<IssueDto>,
    },
}

impl From<&SubmissionResult> for SubmissionReport {
    fn from(result: &SubmissionResult) -> Self {
        let issues: Vec<IssueDto> = result.issues.iter().map(IssueDto::from).collect();
        let jobs = job_dtos(result);

        match result.status {
            SubmissionState::Committed => SubmissionReport::Submitted { jobs, issues },
            SubmissionState::PartiallyFailed => SubmissionReport::PartiallyFailed {
                jobs,
                issues,
                failures: result
                    .failures
                    .iter()
                    .map(|f| FailureDto {
                        node: f.node.clone(),
                        message: f.error.to_string(),
                    })
                    .collect(),
            },
            SubmissionState::Previewed => SubmissionReport::Preview { jobs, issues },
            _ => SubmissionReport::Aborted {
                reason: result.abort.as_ref().map(abort_message).unwrap_or_default(),
                issues,
            },
        }
    }
}

fn job_dtos(result: &SubmissionResult) -> Vec<JobDto> {
    let Some(graph) = &result.graph else {
        return Vec::new();
    };
    graph
        .jobs()
        .iter()
        .map(|job| JobDto {
            id: job.id.0,
            node: job.node.clone(),
            name: job.params.job_name.clone(),
            frames: job.params.frames.as_ref().map(ToString::to_string),
            tasks: job.tasks.len(),
            dependencies: job.dependencies.iter().map(|d| d.0).collect(),
            farm_id: result.farm_job_ids.get(&job.id).map(|id| id.0.clone()),
        })
        .collect()
}

pub fn abort_message(reason: &AbortReason) -> String {
    match reason {
        AbortReason::Graph(e) => e.to_string(),
        AbortReason::Validation => "validation failed".to_string(),
        AbortReason::Chunking { node, error } => format!("{} ({})", error, node),
        AbortReason::Cancelled => "cancelled".to_string(),
    }
}

/// Issues grouped by node, nodes in the order they first appear.
pub fn render_issues(issues: &[ValidationIssue]) -> String {
    let mut w = ReportWriter::new();
    if issues.is_empty() {
        w.line("No problems found");
        return w.finish();
    }

    let errors = issues.iter().filter(|i| i.is_error()).count();
    let warnings = issues.len() - errors;
    w.line(&format!("{} {}, {} {}", errors, plural(errors, "error"), warnings, plural(warnings, "warning")));

    let mut nodes: Vec<&str> = Vec::new();
    for issue in issues {
        if !nodes.contains(&issue.node.as_str()) {
            nodes.push(&issue.node);
        }
    }
    for node in nodes {
        w.blank();
        w.section(node, |w| {
            for issue in issues.iter().filter(|i| i.node == node) {
                let label = match issue.severity {
                    Severity::Error => "ERROR  ",
                    Severity::Warning => "WARNING",
                };
                w.line(&format!("{} [{}] {}", label, issue.code, issue.message));
            }
        });
    }
    w.finish()
}

/// One line per job with its farm ID, followed by failures.
pub fn render_summary(result: &SubmissionResult) -> String {
    let mut w = ReportWriter::new();
    w.line(&format!("Status: {:?}", result.status));
    if let Some(reason) = &result.abort {
        w.line(&format!("Reason: {}", abort_message(reason)));
    }
    for job in job_dtos(result) {
        let farm_id = job.farm_id.as_deref().unwrap_or("-");
        let frames = job.frames.as_deref().unwrap_or("?");
        w.line(&format!("{} {} frames {} in {} tasks -> {}", job.id, job.node, frames, job.tasks, farm_id));
    }
    if !result.failures.is_empty() {
        w.section("Failures:", |w| {
            for failure in &result.failures {
                w.line(&failure.error.to_string());
            }
        });
    }
    w.finish()
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 { word.to_string() } else { format!("{word}s") }
}
