//! Error and issue types shared across all submission phases.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warning"),
        }
    }
}

/// A data-quality problem found on a node. Recoverable by the user editing
/// the node, so it is collected rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    /// Path of the offending node.
    pub node: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {} (node '{}')",
            self.severity, self.code, self.message, self.node
        )
    }
}

impl ValidationIssue {
    pub fn error(code: &str, message: impl Into<String>, node: &str) -> Self {
        ValidationIssue {
            code: code.into(),
            severity: Severity::Error,
            message: message.into(),
            node: node.into(),
        }
    }

    pub fn warning(code: &str, message: impl Into<String>, node: &str) -> Self {
        ValidationIssue {
            code: code.into(),
            severity: Severity::Warning,
            message: message.into(),
            node: node.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// True if any issue in the list blocks submission.
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(ValidationIssue::is_error)
}

/// Structural failure while building the submission graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("node '{node}' does not exist")]
    UnknownNode { node: String },

    #[error("node '{node}' has unsupported type '{type_name}'")]
    UnsupportedSeed { node: String, type_name: String },

    #[error("cycle detected at node '{node}'")]
    Cycle { node: String },
}

/// Invalid chunking policy or frame range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkingError {
    #[error("chunk count must be positive, got {count}")]
    NonPositiveChunkCount { count: i64 },

    #[error("frames per chunk must be positive, got {frames}")]
    NonPositiveChunkSize { frames: i64 },

    #[error("invalid frame range {start}-{end}:{step}")]
    InvalidFrameRange { start: i64, end: i64, step: i64 },

    #[error("job for node '{node}' has no frame range")]
    MissingFrameRange { node: String },
}

/// Failure reported for a single job during the Submitting phase.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("farm rejected job for '{node}': {message}")]
    Farm { node: String, message: String },

    #[error("i/o error while submitting '{node}': {message}")]
    Io { node: String, message: String },

    #[error("job for '{node}' not sent: dependency '{dependency}' was not submitted")]
    DependencyNotSubmitted { node: String, dependency: String },
}

/// A frame string the farm's range syntax cannot express.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid frame range '{spec}'")]
pub struct FrameParseError {
    pub spec: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("failed to parse scene JSON: {0}")]
    Parse(String),

    #[error("node '{path}' is declared more than once")]
    DuplicateNode { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to read '{path}': {message}")]
    Io { path: String, message: String },

    #[error("unknown node kind '{kind}' in rule table")]
    UnknownKind { kind: String },

    #[error("unknown rule '{rule}' listed for kind '{kind}'")]
    UnknownRule { kind: String, rule: String },

    #[error("farm unavailable: {message}")]
    FarmUnavailable { message: String },
}
