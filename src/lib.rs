pub mod build;
pub mod chunk;
pub mod config;
pub mod error;
pub mod farm;
pub mod job;
pub mod report;
pub mod scene;
pub mod submit;
pub mod validate;

pub use build::{BuiltGraph, build_graph};
pub use chunk::{ChunkPolicy, FrameRange, FrameSet, TaskSpec, compute_tasks, compute_tasks_for_set};
pub use config::SubmitterConfig;
pub use error::{ChunkingError, ConfigError, GraphError, Severity, SubmissionError, ValidationIssue};
pub use job::{FarmJobId, JobId, JobSpec, SubmissionGraph, TraversalMode};
pub use scene::{NodeAdapter, NodeKind, ParamValue, Scene};
pub use submit::{CancelToken, SubmissionResult, SubmissionState, Submitter};
