//! Farm clients: the seam between the orchestrator and the render farm.

pub mod deadline;
pub mod virtual_farm;

pub use deadline::DeadlineClient;
pub use virtual_farm::{VirtualFarm, VirtualLog, VirtualSubmission};

pub use crate::job::FarmJobId;

use tracing::info;

use crate::config::{FarmBackend, SubmitterConfig};
use crate::error::{ConfigError, SubmissionError};
use crate::job::JobSpec;

/// Accepts one job at a time and returns the farm's ID for it.
pub trait FarmClient {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// Create the farm job for `job`. `dependencies` are the farm IDs of the
    /// job's in-graph dependencies, already submitted.
    fn submit_job(&mut self, job: &JobSpec, dependencies: &[FarmJobId]) -> Result<FarmJobId, SubmissionError>;
}

/// Create the client the configuration selects.
pub fn connect(config: &SubmitterConfig) -> Result<Box<dyn FarmClient>, ConfigError> {
    let client: Box<dyn FarmClient> = match &config.farm {
        FarmBackend::Virtual => Box::new(VirtualFarm::new()),
        FarmBackend::Deadline { .. } => Box::new(DeadlineClient::from_config(config)?),
    };
    info!(farm = client.name(), "farm client ready");
    Ok(client)
}
