pub mod config;
pub mod deployer;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod registry;
pub mod task_definition;

pub use config::{AwsRegion, DeployerConfig};
pub use deployer::{DeploymentSequencer, DeploymentSummary, DESIRED_COUNT};
pub use error::DeployError;
pub use event::{JobEvent, UserParameters};
pub use pipeline::{CodePipelineNotifier, JobFailure, JobReporter, Outcome, PipelineNotifier};
pub use registry::{EcsRegistry, TaskDefinitionRegistry};
pub use task_definition::{sanitize, RevisionRef, SERVER_ASSIGNED_FIELDS};

use chrono::Utc;
use lambda_runtime::Error;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Response {
    pub status: String,
    pub message: String,
    pub job_id: String,
    pub timestamp: String,
}

impl Response {
    pub fn success(job_id: &str, message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            job_id: job_id.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

pub struct DeployerService<R, N> {
    sequencer: DeploymentSequencer<R>,
    notifier: N,
}

impl DeployerService<EcsRegistry, CodePipelineNotifier> {
    pub async fn new(config: &DeployerConfig) -> Self {
        let registry = EcsRegistry::for_region(&config.workload_region).await;
        let notifier = CodePipelineNotifier::for_region(&config.pipeline_region).await;

        Self::with_clients(registry, notifier)
    }
}

impl<R: TaskDefinitionRegistry, N: PipelineNotifier> DeployerService<R, N> {
    pub fn with_clients(registry: R, notifier: N) -> Self {
        Self {
            sequencer: DeploymentSequencer::new(registry),
            notifier,
        }
    }

    /// Runs one pipeline job and reports its outcome exactly once.
    ///
    /// `request_id` is the Lambda request id, passed to CodePipeline as the
    /// external execution id.
    pub async fn handle_job(&self, event: &JobEvent, request_id: &str) -> Result<Response, Error> {
        let job_id = event.job_id();
        let reporter = JobReporter::new(&self.notifier, job_id, request_id);

        let outcome = match event.user_parameters() {
            Ok(params) => {
                info!("Task Definition: {}", params.task_definition);
                info!("Service Name: {}", params.service_name);
                info!("Cluster Name: {}", params.cluster_name);

                match self.sequencer.run(&params).await {
                    Ok(summary) => Outcome::Success(summary.message()),
                    Err(e) => Outcome::Failure(e.to_string()),
                }
            }
            Err(e) => Outcome::Failure(e.to_string()),
        };

        if outcome.is_success() {
            reporter.report(&outcome).await?;
            return Ok(Response::success(job_id, outcome.message()));
        }

        error!("Job {} failed: {}", job_id, outcome.message());
        if let Err(e) = reporter.report(&outcome).await {
            error!("{}", e);
        }
        Err(Error::from(outcome.message().to_string()))
    }
}
