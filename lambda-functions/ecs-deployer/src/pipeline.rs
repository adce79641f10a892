//! Job result reporting back to CodePipeline.

use crate::config::AwsRegion;
use crate::error::{self, DeployError};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_codepipeline::error::DisplayErrorContext;
use aws_sdk_codepipeline::types::{ExecutionDetails, FailureDetails, FailureType};
use aws_sdk_codepipeline::Client as CodePipelineClient;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

#[cfg(test)]
use mockall::automock;

pub const JOB_FAILED: &str = "JobFailed";

// CodePipeline length limits
const MAX_SUMMARY_CHARS: usize = 2048;
const MAX_FAILURE_MESSAGE_CHARS: usize = 5000;

/// Terminal state of one pipeline job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(String),
}

impl Outcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) | Self::Failure(message) => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobFailure {
    pub message: String,
    #[serde(rename = "type")]
    pub failure_type: String,
    pub external_execution_id: String,
}

impl JobFailure {
    pub fn new(message: impl Into<String>, external_execution_id: impl Into<String>) -> Self {
        Self {
            message: truncate(&message.into(), MAX_FAILURE_MESSAGE_CHARS),
            failure_type: JOB_FAILED.to_string(),
            external_execution_id: external_execution_id.into(),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait PipelineNotifier: Send + Sync {
    async fn put_job_success(
        &self,
        job_id: &str,
        summary: &str,
        external_execution_id: &str,
    ) -> Result<()>;

    async fn put_job_failure(&self, job_id: &str, failure: &JobFailure) -> Result<()>;
}

pub struct CodePipelineNotifier {
    client: CodePipelineClient,
}

impl CodePipelineNotifier {
    pub fn new(client: CodePipelineClient) -> Self {
        Self { client }
    }

    pub async fn for_region(region: &AwsRegion) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.as_str().to_string()))
            .load()
            .await;

        info!("CodePipeline client targeting region {}", region);

        Self::new(CodePipelineClient::new(&config))
    }
}

#[async_trait]
impl PipelineNotifier for CodePipelineNotifier {
    async fn put_job_success(
        &self,
        job_id: &str,
        summary: &str,
        external_execution_id: &str,
    ) -> Result<()> {
        let details = execution_details(summary, external_execution_id);

        self.client
            .put_job_success_result()
            .job_id(job_id)
            .execution_details(details)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?;

        Ok(())
    }

    async fn put_job_failure(&self, job_id: &str, failure: &JobFailure) -> Result<()> {
        let details = failure_details(failure)?;

        self.client
            .put_job_failure_result()
            .job_id(job_id)
            .failure_details(details)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?;

        Ok(())
    }
}

/// Sends the result of one job. Only the first call to [`JobReporter::report`]
/// reaches CodePipeline; later calls are dropped.
pub struct JobReporter<'a, N> {
    notifier: &'a N,
    job_id: String,
    execution_id: String,
    reported: AtomicBool,
}

impl<'a, N: PipelineNotifier> JobReporter<'a, N> {
    pub fn new(notifier: &'a N, job_id: impl Into<String>, execution_id: impl Into<String>) -> Self {
        Self {
            notifier,
            job_id: job_id.into(),
            execution_id: execution_id.into(),
            reported: AtomicBool::new(false),
        }
    }

    /// Returns `Ok(true)` when this call sent the report and `Ok(false)` when
    /// an earlier call already had.
    pub async fn report(&self, outcome: &Outcome) -> Result<bool, DeployError> {
        if self.reported.swap(true, Ordering::SeqCst) {
            warn!(
                "Job {} already reported, dropping outcome: {:?}",
                self.job_id, outcome
            );
            return Ok(false);
        }

        let result = match outcome {
            Outcome::Success(message) => {
                info!("Reporting success for job {}", self.job_id);
                self.notifier
                    .put_job_success(&self.job_id, message, &self.execution_id)
                    .await
            }
            Outcome::Failure(message) => {
                info!("Reporting failure for job {}", self.job_id);
                let failure = JobFailure::new(message.as_str(), self.execution_id.as_str());
                self.notifier.put_job_failure(&self.job_id, &failure).await
            }
        };

        result.map(|_| true).map_err(|e| {
            error!("Failed to report result for job {}: {:#}", self.job_id, e);
            DeployError::Report {
                job_id: self.job_id.clone(),
                detail: error::detail(&e),
            }
        })
    }
}

fn execution_details(summary: &str, external_execution_id: &str) -> ExecutionDetails {
    ExecutionDetails::builder()
        .summary(truncate(summary, MAX_SUMMARY_CHARS))
        .set_external_execution_id(non_empty(external_execution_id))
        .build()
}

fn failure_details(failure: &JobFailure) -> Result<FailureDetails> {
    let details = FailureDetails::builder()
        .r#type(FailureType::from(failure.failure_type.as_str()))
        .message(&failure.message)
        .set_external_execution_id(non_empty(&failure.external_execution_id))
        .build()?;

    Ok(details)
}

fn truncate(message: &str, max_chars: usize) -> String {
    message.chars().take(max_chars).collect()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
