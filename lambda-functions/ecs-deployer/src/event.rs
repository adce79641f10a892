use crate::error::DeployError;
use serde::{Deserialize, Serialize};

/// Payload CodePipeline sends when it invokes a custom Lambda action.
#[derive(Deserialize, Debug, Clone)]
pub struct JobEvent {
    #[serde(rename = "CodePipeline.job")]
    pub job: PipelineJob,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PipelineJob {
    pub id: String,
    #[serde(default)]
    pub data: JobData,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    #[serde(default)]
    pub action_configuration: ActionConfiguration,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ActionConfiguration {
    #[serde(default)]
    pub configuration: ActionSettings,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ActionSettings {
    // JSON-encoded `UserParameters`
    #[serde(rename = "UserParameters")]
    pub user_parameters: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserParameters {
    #[serde(rename = "TASK_DEFINITION")]
    pub task_definition: String,
    #[serde(rename = "SERVICE_NAME")]
    pub service_name: String,
    #[serde(rename = "CLUSTER_NAME")]
    pub cluster_name: String,
}

impl UserParameters {
    pub fn parse(raw: &str) -> Result<Self, DeployError> {
        let params: Self = serde_json::from_str(raw)
            .map_err(|e| DeployError::InvalidParameters(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), DeployError> {
        let fields = [
            ("TASK_DEFINITION", &self.task_definition),
            ("SERVICE_NAME", &self.service_name),
            ("CLUSTER_NAME", &self.cluster_name),
        ];

        for (key, value) in fields {
            if value.trim().is_empty() {
                return Err(DeployError::InvalidParameters(format!("{} is empty", key)));
            }
        }

        Ok(())
    }
}

impl JobEvent {
    pub fn job_id(&self) -> &str {
        &self.job.id
    }

    pub fn user_parameters(&self) -> Result<UserParameters, DeployError> {
        let raw = self
            .job
            .data
            .action_configuration
            .configuration
            .user_parameters
            .as_deref()
            .ok_or_else(|| {
                DeployError::InvalidParameters("UserParameters is missing".to_string())
            })?;

        UserParameters::parse(raw)
    }
}
