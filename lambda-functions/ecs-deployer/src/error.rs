use thiserror::Error;

/// Everything that can go wrong while deploying a new task definition revision.
///
/// Only [`DeployError::ServiceUpdate`] is tolerated by the sequencer; every
/// other variant ends the job with a failure report.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeployError {
    #[error("invalid user parameters: {0}")]
    InvalidParameters(String),

    #[error("failed to describe task definition {name}: {detail}")]
    Fetch { name: String, detail: String },

    #[error("failed to register new revision of {name}: {detail}")]
    Register { name: String, detail: String },

    #[error("failed to update service {service} in cluster {cluster}: {detail}")]
    ServiceUpdate {
        service: String,
        cluster: String,
        detail: String,
    },

    #[error("failed to deregister task definition {revision}: {detail}")]
    Deregister { revision: String, detail: String },

    #[error("failed to report job result for {job_id}: {detail}")]
    Report { job_id: String, detail: String },
}

impl DeployError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ServiceUpdate { .. })
    }
}

/// Renders an adapter error with its whole cause chain on one line.
pub(crate) fn detail(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_service_update_is_non_fatal() {
        let update = DeployError::ServiceUpdate {
            service: "app-svc".to_string(),
            cluster: "app-cluster".to_string(),
            detail: "ServiceNotActiveException".to_string(),
        };
        assert!(!update.is_fatal());

        let deregister = DeployError::Deregister {
            revision: "app-task:6".to_string(),
            detail: "ClientException".to_string(),
        };
        assert!(deregister.is_fatal());
        assert!(DeployError::InvalidParameters("empty".to_string()).is_fatal());
    }

    #[test]
    fn test_messages_carry_detail() {
        let err = DeployError::Fetch {
            name: "app-task".to_string(),
            detail: "Unable to describe task definition.".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("app-task"));
        assert!(message.contains("Unable to describe task definition."));
    }

    #[test]
    fn test_detail_includes_context_chain() {
        let err = anyhow::anyhow!("access denied").context("DescribeTaskDefinition");
        assert_eq!(detail(&err), "DescribeTaskDefinition: access denied");
    }
}
