use crate::error::{self, DeployError};
use crate::event::UserParameters;
use crate::registry::TaskDefinitionRegistry;
use crate::task_definition::{sanitize, server_assigned_fields, RevisionRef};
use tracing::{error, info, warn};

/// Running task count requested for the service after every deployment.
pub const DESIRED_COUNT: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSummary {
    pub new_revision: RevisionRef,
    /// `None` when the new revision is the first one of its family.
    pub previous_revision: Option<RevisionRef>,
    pub service_updated: bool,
}

impl DeploymentSummary {
    pub fn message(&self) -> String {
        match &self.previous_revision {
            Some(previous) => format!(
                "Successfully deregistered previous task definition: {}",
                previous
            ),
            None => format!(
                "Registered first revision {}; no previous revision to deregister",
                self.new_revision
            ),
        }
    }
}

/// Rolls a service onto a fresh copy of its task definition.
///
/// The steps run strictly one after another: describe, register, update the
/// service, deregister the previous revision. A failed service update is
/// logged and skipped; any other failure stops the sequence.
pub struct DeploymentSequencer<R> {
    registry: R,
}

impl<R: TaskDefinitionRegistry> DeploymentSequencer<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub async fn run(&self, params: &UserParameters) -> Result<DeploymentSummary, DeployError> {
        let name = params.task_definition.as_str();

        info!("Creating new task definition revision from: {}", name);
        let current = self
            .registry
            .describe_task_definition(name)
            .await
            .map_err(|e| {
                error!("DescribeTaskDefinition failed for {}: {:#}", name, e);
                DeployError::Fetch {
                    name: name.to_string(),
                    detail: error::detail(&e),
                }
            })?;
        info!("Successfully fetched latest task definition");

        let stripped = server_assigned_fields(&current);
        let document = sanitize(current);
        info!("Removed server-assigned fields: {:?}", stripped);

        let assigned = self
            .registry
            .register_task_definition(document)
            .await
            .map_err(|e| {
                error!("RegisterTaskDefinition failed for {}: {:#}", name, e);
                DeployError::Register {
                    name: name.to_string(),
                    detail: error::detail(&e),
                }
            })?;

        let new_revision = RevisionRef::new(name, assigned);
        info!("Successfully registered new task definition: {}", new_revision);

        let service_updated = match self.update_service(params, &new_revision).await {
            Ok(()) => true,
            Err(e) if !e.is_fatal() => {
                warn!("{}; continuing with deregistration", e);
                false
            }
            Err(e) => return Err(e),
        };

        let previous_revision = new_revision.previous();
        match &previous_revision {
            Some(previous) => self.deregister(previous).await?,
            None => warn!(
                "{} is the first revision, nothing to deregister",
                new_revision
            ),
        }

        let summary = DeploymentSummary {
            new_revision,
            previous_revision,
            service_updated,
        };
        info!("{}", summary.message());

        Ok(summary)
    }

    async fn update_service(
        &self,
        params: &UserParameters,
        revision: &RevisionRef,
    ) -> Result<(), DeployError> {
        let task_definition = revision.to_string();

        self.registry
            .update_service(
                &params.cluster_name,
                &params.service_name,
                &task_definition,
                DESIRED_COUNT,
            )
            .await
            .map_err(|e| DeployError::ServiceUpdate {
                service: params.service_name.clone(),
                cluster: params.cluster_name.clone(),
                detail: error::detail(&e),
            })?;

        info!(
            "Successfully updated service {} to {}",
            params.service_name, task_definition
        );
        Ok(())
    }

    async fn deregister(&self, revision: &RevisionRef) -> Result<(), DeployError> {
        let task_definition = revision.to_string();

        self.registry
            .deregister_task_definition(&task_definition)
            .await
            .map_err(|e| {
                error!("DeregisterTaskDefinition failed for {}: {:#}", task_definition, e);
                DeployError::Deregister {
                    revision: task_definition,
                    detail: error::detail(&e),
                }
            })
    }
}
