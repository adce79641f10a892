use crate::config::AwsRegion;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ecs::types::TaskDefinition;
use aws_sdk_ecs::Client as EcsClient;
use tracing::info;

#[cfg(test)]
use mockall::automock;

/// The ECS calls a deployment needs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TaskDefinitionRegistry: Send + Sync {
    /// Fetches the latest active revision of `task_definition`.
    async fn describe_task_definition(&self, task_definition: &str) -> Result<TaskDefinition>;

    /// Registers `task_definition` and returns the revision ECS assigned.
    async fn register_task_definition(&self, task_definition: TaskDefinition) -> Result<i32>;

    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        task_definition: &str,
        desired_count: i32,
    ) -> Result<()>;

    async fn deregister_task_definition(&self, task_definition: &str) -> Result<()>;
}

pub struct EcsRegistry {
    client: EcsClient,
}

impl EcsRegistry {
    pub fn new(client: EcsClient) -> Self {
        Self { client }
    }

    pub async fn for_region(region: &AwsRegion) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.as_str().to_string()))
            .load()
            .await;

        info!("ECS client targeting region {}", region);

        Self::new(EcsClient::new(&config))
    }
}

#[async_trait]
impl TaskDefinitionRegistry for EcsRegistry {
    async fn describe_task_definition(&self, task_definition: &str) -> Result<TaskDefinition> {
        let output = self
            .client
            .describe_task_definition()
            .task_definition(task_definition)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?;

        output.task_definition.ok_or_else(|| {
            anyhow!(
                "DescribeTaskDefinition returned no task definition for {}",
                task_definition
            )
        })
    }

    async fn register_task_definition(&self, task_definition: TaskDefinition) -> Result<i32> {
        let family = task_definition.family.clone().unwrap_or_default();

        let output = self
            .client
            .register_task_definition()
            .set_family(task_definition.family)
            .set_task_role_arn(task_definition.task_role_arn)
            .set_execution_role_arn(task_definition.execution_role_arn)
            .set_network_mode(task_definition.network_mode)
            .set_container_definitions(task_definition.container_definitions)
            .set_volumes(task_definition.volumes)
            .set_placement_constraints(task_definition.placement_constraints)
            .set_requires_compatibilities(task_definition.requires_compatibilities)
            .set_cpu(task_definition.cpu)
            .set_memory(task_definition.memory)
            .set_pid_mode(task_definition.pid_mode)
            .set_ipc_mode(task_definition.ipc_mode)
            .set_proxy_configuration(task_definition.proxy_configuration)
            .set_inference_accelerators(task_definition.inference_accelerators)
            .set_ephemeral_storage(task_definition.ephemeral_storage)
            .set_runtime_platform(task_definition.runtime_platform)
            .set_enable_fault_injection(task_definition.enable_fault_injection)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?;

        output
            .task_definition()
            .map(|registered| registered.revision())
            .ok_or_else(|| {
                anyhow!(
                    "RegisterTaskDefinition returned no task definition for {}",
                    family
                )
            })
    }

    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        task_definition: &str,
        desired_count: i32,
    ) -> Result<()> {
        self.client
            .update_service()
            .cluster(cluster)
            .service(service)
            .task_definition(task_definition)
            .desired_count(desired_count)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?;

        Ok(())
    }

    async fn deregister_task_definition(&self, task_definition: &str) -> Result<()> {
        self.client
            .deregister_task_definition()
            .task_definition(task_definition)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_definition::{sanitize, SERVER_ASSIGNED_FIELDS};
    use aws_sdk_ecs::config::{Credentials, Region};
    use aws_sdk_ecs::types::{
        Compatibility, ContainerDefinition, CpuArchitecture, IpcMode, NetworkMode, OsFamily,
        PidMode, ProxyConfiguration, RuntimePlatform, TaskDefinitionPlacementConstraint,
        TaskDefinitionPlacementConstraintType, TaskDefinitionStatus, Volume,
    };
    use aws_smithy_runtime::client::http::test_util::capture_request;

    fn described() -> TaskDefinition {
        TaskDefinition::builder()
            .family("app-task")
            .revision(6)
            .task_definition_arn("arn:aws:ecs:af-south-1:111111111111:task-definition/app-task:6")
            .status(TaskDefinitionStatus::Active)
            .registered_by("arn:aws:iam::111111111111:role/deployer")
            .compatibilities(Compatibility::Fargate)
            .task_role_arn("arn:aws:iam::111111111111:role/appTaskRole")
            .execution_role_arn("arn:aws:iam::111111111111:role/ecsTaskExecutionRole")
            .network_mode(NetworkMode::Awsvpc)
            .container_definitions(
                ContainerDefinition::builder()
                    .name("web")
                    .image("nginx:1.27")
                    .essential(true)
                    .build(),
            )
            .volumes(Volume::builder().name("data").build())
            .placement_constraints(
                TaskDefinitionPlacementConstraint::builder()
                    .r#type(TaskDefinitionPlacementConstraintType::MemberOf)
                    .expression("attribute:ecs.availability-zone in [af-south-1a]")
                    .build(),
            )
            .requires_compatibilities(Compatibility::Fargate)
            .cpu("256")
            .memory("512")
            .pid_mode(PidMode::Task)
            .ipc_mode(IpcMode::Task)
            .proxy_configuration(
                ProxyConfiguration::builder()
                    .container_name("envoy")
                    .build()
                    .unwrap(),
            )
            .runtime_platform(
                RuntimePlatform::builder()
                    .cpu_architecture(CpuArchitecture::Arm64)
                    .operating_system_family(OsFamily::Linux)
                    .build(),
            )
            .enable_fault_injection(true)
            .build()
    }

    #[tokio::test]
    async fn test_register_sends_every_configuration_field() {
        let (http_client, requests) = capture_request(None);
        let config = aws_sdk_ecs::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("af-south-1"))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
            .http_client(http_client)
            .build();
        let registry = EcsRegistry::new(EcsClient::from_conf(config));

        // the canned response carries no task definition, only the request matters here
        let _ = registry.register_task_definition(sanitize(described())).await;

        let request = requests.expect_request();
        let body: serde_json::Value =
            serde_json::from_slice(request.body().bytes().unwrap()).unwrap();

        for field in [
            "family",
            "taskRoleArn",
            "executionRoleArn",
            "networkMode",
            "containerDefinitions",
            "volumes",
            "placementConstraints",
            "requiresCompatibilities",
            "cpu",
            "memory",
            "pidMode",
            "ipcMode",
            "proxyConfiguration",
            "runtimePlatform",
            "enableFaultInjection",
        ] {
            assert!(body.get(field).is_some(), "dropped {} from {}", field, body);
        }
        assert_eq!(body["enableFaultInjection"], true);
        assert_eq!(body["family"], "app-task");

        for field in SERVER_ASSIGNED_FIELDS {
            assert!(body.get(field).is_none(), "sent {} in {}", field, body);
        }
    }
}
