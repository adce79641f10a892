use ecs_deployer::{
    CodePipelineNotifier, DeployerConfig, DeployerService, EcsRegistry, JobEvent, Response,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

type Service = DeployerService<EcsRegistry, CodePipelineNotifier>;

async fn function_handler(service: &Service, event: LambdaEvent<JobEvent>) -> Result<Response, Error> {
    service
        .handle_job(&event.payload, &event.context.request_id)
        .await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let config = DeployerConfig::from_env();
    let service = DeployerService::new(&config).await;
    let service = &service;

    run(service_fn(move |event: LambdaEvent<JobEvent>| async move {
        function_handler(service, event).await
    }))
    .await
}
