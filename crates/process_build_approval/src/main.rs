use aws_config::BehaviorVersion;
use aws_lambda_events::sns::SnsEvent;
use ingest::telemetry::init_subscriber;
use ingest::{IngestSummary, approval_fn};
use lambda_runtime::{LambdaEvent, service_fn, tracing};
use model::Error;
use model::env::EnvVars;
use state_dynamodb::DynamoDbApprovalStore;

/// Records pipeline approval notifications from SNS into the approvals table.
#[tokio::main]
async fn main() -> Result<(), Error> {
    // Invalid configuration fails the cold start, before any event is accepted
    let env_vars: EnvVars = EnvVars::from_env()?;
    init_subscriber(env_vars.log_level)?;

    tracing::info!(
        table_name = %env_vars.table_name,
        service = %env_vars.service_name,
        "Starting approval function"
    );

    let dynamodb_client: aws_sdk_dynamodb::Client =
        aws_sdk_dynamodb::Client::new(&aws_config::load_defaults(BehaviorVersion::latest()).await);
    let store: DynamoDbApprovalStore =
        DynamoDbApprovalStore::new(dynamodb_client, env_vars.table_name.as_str());

    let (env_vars, store) = (&env_vars, &store);

    lambda_runtime::run(service_fn(
        move |event: LambdaEvent<SnsEvent>| async move {
            let summary: IngestSummary = approval_fn(env_vars, store, event).await?;

            Ok::<IngestSummary, Error>(summary)
        },
    ))
    .await
}
