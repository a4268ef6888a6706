use aws_lambda_events::sns::SnsEvent;
use lambda_runtime::tracing::{Instrument, Span};
use lambda_runtime::{Context, LambdaEvent, tracing};
use model::env::EnvVars;
use model::{Error, NotificationEnvelope};
use serde::Serialize;
use state::ApprovalStore;

mod batch_handler;
pub mod recorder;
pub mod telemetry;

pub use batch_handler::{IngestError, ingest};

/// Name of the counter incremented with each recorded approval.
pub const APPROVALS_RECORDED: &str = "approvals_recorded";

/// Returned to the runtime when every record in the batch was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub records: usize,
}

/// Handle one SNS delivery of pipeline approval notifications.
///
/// Designed for use with `lambda_runtime::run()`, with configuration and the store
/// built once at start-up and shared across invocations.
/// Any error fails the whole invocation so SNS redelivers the batch.
///
/// ```no_compile
/// let env_vars: EnvVars = EnvVars::from_env()?;
/// let store: DynamoDbApprovalStore = DynamoDbApprovalStore::new(client, &env_vars.table_name);
///
/// let (env_vars, store) = (&env_vars, &store);
/// lambda_runtime::run(service_fn(move |event: LambdaEvent<SnsEvent>| async move {
///     approval_fn(env_vars, store, event).await
/// }))
/// .await
/// ```
pub async fn approval_fn(
    env_vars: &EnvVars,
    store: &dyn ApprovalStore,
    event: LambdaEvent<SnsEvent>,
) -> Result<IngestSummary, Error> {
    let (payload, context): (SnsEvent, Context) = event.into_parts();

    let request_id: &str = &context.request_id;
    let invocation_span: Span = tracing::span!(
        tracing::Level::INFO,
        "Approval handler",
        request_id,
        service = %env_vars.service_name
    );

    async move {
        tracing::debug!(event = ?payload, "Received approval notification");

        let envelope: NotificationEnvelope = payload.into();
        let records: usize = ingest(&envelope, store).await?;

        metrics::counter!(APPROVALS_RECORDED, "service" => env_vars.service_name.clone())
            .increment(records as u64);
        tracing::info!(records, "Finishing approval handler");

        Ok(IngestSummary { records })
    }
    .instrument(invocation_span)
    .await
}
