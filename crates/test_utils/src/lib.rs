use aws_lambda_events::sns::SnsEvent;
use aws_sdk_dynamodb::operation::put_item::{PutItemError, PutItemOutput};
use aws_sdk_dynamodb::types::error::ProvisionedThroughputExceededException;
use aws_smithy_mocks::{Rule, mock, mock_client};
use model::ApprovalRecord;
use model::env::{DYNAMO_DB_TABLE_NAME, EnvVars, LOG_LEVEL, LogLevel, POWERTOOLS_SERVICE_NAME};
use serde_json::{Value, json};
use std::env;

/// Test configuration values
pub const TEST_TABLE: &str = "approvals_table";
pub const TEST_SERVICE: &str = "process_build_approval";

/// Setup default environment variables used in testing
pub fn setup_default_env() {
    unsafe {
        env::set_var(DYNAMO_DB_TABLE_NAME, TEST_TABLE);
        env::set_var(LOG_LEVEL, "DEBUG");
        env::set_var(POWERTOOLS_SERVICE_NAME, TEST_SERVICE);
    }
}

/// Configuration matching `setup_default_env`, without touching the environment.
pub fn test_env_vars() -> EnvVars {
    EnvVars {
        table_name: TEST_TABLE.to_string(),
        log_level: LogLevel::Debug,
        service_name: TEST_SERVICE.to_string(),
    }
}

/// The JSON message body the pipeline publishes for a pending manual approval.
pub fn approval_message(token: &str, custom_data: &str) -> String {
    json!({
        "region": "eu-west-1",
        "consoleLink": "https://console.aws.amazon.com/codepipeline",
        "approval": {
            "pipelineName": "p1",
            "stageName": "Approve",
            "actionName": "Manual",
            "token": token,
            "expires": "2024-05-08T10:00Z",
            "customData": custom_data,
        }
    })
    .to_string()
}

/// A stored record for the digest with fixed field values.
pub fn approval_record(image_digest: &str) -> ApprovalRecord {
    ApprovalRecord {
        image_digest: image_digest.to_string(),
        approval_token: "tok1".to_string(),
        pipeline_name: "p1".to_string(),
        stage: "Approve".to_string(),
        action_name: "Manual".to_string(),
        insert_date: "2024-05-01T10:00:00.000000+00:00".to_string(),
    }
}

/// An SNS Lambda event carrying one record per message, in order.
pub fn sns_event_with_messages<T: AsRef<str>>(messages: &[T]) -> SnsEvent {
    let records: Vec<Value> = messages
        .iter()
        .enumerate()
        .map(|(idx, message)| {
            json!({
                "EventVersion": "1.0",
                "EventSubscriptionArn": "arn:aws:sns:eu-west-1:123456789012:container_approval_topic:2bcfbf39",
                "EventSource": "aws:sns",
                "Sns": {
                    "SignatureVersion": "1",
                    "Timestamp": "2024-05-01T10:00:00.000Z",
                    "Signature": "EXAMPLE",
                    "SigningCertUrl": "EXAMPLE",
                    "MessageId": format!("95df01b4-ee98-5cb9-9903-4c221d41eb{idx:02}"),
                    "Message": message.as_ref(),
                    "MessageAttributes": {},
                    "Type": "Notification",
                    "UnsubscribeUrl": "EXAMPLE",
                    "TopicArn": "arn:aws:sns:eu-west-1:123456789012:container_approval_topic",
                    "Subject": "APPROVAL NEEDED",
                }
            })
        })
        .collect();

    serde_json::from_value(json!({ "Records": records })).expect("Test SNS event should be valid")
}

/// A mock DynamoDB client which throttles every put
pub fn throttled_put_item_client() -> aws_sdk_dynamodb::Client {
    let put_item_rule: Rule = mock!(aws_sdk_dynamodb::Client::put_item)
        .sequence()
        .error(throttled_put_item)
        .repeatedly()
        .build();

    mock_client!(aws_sdk_dynamodb, [&put_item_rule])
}

pub fn throttled_put_item() -> PutItemError {
    PutItemError::ProvisionedThroughputExceededException(
        ProvisionedThroughputExceededException::builder()
            .message("Rate of requests exceeds the allowed throughput")
            .build(),
    )
}
