use async_trait::async_trait;
use aws_sdk_dynamodb::config::http::HttpResponse;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::delete_item::{DeleteItemError, DeleteItemOutput};
use aws_sdk_dynamodb::operation::get_item::{GetItemError, GetItemOutput};
use aws_sdk_dynamodb::operation::put_item::{PutItemError, PutItemOutput};
use aws_sdk_dynamodb::types::AttributeValue;
use lambda_runtime::tracing;
use model::ApprovalRecord;
use model::approval::IMAGE_DIGEST;
use state::StoreErrorReason::{BackendFailure, BadItem, MissingEntry};
use state::StoreOperation::{DeleteApproval, GetApproval, PutApproval};
use state::{ApprovalStore, StoreError};
use std::collections::HashMap;

/// Approval records in a DynamoDB table with `ImageDigest` as its partition key.
#[derive(Clone)]
pub struct DynamoDbApprovalStore {
    table_name: String,
    dynamodb_client: aws_sdk_dynamodb::Client,
    consistent_read: bool,
}

impl DynamoDbApprovalStore {
    pub fn new(dynamodb_client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        DynamoDbApprovalStore {
            table_name: table_name.into(),
            dynamodb_client,
            consistent_read: false,
        }
    }

    /// Use strongly consistent reads for lookups.
    pub fn with_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }
}

#[async_trait]
impl ApprovalStore for DynamoDbApprovalStore {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn put_approval(&self, record: ApprovalRecord) -> Result<(), StoreError> {
        let image_digest: &str = &record.image_digest;

        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(&record)
            .map_err(|err| self.error(image_digest, PutApproval, BadItem(err.to_string())))?;

        match self.put_item(item).await {
            Ok(_) => {
                tracing::info!(table_name = %self.table_name, image_digest, "Put item into table");
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    table_name = %self.table_name,
                    image_digest,
                    error = %DisplayErrorContext(&err),
                    "Failed to put item into table"
                );
                Err(self.error(image_digest, PutApproval, BackendFailure(err.into())))
            }
        }
    }

    async fn get_approval(&self, image_digest: &str) -> Result<ApprovalRecord, StoreError> {
        let output: GetItemOutput = self.get_item(image_digest).await.map_err(|err| {
            tracing::error!(
                table_name = %self.table_name,
                image_digest,
                error = %DisplayErrorContext(&err),
                "Failed to get item from table"
            );
            self.error(image_digest, GetApproval, BackendFailure(err.into()))
        })?;

        let item: HashMap<String, AttributeValue> = output
            .item
            .ok_or_else(|| self.error(image_digest, GetApproval, MissingEntry))?;

        tracing::debug!(table_name = %self.table_name, image_digest, "Got item from table");

        serde_dynamo::from_item(item)
            .map_err(|err| self.error(image_digest, GetApproval, BadItem(err.to_string())))
    }

    async fn delete_approval(&self, image_digest: &str) -> Result<(), StoreError> {
        self.delete_item(image_digest).await.map_err(|err| {
            tracing::error!(
                table_name = %self.table_name,
                image_digest,
                error = %DisplayErrorContext(&err),
                "Failed to delete item from table"
            );
            self.error(image_digest, DeleteApproval, BackendFailure(err.into()))
        })?;

        tracing::info!(table_name = %self.table_name, image_digest, "Deleted item in table");

        Ok(())
    }
}

impl DynamoDbApprovalStore {
    fn key(image_digest: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([(
            IMAGE_DIGEST.to_string(),
            AttributeValue::S(image_digest.to_string()),
        )])
    }

    fn error(
        &self,
        image_digest: &str,
        operation: state::StoreOperation,
        reason: state::StoreErrorReason,
    ) -> StoreError {
        StoreError::new(image_digest, self.table_name.as_str(), operation, reason)
    }

    async fn get_item(
        &self,
        image_digest: &str,
    ) -> Result<GetItemOutput, SdkError<GetItemError, HttpResponse>> {
        self.dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .consistent_read(self.consistent_read)
            .set_key(Some(Self::key(image_digest)))
            .send()
            .await
    }

    async fn put_item(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> Result<PutItemOutput, SdkError<PutItemError, HttpResponse>> {
        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
    }

    async fn delete_item(
        &self,
        image_digest: &str,
    ) -> Result<DeleteItemOutput, SdkError<DeleteItemError, HttpResponse>> {
        self.dynamodb_client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(image_digest)))
            .send()
            .await
    }
}
