use crate::recorder;
use lambda_runtime::tracing::{self, Instrument, Span};
use model::{ApprovalMessage, NotificationEnvelope, NotificationRecord, ParseError};
use state::{ApprovalStore, StoreError};
use thiserror::Error;

/// Failure of a batch, naming the position of the record that stopped it.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("record {index} failed input validation: {source}")]
    Parse { index: usize, source: ParseError },
    #[error("record {index} could not be stored: {source}")]
    Store { index: usize, source: StoreError },
}

impl IngestError {
    pub fn index(&self) -> usize {
        match self {
            IngestError::Parse { index, .. } | IngestError::Store { index, .. } => *index,
        }
    }
}

/// Parse and record every message in the envelope, in delivery order.
///
/// Stops at the first failure so the whole batch is redelivered; records written
/// before the failure are written again on redelivery.
pub async fn ingest(
    envelope: &NotificationEnvelope,
    store: &dyn ApprovalStore,
) -> Result<usize, IngestError> {
    tracing::info!(
        table_name = store.table_name(),
        "Handling batch of [{}] approval notifications",
        envelope.records.len()
    );

    for (index, record) in envelope.records.iter().enumerate() {
        let record_span: Span = tracing::span!(tracing::Level::INFO, "Approval record", index);

        ingest_record(index, record, store)
            .instrument(record_span)
            .await?;
    }

    Ok(envelope.records.len())
}

async fn ingest_record(
    index: usize,
    record: &NotificationRecord,
    store: &dyn ApprovalStore,
) -> Result<(), IngestError> {
    let message: ApprovalMessage = ApprovalMessage::parse(record.message()).map_err(|err| {
        tracing::error!(
            error_kind = err.kind(),
            error = %err,
            body = record.message(),
            "Event failed input validation"
        );
        IngestError::Parse { index, source: err }
    })?;

    let image_digest: String = message.image_digest().to_string();

    recorder::record(message, store).await.map_err(|err| {
        tracing::error!(
            table_name = store.table_name(),
            image_digest = %image_digest,
            error = %err,
            "Failed to record approval"
        );
        IngestError::Store { index, source: err }
    })?;

    tracing::debug!(image_digest = %image_digest, "Recorded approval");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::operation::put_item::PutItemOutput;
    use aws_smithy_mocks::{Rule, mock, mock_client};
    use model::ApprovalRecord;
    use state_dynamodb::DynamoDbApprovalStore;
    use state_in_memory::InMemoryApprovalStore;
    use test_utils::{TEST_TABLE, approval_message, throttled_put_item};

    fn envelope_of(messages: &[String]) -> NotificationEnvelope {
        NotificationEnvelope {
            records: messages
                .iter()
                .map(|message| NotificationRecord::new(message.as_str()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn records_every_message_in_order() {
        let store: InMemoryApprovalStore = InMemoryApprovalStore::default();
        let envelope: NotificationEnvelope = envelope_of(&[
            approval_message("tok1", "digest=sha256:one"),
            approval_message("tok2", "digest=sha256:two"),
        ]);

        let count: usize = ingest(&envelope, &store).await.expect("Batch should succeed");

        assert_eq!(2, count);
        let second: ApprovalRecord = store
            .get_approval("sha256:two")
            .await
            .expect("Second record should exist");
        assert_eq!("tok2", second.approval_token);
    }

    #[tokio::test]
    async fn empty_envelope_records_nothing() {
        let store: InMemoryApprovalStore = InMemoryApprovalStore::default();

        let count: usize = ingest(&NotificationEnvelope::default(), &store)
            .await
            .expect("Empty batch should succeed");

        assert_eq!(0, count);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn stops_at_first_invalid_message() {
        let store: InMemoryApprovalStore = InMemoryApprovalStore::default();
        let envelope: NotificationEnvelope = envelope_of(&[
            approval_message("tok1", "digest=sha256:one"),
            approval_message("tok2", "noequalsign"),
            approval_message("tok3", "digest=sha256:three"),
        ]);

        let err: IngestError = ingest(&envelope, &store)
            .await
            .expect_err("Batch should fail");

        assert!(matches!(
            err,
            IngestError::Parse {
                index: 1,
                source: ParseError::InvalidCustomData(_)
            }
        ));
        // Only the record before the failure is written
        assert_eq!(1, store.len());
        assert!(store.get_approval("sha256:one").await.is_ok());
        assert!(store.get_approval("sha256:three").await.is_err());
    }

    #[tokio::test]
    async fn stops_at_malformed_json() {
        let store: InMemoryApprovalStore = InMemoryApprovalStore::default();
        let envelope: NotificationEnvelope = envelope_of(&["not json".to_string()]);

        let err: IngestError = ingest(&envelope, &store)
            .await
            .expect_err("Batch should fail");

        assert_eq!(0, err.index());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn stops_at_first_storage_failure() {
        let put_item_rule: Rule = mock!(aws_sdk_dynamodb::Client::put_item)
            .sequence()
            .output(|| PutItemOutput::builder().build())
            .error(throttled_put_item)
            .build();
        let store: DynamoDbApprovalStore = DynamoDbApprovalStore::new(
            mock_client!(aws_sdk_dynamodb, [&put_item_rule]),
            TEST_TABLE,
        );

        let envelope: NotificationEnvelope = envelope_of(&[
            approval_message("tok1", "digest=sha256:one"),
            approval_message("tok2", "digest=sha256:two"),
            approval_message("tok3", "digest=sha256:three"),
        ]);

        let err: IngestError = ingest(&envelope, &store)
            .await
            .expect_err("Batch should fail");

        assert!(matches!(err, IngestError::Store { index: 1, .. }));
        // The third record never reaches the table
        assert_eq!(2, put_item_rule.num_calls());
    }
}
