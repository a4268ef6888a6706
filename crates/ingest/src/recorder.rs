use chrono::{DateTime, SecondsFormat, Utc};
use model::{ApprovalMessage, ApprovalRecord};
use state::{ApprovalStore, StoreError};

/// Write one approval record for the message, stamped with the current UTC time.
pub async fn record(message: ApprovalMessage, store: &dyn ApprovalStore) -> Result<(), StoreError> {
    record_at(message, store, Utc::now()).await
}

/// Write one approval record for the message, stamped with `now`.
///
/// The write is a plain put keyed by image digest: redelivery of the same message
/// replaces the earlier record and moves its `InsertDate` forward.
pub async fn record_at(
    message: ApprovalMessage,
    store: &dyn ApprovalStore,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let insert_date: String = now.to_rfc3339_opts(SecondsFormat::Micros, false);

    store
        .put_approval(ApprovalRecord::new(message, insert_date))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use state_in_memory::InMemoryApprovalStore;
    use test_utils::approval_message;

    fn parsed(custom_data: &str) -> ApprovalMessage {
        ApprovalMessage::parse(&approval_message("tok1", custom_data))
            .expect("Test approval should parse")
    }

    #[tokio::test]
    async fn records_message_fields_under_digest() {
        let store: InMemoryApprovalStore = InMemoryApprovalStore::default();
        let now: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

        record_at(parsed("imageDigest=sha256:abc123"), &store, now)
            .await
            .expect("Record should succeed");

        let stored: ApprovalRecord = store
            .get_approval("sha256:abc123")
            .await
            .expect("Record should exist");

        assert_eq!(
            ApprovalRecord {
                image_digest: "sha256:abc123".to_string(),
                approval_token: "tok1".to_string(),
                pipeline_name: "p1".to_string(),
                stage: "Approve".to_string(),
                action_name: "Manual".to_string(),
                insert_date: "2024-05-01T10:00:00.000000+00:00".to_string(),
            },
            stored
        );
    }

    #[tokio::test]
    async fn redelivery_replaces_record_with_latest_insert_date() {
        let store: InMemoryApprovalStore = InMemoryApprovalStore::default();
        let first: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let second: DateTime<Utc> = first + Duration::seconds(30);

        record_at(parsed("digest=sha256:abc"), &store, first)
            .await
            .expect("First record should succeed");
        record_at(parsed("digest=sha256:abc"), &store, second)
            .await
            .expect("Second record should succeed");

        let stored: ApprovalRecord = store
            .get_approval("sha256:abc")
            .await
            .expect("Record should exist");

        assert_eq!(1, store.len());
        assert_eq!("2024-05-01T10:00:30.000000+00:00", stored.insert_date);
    }

    #[tokio::test]
    async fn stamps_current_time() {
        let store: InMemoryApprovalStore = InMemoryApprovalStore::default();
        let before: DateTime<Utc> = Utc::now();

        record(parsed("digest=sha256:now"), &store)
            .await
            .expect("Record should succeed");

        let stored: ApprovalRecord = store
            .get_approval("sha256:now")
            .await
            .expect("Record should exist");
        let insert_date: DateTime<Utc> = DateTime::parse_from_rfc3339(&stored.insert_date)
            .expect("Insert date should be RFC 3339")
            .with_timezone(&Utc);

        assert!(stored.insert_date.ends_with("+00:00"));
        assert!(insert_date >= before - Duration::milliseconds(1));
        assert!(insert_date <= Utc::now());
    }
}
