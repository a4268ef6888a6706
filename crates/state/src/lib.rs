use async_trait::async_trait;
use model::{ApprovalRecord, Error};
use std::fmt::{Debug, Display, Formatter};
use thiserror::Error;

/// Handle to the table holding approval records, keyed by image digest.
///
/// Implementations are stateless apart from their client and table name,
/// so one handle can be shared across invocations.
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    fn table_name(&self) -> &str;

    /// Unconditionally write the record, replacing any record with the same digest.
    async fn put_approval(&self, record: ApprovalRecord) -> Result<(), StoreError>;
    async fn get_approval(&self, image_digest: &str) -> Result<ApprovalRecord, StoreError>;
    async fn delete_approval(&self, image_digest: &str) -> Result<(), StoreError>;
}

/// Errors arising from reading or writing approval records.
#[derive(Debug, Error)]
#[error("{operation} of {image_digest} in table {table_name} failed: {reason}")]
pub struct StoreError {
    pub image_digest: String,
    pub table_name: String,

    pub operation: StoreOperation,
    pub reason: StoreErrorReason,
}

#[derive(Debug)]
pub enum StoreErrorReason {
    // No record exists for the digest.
    MissingEntry,
    // The stored item couldn't be converted to or from a record
    BadItem(String),
    // An error from the underlying store
    BackendFailure(Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    PutApproval,
    GetApproval,
    DeleteApproval,
}

impl StoreError {
    pub fn new(
        image_digest: impl Into<String>,
        table_name: impl Into<String>,
        operation: StoreOperation,
        reason: StoreErrorReason,
    ) -> Self {
        StoreError {
            image_digest: image_digest.into(),
            table_name: table_name.into(),
            operation,
            reason,
        }
    }

    pub fn is_missing_entry(&self) -> bool {
        matches!(self.reason, StoreErrorReason::MissingEntry)
    }
}

impl Display for StoreOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl Display for StoreErrorReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreErrorReason::MissingEntry => f.write_str("no such entry"),
            StoreErrorReason::BadItem(reason) => write!(f, "bad item: {reason}"),
            StoreErrorReason::BackendFailure(err) => write!(f, "backend failure: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_names_table_and_digest() {
        let err: StoreError = StoreError::new(
            "sha256:abc",
            "approvals",
            StoreOperation::PutApproval,
            StoreErrorReason::BadItem("not a map".to_string()),
        );

        assert_eq!(
            "PutApproval of sha256:abc in table approvals failed: bad item: not a map",
            err.to_string()
        );
        assert!(!err.is_missing_entry());
    }
}
