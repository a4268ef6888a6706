use async_trait::async_trait;
use model::ApprovalRecord;
use state::StoreErrorReason::MissingEntry;
use state::StoreOperation::GetApproval;
use state::{ApprovalStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// An approval table held in process memory, for tests and local runs.
#[derive(Clone)]
pub struct InMemoryApprovalStore {
    table_name: String,
    records: Arc<Mutex<HashMap<String, ApprovalRecord>>>,
}

impl InMemoryApprovalStore {
    pub fn new(table_name: impl Into<String>) -> Self {
        InMemoryApprovalStore {
            table_name: table_name.into(),
            records: Arc::new(Mutex::new(Default::default())),
        }
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ApprovalRecord>> {
        // A panic while holding the lock can't leave a map half written
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryApprovalStore {
    fn default() -> Self {
        InMemoryApprovalStore::new("approvals")
    }
}

#[async_trait]
impl ApprovalStore for InMemoryApprovalStore {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn put_approval(&self, record: ApprovalRecord) -> Result<(), StoreError> {
        self.lock().insert(record.image_digest.clone(), record);

        Ok(())
    }

    async fn get_approval(&self, image_digest: &str) -> Result<ApprovalRecord, StoreError> {
        self.lock()
            .get(image_digest)
            .cloned()
            .ok_or_else(|| StoreError::new(image_digest, &self.table_name, GetApproval, MissingEntry))
    }

    async fn delete_approval(&self, image_digest: &str) -> Result<(), StoreError> {
        self.lock().remove(image_digest);

        Ok(())
    }
}
