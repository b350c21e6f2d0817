pub mod abuse;
pub mod complaint_service;
pub mod duplicates;
pub mod lifecycle;
pub mod visibility;

pub use abuse::{AbuseEscalationEngine, AbusePolicy, FailurePolicy, BAN_THRESHOLD};
pub use complaint_service::{AccountOverview, ComplaintService, SubmissionReceipt};
pub use duplicates::DuplicateLinker;
pub use lifecycle::LifecycleService;
pub use visibility::{read_scope, write_scope, FieldMatch, ReadScope, WriteScope};

use crate::error::{ComplaintError, Result};
use crate::models::{Complaint, ComplaintUpdate};
use crate::store::RecordStore;
use resilience::{with_retry_if, RetryConfig};
use uuid::Uuid;

/// Apply an idempotent complaint update, retrying transient store failures.
pub(crate) async fn update_with_retry(
    store: &dyn RecordStore,
    retry: &RetryConfig,
    id: Uuid,
    update: &ComplaintUpdate,
) -> Result<Complaint> {
    with_retry_if(retry.clone(), ComplaintError::is_transient, move || {
        store.update_complaint(id, update)
    })
    .await
    .map_err(|e| e.into_inner())
}
