//! Manual duplicate linking by moderators.

use super::abuse::require_moderator;
use super::update_with_retry;
use crate::error::{ComplaintError, Result};
use crate::models::{Actor, Complaint, ComplaintUpdate};
use crate::store::RecordStore;
use resilience::RetryConfig;
use std::sync::Arc;
use uuid::Uuid;

pub struct DuplicateLinker {
    store: Arc<dyn RecordStore>,
    retry: RetryConfig,
}

impl DuplicateLinker {
    pub fn new(store: Arc<dyn RecordStore>, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    /// Mark `id` as a reviewed duplicate. When given, the original must be a
    /// different, existing complaint.
    pub async fn mark(&self, id: Uuid, original: Option<Uuid>, actor: &Actor) -> Result<Complaint> {
        require_moderator(actor)?;

        if original == Some(id) {
            return Err(ComplaintError::InvalidInput(
                "a complaint cannot duplicate itself".to_string(),
            ));
        }
        self.store.get_complaint(id).await?;
        if let Some(original) = original {
            self.store.get_complaint(original).await?;
        }

        let update = ComplaintUpdate::by(actor.audit_identity()).duplicate(true, original);
        let complaint = update_with_retry(self.store.as_ref(), &self.retry, id, &update).await?;

        tracing::info!(
            complaint_id = %id,
            original = ?original,
            "Complaint marked duplicate"
        );
        Ok(complaint)
    }

    /// Clear the duplicate link together with the reviewed flag.
    pub async fn unmark(&self, id: Uuid, actor: &Actor) -> Result<Complaint> {
        require_moderator(actor)?;

        let update = ComplaintUpdate::by(actor.audit_identity()).duplicate(false, None);
        let complaint = update_with_retry(self.store.as_ref(), &self.retry, id, &update).await?;

        tracing::info!(complaint_id = %id, "Complaint duplicate mark cleared");
        Ok(complaint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Administration, ComplaintDraft, Governorate, NewComplaint};
    use crate::store::InMemoryRecordStore;

    async fn setup() -> (DuplicateLinker, Complaint, Complaint) {
        let store = Arc::new(InMemoryRecordStore::new());
        let mut inserted = Vec::new();
        for description in ["Garbage not collected", "Garbage still there"] {
            let draft = ComplaintDraft::new(
                NewComplaint {
                    submitter_name: "Omar".into(),
                    email: "omar@example.com".into(),
                    governorate: Governorate::Giza,
                    administration: Administration::Cleanliness,
                    description: description.into(),
                    attachments: Default::default(),
                },
                None,
            );
            inserted.push(store.insert_complaint(draft).await.unwrap());
        }
        let second = inserted.pop().unwrap();
        let first = inserted.pop().unwrap();
        (DuplicateLinker::new(store, RetryConfig::none()), first, second)
    }

    #[tokio::test]
    async fn test_mark_and_unmark() {
        let (linker, original, duplicate) = setup().await;
        let moderator = Actor::moderator(Uuid::new_v4());

        let marked = linker
            .mark(duplicate.id, Some(original.id), &moderator)
            .await
            .unwrap();
        assert!(marked.is_duplicate);
        assert!(marked.reviewed);
        assert_eq!(marked.original_complaint_id, Some(original.id));
        assert_eq!(marked.status, duplicate.status);

        let cleared = linker.unmark(duplicate.id, &moderator).await.unwrap();
        assert!(!cleared.is_duplicate);
        assert!(!cleared.reviewed);
        assert_eq!(cleared.original_complaint_id, None);
        assert_eq!(cleared.complaint_id, duplicate.complaint_id);
    }

    #[tokio::test]
    async fn test_original_must_exist_and_differ() {
        let (linker, _, duplicate) = setup().await;
        let moderator = Actor::moderator(Uuid::new_v4());

        assert!(matches!(
            linker.mark(duplicate.id, Some(Uuid::new_v4()), &moderator).await,
            Err(ComplaintError::NotFound(_))
        ));
        assert!(matches!(
            linker.mark(duplicate.id, Some(duplicate.id), &moderator).await,
            Err(ComplaintError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_mark_without_original() {
        let (linker, _, duplicate) = setup().await;
        let marked = linker
            .mark(duplicate.id, None, &Actor::moderator(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(marked.is_duplicate);
        assert_eq!(marked.original_complaint_id, None);
    }

    #[tokio::test]
    async fn test_department_cannot_link() {
        let (linker, original, duplicate) = setup().await;
        let staff = Actor::department(Uuid::new_v4(), Administration::Cleanliness, Governorate::Giza);
        assert!(matches!(
            linker.mark(duplicate.id, Some(original.id), &staff).await,
            Err(ComplaintError::Unauthorized(_))
        ));
    }
}
