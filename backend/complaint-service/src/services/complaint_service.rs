use super::abuse::{require_moderator, AbuseEscalationEngine, AbusePolicy};
use super::duplicates::DuplicateLinker;
use super::lifecycle::LifecycleService;
use super::update_with_retry;
use super::visibility::{read_scope, FieldMatch};
use crate::classifier::AbuseClassifier;
use crate::error::{ComplaintError, Result};
use crate::metrics;
use crate::models::{
    AbuseAttempt, AbuseSource, Actor, BanRecord, Complaint, ComplaintDraft, ComplaintStatus,
    ComplaintUpdate, NewComplaint, Role, Submitter, SubmitterAccount,
};
use crate::store::RecordStore;
use resilience::RetryConfig;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const MAX_DESCRIPTION_LEN: usize = 10_000;

/// Returned to the citizen after a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub complaint_id: String,
}

/// Moderator view of one submitter account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverview {
    pub account: SubmitterAccount,
    pub abuse_attempts: Vec<AbuseAttempt>,
    pub bans: Vec<BanRecord>,
}

/// Entry point for every complaint operation. The actor is always passed in.
pub struct ComplaintService {
    store: Arc<dyn RecordStore>,
    engine: AbuseEscalationEngine,
    lifecycle: LifecycleService,
    duplicates: DuplicateLinker,
    retry: RetryConfig,
}

impl ComplaintService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        classifier: Arc<dyn AbuseClassifier>,
        policy: AbusePolicy,
        retry: RetryConfig,
    ) -> Self {
        Self {
            engine: AbuseEscalationEngine::new(
                store.clone(),
                classifier,
                policy,
                retry.clone(),
            ),
            lifecycle: LifecycleService::new(store.clone(), retry.clone()),
            duplicates: DuplicateLinker::new(store.clone(), retry.clone()),
            store,
            retry,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Screen and persist a new complaint.
    ///
    /// An authenticated submitter's account email replaces the form email so
    /// the complaint stays visible to its owner.
    pub async fn submit_complaint(
        &self,
        mut input: NewComplaint,
        submitter: Option<Submitter>,
    ) -> Result<SubmissionReceipt> {
        if let Some(submitter) = &submitter {
            input.email = submitter.email.clone();
        }
        input.validate()?;

        if let Err(e) = self
            .engine
            .gate(submitter.as_ref(), &input.description, AbuseSource::Submission)
            .await
        {
            metrics::record_submission(match &e {
                ComplaintError::AbusiveContent => "abusive",
                ComplaintError::Banned => "banned",
                ComplaintError::ClassifierUnavailable(_) => "classifier_unavailable",
                _ => "failed",
            });
            return Err(e);
        }

        let draft = ComplaintDraft::new(input, submitter.map(|s| s.account_id));
        let complaint = self.store.insert_complaint(draft).await.map_err(|e| {
            metrics::record_submission("failed");
            e
        })?;

        metrics::record_submission("accepted");
        tracing::info!(
            id = %complaint.id,
            complaint_id = %complaint.complaint_id,
            governorate = %complaint.governorate,
            administration = %complaint.administration,
            anonymous = complaint.is_anonymous(),
            "Complaint submitted"
        );

        Ok(SubmissionReceipt {
            id: complaint.id,
            complaint_id: complaint.complaint_id,
        })
    }

    pub async fn list_complaints(&self, actor: &Actor) -> Result<Vec<Complaint>> {
        self.store.query_complaints(&read_scope(actor)).await
    }

    /// Single complaint; records outside the actor's read scope are reported
    /// as missing.
    pub async fn get_complaint(&self, id: Uuid, actor: &Actor) -> Result<Complaint> {
        let complaint = self.store.get_complaint(id).await?;
        if read_scope(actor).matches(&complaint) {
            Ok(complaint)
        } else {
            Err(ComplaintError::NotFound(format!("Complaint {} not found", id)))
        }
    }

    /// Lookup by the citizen-facing reference. Several records may share it.
    pub async fn track_complaint(&self, complaint_id: &str, actor: &Actor) -> Result<Vec<Complaint>> {
        let complaint_id = complaint_id.trim();
        if complaint_id.is_empty() || !complaint_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ComplaintError::InvalidInput(format!(
                "malformed complaint reference {:?}",
                complaint_id
            )));
        }
        let scope = read_scope(actor).and(FieldMatch::ComplaintId(complaint_id.to_string()));
        self.store.query_complaints(&scope).await
    }

    /// Owner edit of the description while the complaint is still under
    /// review. The new text is screened like a submission.
    pub async fn edit_description(
        &self,
        id: Uuid,
        description: &str,
        actor: &Actor,
    ) -> Result<Complaint> {
        if actor.role != Role::Citizen {
            return Err(ComplaintError::Unauthorized(
                "only the submitting citizen may edit a description".to_string(),
            ));
        }
        let description = description.trim();
        if description.is_empty() || description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ComplaintError::InvalidInput(format!(
                "description must be between 1 and {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }

        let complaint = self.get_complaint(id, actor).await?;
        if complaint.status != ComplaintStatus::Submitted {
            return Err(ComplaintError::InvalidInput(format!(
                "description can only change while status is {}",
                ComplaintStatus::Submitted
            )));
        }

        self.engine
            .gate(
                actor.as_submitter().as_ref(),
                description,
                AbuseSource::DescriptionEdit,
            )
            .await?;

        let update = ComplaintUpdate::by(actor.audit_identity()).description(description);
        let updated = update_with_retry(self.store.as_ref(), &self.retry, id, &update).await?;

        tracing::info!(complaint_id = %id, "Complaint description edited");
        Ok(updated)
    }

    pub async fn transition_status(
        &self,
        id: Uuid,
        target: ComplaintStatus,
        actor: &Actor,
    ) -> Result<Complaint> {
        self.lifecycle.transition(id, target, actor).await
    }

    pub async fn mark_duplicate(
        &self,
        id: Uuid,
        original: Option<Uuid>,
        actor: &Actor,
    ) -> Result<Complaint> {
        self.duplicates.mark(id, original, actor).await
    }

    pub async fn unmark_duplicate(&self, id: Uuid, actor: &Actor) -> Result<Complaint> {
        self.duplicates.unmark(id, actor).await
    }

    pub async fn flag_abusive(&self, id: Uuid, actor: &Actor) -> Result<Complaint> {
        self.engine.flag(id, actor).await
    }

    pub async fn unflag_abusive(&self, id: Uuid, actor: &Actor) -> Result<Complaint> {
        self.engine.unflag(id, actor).await
    }

    pub async fn ban_account(
        &self,
        account_id: Uuid,
        reason: &str,
        actor: &Actor,
    ) -> Result<Option<BanRecord>> {
        self.engine.ban_account(account_id, reason, actor).await
    }

    pub async fn account_overview(&self, account_id: Uuid, actor: &Actor) -> Result<AccountOverview> {
        require_moderator(actor)?;
        Ok(AccountOverview {
            account: self.store.get_account(account_id).await?,
            abuse_attempts: self.store.abuse_attempts(account_id).await?,
            bans: self.store.bans(account_id).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MockAbuseClassifier;
    use crate::models::{AbuseScores, Administration, Governorate};
    use crate::store::InMemoryRecordStore;

    fn service(toxicity: f32) -> ComplaintService {
        let mut classifier = MockAbuseClassifier::new();
        classifier
            .expect_analyze()
            .returning(move |_, _| Ok(AbuseScores::new(toxicity, 0.0, 0.0, 0.0)));
        ComplaintService::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(classifier),
            AbusePolicy::default(),
            RetryConfig::none(),
        )
    }

    fn input(email: &str) -> NewComplaint {
        NewComplaint {
            submitter_name: "Hoda".into(),
            email: email.into(),
            governorate: Governorate::Luxor,
            administration: Administration::RoadsAndTransport,
            description: "Pothole on the main road".into(),
            attachments: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_submit_and_read_back() {
        let service = service(0.0);
        let actor = Actor::anonymous("hoda@example.com");

        let receipt = service
            .submit_complaint(input("hoda@example.com"), None)
            .await
            .unwrap();
        let complaint = service.get_complaint(receipt.id, &actor).await.unwrap();
        assert_eq!(complaint.complaint_id, receipt.complaint_id);
        assert_eq!(complaint.status, ComplaintStatus::Submitted);

        let tracked = service
            .track_complaint(&receipt.complaint_id, &actor)
            .await
            .unwrap();
        assert_eq!(tracked.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_screening() {
        let mut classifier = MockAbuseClassifier::new();
        classifier.expect_analyze().times(0);
        let service = ComplaintService::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(classifier),
            AbusePolicy::default(),
            RetryConfig::none(),
        );
        let result = service.submit_complaint(input("bad-email"), None).await;
        assert!(matches!(result, Err(ComplaintError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_other_citizen_cannot_read() {
        let service = service(0.0);
        let receipt = service
            .submit_complaint(input("hoda@example.com"), None)
            .await
            .unwrap();
        let stranger = Actor::anonymous("other@example.com");
        assert!(matches!(
            service.get_complaint(receipt.id, &stranger).await,
            Err(ComplaintError::NotFound(_))
        ));
        assert!(service
            .track_complaint(&receipt.complaint_id, &stranger)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_authenticated_submission_uses_account_email() {
        let service = service(0.0);
        let id = Uuid::new_v4();
        let submitter = Submitter {
            account_id: id,
            email: "account@example.com".into(),
        };
        let receipt = service
            .submit_complaint(input("typed@example.com"), Some(submitter))
            .await
            .unwrap();
        let actor = Actor::citizen(id, "account@example.com");
        let complaint = service.get_complaint(receipt.id, &actor).await.unwrap();
        assert_eq!(complaint.submitter_id, Some(id));
    }

    #[tokio::test]
    async fn test_edit_description_only_while_submitted() {
        let service = service(0.0);
        let actor = Actor::anonymous("hoda@example.com");
        let receipt = service
            .submit_complaint(input("hoda@example.com"), None)
            .await
            .unwrap();

        let edited = service
            .edit_description(receipt.id, "Pothole near the school", &actor)
            .await
            .unwrap();
        assert_eq!(edited.description, "Pothole near the school");

        let department = Actor::department(
            Uuid::new_v4(),
            Administration::RoadsAndTransport,
            Governorate::Luxor,
        );
        service
            .transition_status(receipt.id, ComplaintStatus::InProgress, &department)
            .await
            .unwrap();

        assert!(matches!(
            service.edit_description(receipt.id, "Another edit", &actor).await,
            Err(ComplaintError::InvalidInput(_))
        ));
        assert!(matches!(
            service.edit_description(receipt.id, "Staff edit", &department).await,
            Err(ComplaintError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_reference_is_invalid() {
        let service = service(0.0);
        let actor = Actor::anonymous("hoda@example.com");
        assert!(matches!(
            service.track_complaint("abc", &actor).await,
            Err(ComplaintError::InvalidInput(_))
        ));
    }
}
