//! Abuse-escalation engine.
//!
//! Gates submissions and description edits through the classifier, records
//! offenses per authenticated submitter and bans an account once its
//! counter reaches [`BAN_THRESHOLD`]. Account state is re-read on every
//! call; counting and banning happen inside one store operation.

use crate::classifier::AbuseClassifier;
use crate::error::{ComplaintError, Result};
use crate::metrics;
use crate::models::{
    AbuseScores, AbuseSource, Actor, BanRecord, BanSource, Complaint, ComplaintStatus,
    ComplaintUpdate, NewBan, Offense, Submitter,
};
use crate::store::RecordStore;
use resilience::RetryConfig;
use std::sync::Arc;
use uuid::Uuid;

use super::update_with_retry;

/// Logged offenses after which an account is banned.
pub const BAN_THRESHOLD: i32 = 3;

stored_enum! {
    /// What to do when the classifier cannot be reached.
    pub enum FailurePolicy: "classifier failure policy" {
        /// Treat the text as clean
        FailOpen => "fail_open",
        /// Refuse the submission with `ClassifierUnavailable`
        FailClosed => "fail_closed",
    }
}

#[derive(Debug, Clone)]
pub struct AbusePolicy {
    pub toxicity_threshold: f32,
    pub profanity_threshold: f32,
    pub failure_policy: FailurePolicy,
    pub language: String,
}

impl Default for AbusePolicy {
    fn default() -> Self {
        Self {
            toxicity_threshold: 0.7,
            profanity_threshold: 0.7,
            failure_policy: FailurePolicy::FailOpen,
            language: "ar".to_string(),
        }
    }
}

impl AbusePolicy {
    /// Only toxicity and profanity decide; threat and insult are recorded.
    pub fn is_abusive(&self, scores: &AbuseScores) -> bool {
        scores.toxicity > self.toxicity_threshold || scores.profanity > self.profanity_threshold
    }
}

pub struct AbuseEscalationEngine {
    store: Arc<dyn RecordStore>,
    classifier: Arc<dyn AbuseClassifier>,
    policy: AbusePolicy,
    retry: RetryConfig,
}

impl AbuseEscalationEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        classifier: Arc<dyn AbuseClassifier>,
        policy: AbusePolicy,
        retry: RetryConfig,
    ) -> Self {
        Self {
            store,
            classifier,
            policy,
            retry,
        }
    }

    pub fn policy(&self) -> &AbusePolicy {
        &self.policy
    }

    /// Screen text on behalf of a submitter.
    ///
    /// A banned account is refused before the classifier runs. Abusive text
    /// from an authenticated submitter is logged and counted; anonymous
    /// abuse is refused without any write.
    pub async fn gate(
        &self,
        submitter: Option<&Submitter>,
        text: &str,
        source: AbuseSource,
    ) -> Result<()> {
        if let Some(submitter) = submitter {
            let account = self
                .store
                .register_account(submitter.account_id, &submitter.email)
                .await?;
            if account.banned {
                tracing::info!(account_id = %account.id, "Banned submitter refused");
                return Err(ComplaintError::Banned);
            }
        }

        let scores = match self.classify(text).await? {
            Some(scores) if self.policy.is_abusive(&scores) => scores,
            _ => return Ok(()),
        };

        let submitter = match submitter {
            Some(submitter) => submitter,
            None => {
                tracing::info!(
                    toxicity = scores.toxicity,
                    profanity = scores.profanity,
                    "Anonymous abusive content refused"
                );
                return Err(ComplaintError::AbusiveContent);
            }
        };

        let tally = self
            .store
            .record_offense(
                &Offense {
                    account_id: submitter.account_id,
                    email: submitter.email.clone(),
                    content: text.to_string(),
                    source,
                    scores: Some(scores),
                    flag_complaint: None,
                    recorded_by: format!("{}:{}", source, submitter.account_id),
                },
                BAN_THRESHOLD,
            )
            .await?;

        metrics::record_abuse_attempt(source.as_str());
        tracing::warn!(
            account_id = %submitter.account_id,
            source = %source,
            count = tally.abusive_complaints_count,
            toxicity = scores.toxicity,
            profanity = scores.profanity,
            "Abuse attempt logged"
        );

        if let Some(ban) = &tally.ban {
            metrics::record_ban(ban.source.as_str());
        }

        if tally.banned {
            Err(ComplaintError::Banned)
        } else {
            Err(ComplaintError::AbusiveContent)
        }
    }

    /// Scores for `text`, or `None` when the classifier failed and the
    /// policy is fail-open.
    async fn classify(&self, text: &str) -> Result<Option<AbuseScores>> {
        match self.classifier.analyze(text, &self.policy.language).await {
            Ok(scores) => Ok(Some(scores)),
            Err(e) => {
                let policy = self.policy.failure_policy;
                metrics::record_classifier_failure(policy.as_str());
                tracing::warn!(error = %e, policy = %policy, "Abuse classifier failed");
                match policy {
                    FailurePolicy::FailOpen => Ok(None),
                    FailurePolicy::FailClosed => {
                        Err(ComplaintError::ClassifierUnavailable(e.to_string()))
                    }
                }
            }
        }
    }

    /// Moderator flag on a stored complaint: mark it abusive and rejected,
    /// and count it against the submitter like a gated submission.
    ///
    /// Flagging an already abusive complaint changes nothing.
    pub async fn flag(&self, complaint_id: Uuid, actor: &Actor) -> Result<Complaint> {
        require_moderator(actor)?;

        let complaint = self.store.get_complaint(complaint_id).await?;
        if complaint.is_abusive {
            return Ok(complaint);
        }

        let recorded_by = actor.audit_identity();
        let flagged = match complaint.submitter_id {
            None => {
                let update = ComplaintUpdate {
                    is_abusive: Some(true),
                    ..ComplaintUpdate::by(recorded_by.clone())
                }
                .status(ComplaintStatus::Rejected);
                update_with_retry(self.store.as_ref(), &self.retry, complaint_id, &update).await?
            }
            Some(account_id) => {
                self.store
                    .register_account(account_id, &complaint.email)
                    .await?;
                let tally = self
                    .store
                    .record_offense(
                        &Offense {
                            account_id,
                            email: complaint.email.clone(),
                            content: complaint.description.clone(),
                            source: AbuseSource::ModeratorFlag,
                            scores: None,
                            flag_complaint: Some(complaint_id),
                            recorded_by: recorded_by.clone(),
                        },
                        BAN_THRESHOLD,
                    )
                    .await?;

                if !tally.counted {
                    return tally.complaint.ok_or_else(|| complaint_missing(complaint_id));
                }

                metrics::record_abuse_attempt(AbuseSource::ModeratorFlag.as_str());
                if let Some(ban) = &tally.ban {
                    metrics::record_ban(ban.source.as_str());
                    tracing::warn!(account_id = %account_id, "Account banned after moderator flag");
                }

                tally.complaint.ok_or_else(|| complaint_missing(complaint_id))?
            }
        };

        tracing::info!(
            complaint_id = %complaint_id,
            moderator = %recorded_by,
            "Complaint flagged abusive"
        );
        Ok(flagged)
    }

    /// Reverse a moderator flag. Decrements the submitter counter but never
    /// lifts a ban.
    pub async fn unflag(&self, complaint_id: Uuid, actor: &Actor) -> Result<Complaint> {
        require_moderator(actor)?;

        let cleared = self
            .store
            .clear_abuse_flag(complaint_id, &actor.audit_identity())
            .await?;

        if cleared.changed {
            tracing::info!(
                complaint_id = %complaint_id,
                count = ?cleared.abusive_complaints_count,
                "Complaint abuse flag cleared"
            );
        }
        Ok(cleared.complaint)
    }

    /// Manual moderator ban. Returns `None` when the account was already banned.
    pub async fn ban_account(
        &self,
        account_id: Uuid,
        reason: &str,
        actor: &Actor,
    ) -> Result<Option<BanRecord>> {
        require_moderator(actor)?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ComplaintError::InvalidInput(
                "ban reason must not be empty".to_string(),
            ));
        }

        let ban = self
            .store
            .ban_account(&NewBan {
                account_id,
                source: BanSource::Manual,
                reason: reason.to_string(),
                banned_by: Some(actor.audit_identity()),
            })
            .await?;

        match &ban {
            Some(record) => {
                metrics::record_ban(record.source.as_str());
                tracing::warn!(account_id = %account_id, reason = %reason, "Account banned manually");
            }
            None => tracing::info!(account_id = %account_id, "Account already banned"),
        }
        Ok(ban)
    }
}

pub(crate) fn require_moderator(actor: &Actor) -> Result<()> {
    if actor.is_moderator() {
        Ok(())
    } else {
        Err(ComplaintError::Unauthorized(format!(
            "role {} cannot moderate complaints",
            actor.role
        )))
    }
}

fn complaint_missing(complaint_id: Uuid) -> ComplaintError {
    ComplaintError::Internal(format!(
        "offense for complaint {} returned no complaint",
        complaint_id
    ))
}
