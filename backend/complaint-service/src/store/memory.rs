//! In-process record store for tests and local development.

use super::RecordStore;
use crate::error::{ComplaintError, Result};
use crate::models::{
    AbuseAttempt, BanRecord, BanSource, ClearedFlag, Complaint, ComplaintDraft, ComplaintStatus,
    ComplaintUpdate, NewBan, Offense, OffenseTally, SubmitterAccount, ABUSE_ESCALATION_REASON,
};
use crate::services::visibility::ReadScope;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    complaints: HashMap<Uuid, Complaint>,
    accounts: HashMap<Uuid, SubmitterAccount>,
    abuse_attempts: Vec<AbuseAttempt>,
    bans: Vec<BanRecord>,
}

/// All collections sit behind one lock so multi-record operations are atomic.
#[derive(Default)]
pub struct InMemoryRecordStore {
    inner: RwLock<Collections>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a complaint verbatim, keeping its flags and timestamps.
    pub async fn seed_complaint(&self, complaint: Complaint) {
        self.inner
            .write()
            .await
            .complaints
            .insert(complaint.id, complaint);
    }

    /// Insert an account verbatim.
    pub async fn seed_account(&self, account: SubmitterAccount) {
        self.inner.write().await.accounts.insert(account.id, account);
    }

    pub async fn complaint_count(&self) -> usize {
        self.inner.read().await.complaints.len()
    }
}

fn complaint_not_found(id: Uuid) -> ComplaintError {
    ComplaintError::NotFound(format!("Complaint {} not found", id))
}

fn account_not_found(id: Uuid) -> ComplaintError {
    ComplaintError::NotFound(format!("Account {} not found", id))
}

fn ban_entry(
    account: &SubmitterAccount,
    source: BanSource,
    reason: &str,
    banned_by: Option<String>,
    now: DateTime<Utc>,
) -> BanRecord {
    BanRecord {
        id: Uuid::new_v4(),
        account_id: account.id,
        email: account.email.clone(),
        source,
        reason: reason.to_string(),
        banned_by,
        created_at: now,
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert_complaint(&self, draft: ComplaintDraft) -> Result<Complaint> {
        let now = Utc::now();
        let complaint = Complaint {
            id: Uuid::new_v4(),
            complaint_id: draft.complaint_id,
            submitter_name: draft.submitter_name,
            email: draft.email,
            submitter_id: draft.submitter_id,
            governorate: draft.governorate,
            administration: draft.administration,
            description: draft.description,
            attachments: draft.attachments,
            status: ComplaintStatus::Submitted,
            is_abusive: false,
            is_duplicate: false,
            reviewed: false,
            original_complaint_id: None,
            created_at: now,
            updated_at: now,
            updated_by: None,
        };
        self.inner
            .write()
            .await
            .complaints
            .insert(complaint.id, complaint.clone());
        Ok(complaint)
    }

    async fn get_complaint(&self, id: Uuid) -> Result<Complaint> {
        self.inner
            .read()
            .await
            .complaints
            .get(&id)
            .cloned()
            .ok_or_else(|| complaint_not_found(id))
    }

    async fn query_complaints(&self, scope: &ReadScope) -> Result<Vec<Complaint>> {
        if *scope == ReadScope::Nothing {
            return Ok(Vec::new());
        }
        let guard = self.inner.read().await;
        let mut complaints: Vec<Complaint> = guard
            .complaints
            .values()
            .filter(|c| scope.matches(c))
            .cloned()
            .collect();
        complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(complaints)
    }

    async fn update_complaint(&self, id: Uuid, update: &ComplaintUpdate) -> Result<Complaint> {
        let mut guard = self.inner.write().await;
        let complaint = guard
            .complaints
            .get_mut(&id)
            .ok_or_else(|| complaint_not_found(id))?;
        update.apply_to(complaint, Utc::now());
        Ok(complaint.clone())
    }

    async fn register_account(&self, id: Uuid, email: &str) -> Result<SubmitterAccount> {
        let mut guard = self.inner.write().await;
        let account = guard
            .accounts
            .entry(id)
            .or_insert_with(|| SubmitterAccount::new(id, email));
        Ok(account.clone())
    }

    async fn get_account(&self, id: Uuid) -> Result<SubmitterAccount> {
        self.inner
            .read()
            .await
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| account_not_found(id))
    }

    async fn record_offense(&self, offense: &Offense, ban_threshold: i32) -> Result<OffenseTally> {
        let now = Utc::now();
        let mut guard = self.inner.write().await;
        let store = &mut *guard;

        if !store.accounts.contains_key(&offense.account_id) {
            return Err(account_not_found(offense.account_id));
        }
        if let Some(complaint_id) = offense.flag_complaint {
            let complaint = store
                .complaints
                .get(&complaint_id)
                .ok_or_else(|| complaint_not_found(complaint_id))?;
            if complaint.is_abusive {
                let account = store
                    .accounts
                    .get(&offense.account_id)
                    .ok_or_else(|| account_not_found(offense.account_id))?;
                return Ok(OffenseTally {
                    counted: false,
                    abusive_complaints_count: account.abusive_complaints_count,
                    banned: account.banned,
                    ban: None,
                    complaint: Some(complaint.clone()),
                });
            }
        }

        store.abuse_attempts.push(AbuseAttempt {
            id: Uuid::new_v4(),
            account_id: offense.account_id,
            email: offense.email.clone(),
            complaint_ref: offense.flag_complaint,
            content: offense.content.clone(),
            source: offense.source,
            scores: offense.scores,
            created_at: now,
        });

        let complaint = offense.flag_complaint.and_then(|id| {
            store.complaints.get_mut(&id).map(|c| {
                ComplaintUpdate {
                    is_abusive: Some(true),
                    ..ComplaintUpdate::by(offense.recorded_by.clone())
                }
                .status(ComplaintStatus::Rejected)
                .apply_to(c, now);
                c.clone()
            })
        });

        let account = store
            .accounts
            .get_mut(&offense.account_id)
            .ok_or_else(|| account_not_found(offense.account_id))?;
        account.abusive_complaints_count += 1;
        account.last_abusive_at = Some(now);

        let mut ban = None;
        if account.abusive_complaints_count == ban_threshold && !account.banned {
            account.banned = true;
            let record = ban_entry(
                account,
                BanSource::AbuseEscalation,
                ABUSE_ESCALATION_REASON,
                None,
                now,
            );
            store.bans.push(record.clone());
            ban = Some(record);
        }

        Ok(OffenseTally {
            counted: true,
            abusive_complaints_count: account.abusive_complaints_count,
            banned: account.banned,
            ban,
            complaint,
        })
    }

    async fn clear_abuse_flag(&self, complaint_id: Uuid, updated_by: &str) -> Result<ClearedFlag> {
        let now = Utc::now();
        let mut guard = self.inner.write().await;
        let store = &mut *guard;

        let complaint = store
            .complaints
            .get_mut(&complaint_id)
            .ok_or_else(|| complaint_not_found(complaint_id))?;
        if !complaint.is_abusive {
            return Ok(ClearedFlag {
                complaint: complaint.clone(),
                changed: false,
                abusive_complaints_count: None,
            });
        }

        ComplaintUpdate {
            is_abusive: Some(false),
            ..ComplaintUpdate::by(updated_by)
        }
        .status(ComplaintStatus::Submitted)
        .apply_to(complaint, now);
        let complaint = complaint.clone();

        let abusive_complaints_count = complaint
            .submitter_id
            .and_then(|id| store.accounts.get_mut(&id))
            .map(|account| {
                account.abusive_complaints_count = (account.abusive_complaints_count - 1).max(0);
                account.abusive_complaints_count
            });

        Ok(ClearedFlag {
            complaint,
            changed: true,
            abusive_complaints_count,
        })
    }

    async fn ban_account(&self, ban: &NewBan) -> Result<Option<BanRecord>> {
        let mut guard = self.inner.write().await;
        let store = &mut *guard;
        let account = store
            .accounts
            .get_mut(&ban.account_id)
            .ok_or_else(|| account_not_found(ban.account_id))?;
        if account.banned {
            return Ok(None);
        }
        account.banned = true;
        let record = ban_entry(
            account,
            ban.source,
            &ban.reason,
            ban.banned_by.clone(),
            Utc::now(),
        );
        store.bans.push(record.clone());
        Ok(Some(record))
    }

    async fn abuse_attempts(&self, account_id: Uuid) -> Result<Vec<AbuseAttempt>> {
        Ok(self
            .inner
            .read()
            .await
            .abuse_attempts
            .iter()
            .filter(|a| a.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn bans(&self, account_id: Uuid) -> Result<Vec<BanRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .bans
            .iter()
            .filter(|b| b.account_id == account_id)
            .cloned()
            .collect())
    }
}
