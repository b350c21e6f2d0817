//! Postgres-backed record store

use super::RecordStore;
use crate::error::{ComplaintError, Result};
use crate::models::{
    AbuseAttempt, AbuseScores, Attachments, BanRecord, BanSource, ClearedFlag, Complaint,
    ComplaintDraft, ComplaintStatus, ComplaintUpdate, InvalidValue, NewBan, Offense,
    OffenseTally, SubmitterAccount, ABUSE_ESCALATION_REASON,
};
use crate::services::visibility::{FieldMatch, ReadScope};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use std::sync::Arc;
use uuid::Uuid;

const COMPLAINT_COLUMNS: &str = "id, complaint_id, submitter_name, email, submitter_id, \
     governorate, administration, description, attachments, status, is_abusive, \
     is_duplicate, reviewed, original_complaint_id, created_at, updated_at, updated_by";

const ACCOUNT_COLUMNS: &str =
    "id, email, abusive_complaints_count, banned, last_abusive_at, created_at";

const BAN_COLUMNS: &str = "id, account_id, email, source, reason, banned_by, created_at";

#[derive(Debug, FromRow)]
struct ComplaintRow {
    id: Uuid,
    complaint_id: String,
    submitter_name: String,
    email: String,
    submitter_id: Option<Uuid>,
    governorate: String,
    administration: String,
    description: String,
    attachments: Json<Attachments>,
    status: String,
    is_abusive: bool,
    is_duplicate: bool,
    reviewed: bool,
    original_complaint_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    updated_by: Option<String>,
}

fn corrupt(err: InvalidValue) -> ComplaintError {
    ComplaintError::Internal(format!("Corrupt stored value: {}", err))
}

impl TryFrom<ComplaintRow> for Complaint {
    type Error = ComplaintError;

    fn try_from(row: ComplaintRow) -> Result<Self> {
        Ok(Complaint {
            id: row.id,
            complaint_id: row.complaint_id,
            submitter_name: row.submitter_name,
            email: row.email,
            submitter_id: row.submitter_id,
            governorate: row.governorate.parse().map_err(corrupt)?,
            administration: row.administration.parse().map_err(corrupt)?,
            description: row.description,
            attachments: row.attachments.0,
            status: row.status.parse().map_err(corrupt)?,
            is_abusive: row.is_abusive,
            is_duplicate: row.is_duplicate,
            reviewed: row.reviewed,
            original_complaint_id: row.original_complaint_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
        })
    }
}

#[derive(Debug, FromRow)]
struct BanRow {
    id: Uuid,
    account_id: Uuid,
    email: String,
    source: String,
    reason: String,
    banned_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BanRow> for BanRecord {
    type Error = ComplaintError;

    fn try_from(row: BanRow) -> Result<Self> {
        Ok(BanRecord {
            id: row.id,
            account_id: row.account_id,
            email: row.email,
            source: row.source.parse().map_err(corrupt)?,
            reason: row.reason,
            banned_by: row.banned_by,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AbuseAttemptRow {
    id: Uuid,
    account_id: Uuid,
    email: String,
    complaint_ref: Option<Uuid>,
    content: String,
    source: String,
    toxicity_score: Option<f32>,
    profanity_score: Option<f32>,
    threat_score: Option<f32>,
    insult_score: Option<f32>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AbuseAttemptRow> for AbuseAttempt {
    type Error = ComplaintError;

    fn try_from(row: AbuseAttemptRow) -> Result<Self> {
        let scores = match (row.toxicity_score, row.profanity_score) {
            (Some(toxicity), Some(profanity)) => Some(AbuseScores::new(
                toxicity,
                profanity,
                row.threat_score.unwrap_or(0.0),
                row.insult_score.unwrap_or(0.0),
            )),
            _ => None,
        };
        Ok(AbuseAttempt {
            id: row.id,
            account_id: row.account_id,
            email: row.email,
            complaint_ref: row.complaint_ref,
            content: row.content,
            source: row.source.parse().map_err(corrupt)?,
            scores,
            created_at: row.created_at,
        })
    }
}

fn complaint_not_found(id: Uuid) -> ComplaintError {
    ComplaintError::NotFound(format!("Complaint {} not found", id))
}

fn account_not_found(id: Uuid) -> ComplaintError {
    ComplaintError::NotFound(format!("Account {} not found", id))
}

/// Set `banned` and append the ban record inside an open transaction.
async fn insert_ban(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    email: &str,
    source: BanSource,
    reason: &str,
    banned_by: Option<&str>,
    now: DateTime<Utc>,
) -> Result<BanRecord> {
    sqlx::query("UPDATE submitter_accounts SET banned = TRUE WHERE id = $1")
        .bind(account_id)
        .execute(&mut **tx)
        .await?;

    let sql = format!(
        r#"
        INSERT INTO account_bans (account_id, email, source, reason, banned_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {}
        "#,
        BAN_COLUMNS
    );
    let row = sqlx::query_as::<_, BanRow>(&sql)
        .bind(account_id)
        .bind(email)
        .bind(source.as_str())
        .bind(reason)
        .bind(banned_by)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

    let ban = BanRecord::try_from(row)?;

    tracing::warn!(
        ban_id = %ban.id,
        account_id = %account_id,
        source = %source,
        "Submitter account banned"
    );

    Ok(ban)
}

/// Database operations for complaints, submitter accounts and moderation logs
pub struct PgRecordStore {
    pool: Arc<PgPool>,
}

impl PgRecordStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&*self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert_complaint(&self, draft: ComplaintDraft) -> Result<Complaint> {
        let sql = format!(
            r#"
            INSERT INTO complaints (
                complaint_id,
                submitter_name,
                email,
                submitter_id,
                governorate,
                administration,
                description,
                attachments,
                status,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING {}
            "#,
            COMPLAINT_COLUMNS
        );
        let row = sqlx::query_as::<_, ComplaintRow>(&sql)
            .bind(&draft.complaint_id)
            .bind(&draft.submitter_name)
            .bind(&draft.email)
            .bind(draft.submitter_id)
            .bind(draft.governorate.as_str())
            .bind(draft.administration.as_str())
            .bind(&draft.description)
            .bind(Json(&draft.attachments))
            .bind(ComplaintStatus::Submitted.as_str())
            .bind(Utc::now())
            .fetch_one(&*self.pool)
            .await?;

        Complaint::try_from(row)
    }

    async fn get_complaint(&self, id: Uuid) -> Result<Complaint> {
        let sql = format!("SELECT {} FROM complaints WHERE id = $1", COMPLAINT_COLUMNS);
        let row = sqlx::query_as::<_, ComplaintRow>(&sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?
            .ok_or_else(|| complaint_not_found(id))?;

        Complaint::try_from(row)
    }

    async fn query_complaints(&self, scope: &ReadScope) -> Result<Vec<Complaint>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM complaints", COMPLAINT_COLUMNS));

        match scope {
            ReadScope::Nothing => return Ok(Vec::new()),
            ReadScope::All => {}
            ReadScope::Where(clauses) if clauses.is_empty() => {}
            ReadScope::Where(clauses) => {
                qb.push(" WHERE ");
                let mut separated = qb.separated(" AND ");
                for clause in clauses {
                    match clause {
                        FieldMatch::Email(email) => {
                            separated.push("email = ");
                            separated.push_bind_unseparated(email.clone());
                        }
                        FieldMatch::Administration(administration) => {
                            separated.push("administration = ");
                            separated.push_bind_unseparated(administration.as_str());
                        }
                        FieldMatch::Governorate(governorate) => {
                            separated.push("governorate = ");
                            separated.push_bind_unseparated(governorate.as_str());
                        }
                        FieldMatch::ComplaintId(complaint_id) => {
                            separated.push("complaint_id = ");
                            separated.push_bind_unseparated(complaint_id.clone());
                        }
                    }
                }
            }
        }
        qb.push(" ORDER BY created_at DESC");

        let rows = qb
            .build_query_as::<ComplaintRow>()
            .fetch_all(&*self.pool)
            .await?;

        rows.into_iter().map(Complaint::try_from).collect()
    }

    async fn update_complaint(&self, id: Uuid, update: &ComplaintUpdate) -> Result<Complaint> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE complaints SET updated_at = ");
        qb.push_bind(Utc::now());
        qb.push(", updated_by = ");
        qb.push_bind(update.updated_by.clone());
        if let Some(status) = update.status {
            qb.push(", status = ");
            qb.push_bind(status.as_str());
        }
        if let Some(description) = &update.description {
            qb.push(", description = ");
            qb.push_bind(description.clone());
        }
        if let Some(is_abusive) = update.is_abusive {
            qb.push(", is_abusive = ");
            qb.push_bind(is_abusive);
        }
        if let Some(is_duplicate) = update.is_duplicate {
            qb.push(", is_duplicate = ");
            qb.push_bind(is_duplicate);
        }
        if let Some(reviewed) = update.reviewed {
            qb.push(", reviewed = ");
            qb.push_bind(reviewed);
        }
        if let Some(original) = update.original_complaint_id {
            qb.push(", original_complaint_id = ");
            qb.push_bind(original);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(format!(" RETURNING {}", COMPLAINT_COLUMNS));

        let row = qb
            .build_query_as::<ComplaintRow>()
            .fetch_optional(&*self.pool)
            .await?
            .ok_or_else(|| complaint_not_found(id))?;

        Complaint::try_from(row)
    }

    async fn register_account(&self, id: Uuid, email: &str) -> Result<SubmitterAccount> {
        sqlx::query(
            r#"
            INSERT INTO submitter_accounts (id, email, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(email)
        .execute(&*self.pool)
        .await?;

        self.get_account(id).await
    }

    async fn get_account(&self, id: Uuid) -> Result<SubmitterAccount> {
        let sql = format!(
            "SELECT {} FROM submitter_accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        );
        let account = sqlx::query_as::<_, SubmitterAccount>(&sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?
            .ok_or_else(|| account_not_found(id))?;

        Ok(account)
    }

    async fn record_offense(&self, offense: &Offense, ban_threshold: i32) -> Result<OffenseTally> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Flag first so concurrent flags of one complaint count it once.
        let complaint = match offense.flag_complaint {
            Some(complaint_id) => {
                let sql = format!(
                    r#"
                    UPDATE complaints
                    SET is_abusive = TRUE, status = $2, updated_at = $3, updated_by = $4
                    WHERE id = $1 AND is_abusive = FALSE
                    RETURNING {}
                    "#,
                    COMPLAINT_COLUMNS
                );
                let row = sqlx::query_as::<_, ComplaintRow>(&sql)
                    .bind(complaint_id)
                    .bind(ComplaintStatus::Rejected.as_str())
                    .bind(now)
                    .bind(&offense.recorded_by)
                    .fetch_optional(&mut *tx)
                    .await?;

                let Some(row) = row else {
                    drop(tx);
                    let complaint = self.get_complaint(complaint_id).await?;
                    let account = self.get_account(offense.account_id).await?;
                    return Ok(OffenseTally {
                        counted: false,
                        abusive_complaints_count: account.abusive_complaints_count,
                        banned: account.banned,
                        ban: None,
                        complaint: Some(complaint),
                    });
                };
                Some(Complaint::try_from(row)?)
            }
            None => None,
        };

        // Row lock on the account serializes concurrent offenses.
        let (count, already_banned, account_email) = sqlx::query_as::<_, (i32, bool, String)>(
            r#"
            UPDATE submitter_accounts
            SET abusive_complaints_count = abusive_complaints_count + 1,
                last_abusive_at = $2
            WHERE id = $1
            RETURNING abusive_complaints_count, banned, email
            "#,
        )
        .bind(offense.account_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| account_not_found(offense.account_id))?;

        sqlx::query(
            r#"
            INSERT INTO abuse_attempts (
                account_id,
                email,
                complaint_ref,
                content,
                source,
                toxicity_score,
                profanity_score,
                threat_score,
                insult_score,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(offense.account_id)
        .bind(&offense.email)
        .bind(offense.flag_complaint)
        .bind(&offense.content)
        .bind(offense.source.as_str())
        .bind(offense.scores.map(|s| s.toxicity))
        .bind(offense.scores.map(|s| s.profanity))
        .bind(offense.scores.map(|s| s.threat))
        .bind(offense.scores.map(|s| s.insult))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let ban = if count == ban_threshold && !already_banned {
            Some(
                insert_ban(
                    &mut tx,
                    offense.account_id,
                    &account_email,
                    BanSource::AbuseEscalation,
                    ABUSE_ESCALATION_REASON,
                    None,
                    now,
                )
                .await?,
            )
        } else {
            None
        };

        tx.commit().await?;

        tracing::info!(
            account_id = %offense.account_id,
            source = %offense.source,
            abusive_complaints_count = count,
            "Abuse attempt recorded"
        );

        Ok(OffenseTally {
            counted: true,
            abusive_complaints_count: count,
            banned: already_banned || ban.is_some(),
            ban,
            complaint,
        })
    }

    async fn clear_abuse_flag(&self, complaint_id: Uuid, updated_by: &str) -> Result<ClearedFlag> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE complaints
            SET is_abusive = FALSE, status = $2, updated_at = $3, updated_by = $4
            WHERE id = $1 AND is_abusive = TRUE
            RETURNING {}
            "#,
            COMPLAINT_COLUMNS
        );
        let row = sqlx::query_as::<_, ComplaintRow>(&sql)
            .bind(complaint_id)
            .bind(ComplaintStatus::Submitted.as_str())
            .bind(now)
            .bind(updated_by)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            drop(tx);
            return Ok(ClearedFlag {
                complaint: self.get_complaint(complaint_id).await?,
                changed: false,
                abusive_complaints_count: None,
            });
        };
        let complaint = Complaint::try_from(row)?;

        let abusive_complaints_count = match complaint.submitter_id {
            Some(account_id) => {
                sqlx::query_scalar::<_, i32>(
                    r#"
                    UPDATE submitter_accounts
                    SET abusive_complaints_count = GREATEST(abusive_complaints_count - 1, 0)
                    WHERE id = $1
                    RETURNING abusive_complaints_count
                    "#,
                )
                .bind(account_id)
                .fetch_optional(&mut *tx)
                .await?
            }
            None => None,
        };

        tx.commit().await?;

        Ok(ClearedFlag {
            complaint,
            changed: true,
            abusive_complaints_count,
        })
    }

    async fn ban_account(&self, ban: &NewBan) -> Result<Option<BanRecord>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let account = sqlx::query_as::<_, (String, bool)>(
            "SELECT email, banned FROM submitter_accounts WHERE id = $1 FOR UPDATE",
        )
        .bind(ban.account_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| account_not_found(ban.account_id))?;

        let (email, banned) = account;
        if banned {
            return Ok(None);
        }

        let record = insert_ban(
            &mut tx,
            ban.account_id,
            &email,
            ban.source,
            &ban.reason,
            ban.banned_by.as_deref(),
            now,
        )
        .await?;

        tx.commit().await?;
        Ok(Some(record))
    }

    async fn abuse_attempts(&self, account_id: Uuid) -> Result<Vec<AbuseAttempt>> {
        let rows = sqlx::query_as::<_, AbuseAttemptRow>(
            r#"
            SELECT id, account_id, email, complaint_ref, content, source,
                   toxicity_score, profanity_score, threat_score, insult_score, created_at
            FROM abuse_attempts
            WHERE account_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(&*self.pool)
        .await?;

        rows.into_iter().map(AbuseAttempt::try_from).collect()
    }

    async fn bans(&self, account_id: Uuid) -> Result<Vec<BanRecord>> {
        let sql = format!(
            "SELECT {} FROM account_bans WHERE account_id = $1 ORDER BY created_at ASC",
            BAN_COLUMNS
        );
        let rows = sqlx::query_as::<_, BanRow>(&sql)
            .bind(account_id)
            .fetch_all(&*self.pool)
            .await?;

        rows.into_iter().map(BanRecord::try_from).collect()
    }
}
