use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Citizen account with its moderation counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubmitterAccount {
    pub id: Uuid,
    pub email: String,
    pub abusive_complaints_count: i32,
    /// Set by the escalation engine or a moderator; only an unban outside this service clears it
    pub banned: bool,
    pub last_abusive_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SubmitterAccount {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            abusive_complaints_count: 0,
            banned: false,
            last_abusive_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Authenticated submitter as seen by the intake path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitter {
    pub account_id: Uuid,
    pub email: String,
}

stored_enum! {
    /// Origin of a ban record.
    pub enum BanSource: "ban source" {
        AbuseEscalation => "abuse_escalation",
        Manual => "manual",
    }
}

/// Fixed reason written on engine-issued bans.
pub const ABUSE_ESCALATION_REASON: &str = "Reached the abusive complaint threshold";

/// Append-only ban log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BanRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub email: String,
    pub source: BanSource,
    pub reason: String,
    pub banned_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for a ban
#[derive(Debug, Clone)]
pub struct NewBan {
    pub account_id: Uuid,
    pub source: BanSource,
    pub reason: String,
    pub banned_by: Option<String>,
}
