use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BanRecord, Complaint};

/// Per-category risk scores from the abuse classifier, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AbuseScores {
    pub toxicity: f32,
    pub profanity: f32,
    pub threat: f32,
    pub insult: f32,
}

impl AbuseScores {
    pub fn new(toxicity: f32, profanity: f32, threat: f32, insult: f32) -> Self {
        Self {
            toxicity: toxicity.clamp(0.0, 1.0),
            profanity: profanity.clamp(0.0, 1.0),
            threat: threat.clamp(0.0, 1.0),
            insult: insult.clamp(0.0, 1.0),
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

stored_enum! {
    /// Path that produced an abuse attempt entry.
    pub enum AbuseSource: "abuse source" {
        Submission => "submission",
        DescriptionEdit => "description_edit",
        ModeratorFlag => "moderator_flag",
    }
}

/// Append-only abuse attempt entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbuseAttempt {
    pub id: Uuid,
    pub account_id: Uuid,
    pub email: String,
    pub complaint_ref: Option<Uuid>,
    pub content: String,
    pub source: AbuseSource,
    pub scores: Option<AbuseScores>,
    pub created_at: DateTime<Utc>,
}

/// One offense to record atomically: the log entry, the counter increment,
/// the optional complaint flag and the ban when the threshold is reached.
#[derive(Debug, Clone)]
pub struct Offense {
    pub account_id: Uuid,
    pub email: String,
    pub content: String,
    pub source: AbuseSource,
    pub scores: Option<AbuseScores>,
    /// Complaint to mark abusive and rejected in the same write
    pub flag_complaint: Option<Uuid>,
    pub recorded_by: String,
}

/// Result of recording an offense.
#[derive(Debug, Clone, PartialEq)]
pub struct OffenseTally {
    /// False when `flag_complaint` was already abusive and nothing was written
    pub counted: bool,
    pub abusive_complaints_count: i32,
    /// Ban created by this offense, if it crossed the threshold
    pub ban: Option<BanRecord>,
    /// Account is banned after this write
    pub banned: bool,
    /// Complaint after flagging, when `flag_complaint` was set
    pub complaint: Option<Complaint>,
}

/// Result of reversing a moderator abuse flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearedFlag {
    pub complaint: Complaint,
    /// False when the complaint was not flagged
    pub changed: bool,
    /// Counter after the decrement, for authenticated submitters
    pub abusive_complaints_count: Option<i32>,
}
