//! Record store seam.
//!
//! Every engine decision re-reads current state through this trait; nothing
//! is cached between calls.

use crate::error::Result;
use crate::models::{
    AbuseAttempt, BanRecord, ClearedFlag, Complaint, ComplaintDraft, ComplaintUpdate, NewBan,
    Offense, OffenseTally, SubmitterAccount,
};
use crate::services::visibility::ReadScope;
use async_trait::async_trait;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRecordStore;
pub use postgres::PgRecordStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new complaint with status `submitted` and cleared flags.
    async fn insert_complaint(&self, draft: ComplaintDraft) -> Result<Complaint>;

    /// Fetch a complaint, `NotFound` when absent.
    async fn get_complaint(&self, id: Uuid) -> Result<Complaint>;

    /// Complaints matching the scope, newest first.
    async fn query_complaints(&self, scope: &ReadScope) -> Result<Vec<Complaint>>;

    /// Apply a partial update and refresh `updated_at`, `NotFound` when absent.
    async fn update_complaint(&self, id: Uuid, update: &ComplaintUpdate) -> Result<Complaint>;

    /// Create the account if it does not exist yet and return the current row.
    async fn register_account(&self, id: Uuid, email: &str) -> Result<SubmitterAccount>;

    /// Fetch an account, `NotFound` when absent.
    async fn get_account(&self, id: Uuid) -> Result<SubmitterAccount>;

    /// Append the abuse attempt, increment the account counter, optionally flag
    /// the complaint, and ban the account once the counter reaches
    /// `ban_threshold`. All of it commits or none of it does.
    ///
    /// When `flag_complaint` is already abusive nothing is written and the
    /// tally comes back with `counted == false`.
    async fn record_offense(&self, offense: &Offense, ban_threshold: i32) -> Result<OffenseTally>;

    /// Clear a complaint's abuse flag, reset it to `submitted` and decrement the
    /// submitter counter (floored at zero). Never touches `banned`.
    async fn clear_abuse_flag(&self, complaint_id: Uuid, updated_by: &str) -> Result<ClearedFlag>;

    /// Set `banned` and append a ban record. Returns `None` when the account was
    /// already banned.
    async fn ban_account(&self, ban: &NewBan) -> Result<Option<BanRecord>>;

    /// Abuse log for an account, oldest first.
    async fn abuse_attempts(&self, account_id: Uuid) -> Result<Vec<AbuseAttempt>>;

    /// Ban log for an account, oldest first.
    async fn bans(&self, account_id: Uuid) -> Result<Vec<BanRecord>>;
}
