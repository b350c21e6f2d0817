pub mod error;
#[macro_use]
pub mod models;

pub mod classifier;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod services;
pub mod startup;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{ComplaintError, Result};
pub use models::{Actor, Complaint, ComplaintStatus, NewComplaint, Role, Submitter};
pub use services::{ComplaintService, BAN_THRESHOLD};
pub use store::{InMemoryRecordStore, PgRecordStore, RecordStore};
