//! Text abuse classifiers

use crate::models::AbuseScores;
use async_trait::async_trait;
use thiserror::Error;

pub mod perspective;
pub mod wordlist;

pub use perspective::PerspectiveClassifier;
pub use wordlist::WordListClassifier;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("classifier returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("classifier response malformed: {0}")]
    Malformed(String),
}

/// Scores a piece of text per abuse category.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AbuseClassifier: Send + Sync {
    async fn analyze(&self, text: &str, language: &str) -> Result<AbuseScores, ClassifierError>;
}
