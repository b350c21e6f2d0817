//! Wiring of store, classifier and service from configuration.

use crate::classifier::{AbuseClassifier, PerspectiveClassifier, WordListClassifier};
use crate::config::Config;
use crate::error::{ComplaintError, Result};
use crate::services::{AbusePolicy, ComplaintService};
use crate::store::{InMemoryRecordStore, PgRecordStore, RecordStore};
use resilience::RetryConfig;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Postgres when `DATABASE_URL` is set, otherwise the in-memory store.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn RecordStore>> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set, using in-memory record store");
        return Ok(Arc::new(InMemoryRecordStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .test_before_acquire(true)
        .connect(database_url)
        .await?;
    tracing::info!(max_connections = config.db_max_connections, "Database pool initialized");

    let store = PgRecordStore::new(Arc::new(pool));
    tracing::info!("Running database migrations...");
    store.migrate().await.map_err(|e| {
        tracing::error!("Migration failed: {}", e);
        e
    })?;
    tracing::info!("Migrations completed successfully");

    Ok(Arc::new(store))
}

/// Remote analysis when an API key is configured, otherwise the word list.
pub fn build_classifier(config: &Config) -> Result<Arc<dyn AbuseClassifier>> {
    if let Some(api_key) = &config.perspective_api_key {
        let classifier = PerspectiveClassifier::new(
            config.perspective_api_url.clone(),
            api_key.clone(),
            config.classifier_timeout(),
        )
        .map_err(|e| ComplaintError::Config(format!("classifier client: {}", e)))?;
        tracing::info!(endpoint = %config.perspective_api_url, "Using remote abuse classifier");
        return Ok(Arc::new(classifier));
    }

    let classifier = match &config.sensitive_words_path {
        Some(path) => WordListClassifier::from_file(path)?,
        None => {
            tracing::warn!("No classifier configured, word list is empty");
            WordListClassifier::from_words(Vec::<String>::new())?
        }
    };
    Ok(Arc::new(classifier))
}

pub fn abuse_policy(config: &Config) -> AbusePolicy {
    AbusePolicy {
        toxicity_threshold: config.toxicity_threshold,
        profanity_threshold: config.profanity_threshold,
        failure_policy: config.failure_policy,
        language: config.classifier_language.clone(),
    }
}

pub async fn build_service(config: &Config) -> Result<ComplaintService> {
    let store = connect_store(config).await?;
    let classifier = build_classifier(config)?;
    Ok(ComplaintService::new(
        store,
        classifier,
        abuse_policy(config),
        RetryConfig::store_writes(config.store_write_retries),
    ))
}
