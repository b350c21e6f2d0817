use crate::error::{ComplaintError, Result};
use crate::services::FailurePolicy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub http_port: u16,

    // Database configuration; absent means the in-memory store
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub store_write_retries: u32,

    // Classifier configuration
    pub perspective_api_key: Option<String>,
    pub perspective_api_url: String,
    pub classifier_language: String,
    pub classifier_timeout_ms: u64,
    pub failure_policy: FailurePolicy,
    pub sensitive_words_path: Option<String>,

    // Moderation thresholds
    pub toxicity_threshold: f32,
    pub profanity_threshold: f32,

    // Service configuration
    pub service_name: String,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            http_port: parse_var("HTTP_PORT", 8090)?,
            database_url: optional_var("DATABASE_URL"),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 20)?,
            store_write_retries: parse_var("STORE_WRITE_RETRIES", 2)?,
            perspective_api_key: optional_var("PERSPECTIVE_API_KEY"),
            perspective_api_url: env::var("PERSPECTIVE_API_URL")
                .unwrap_or_else(|_| crate::classifier::perspective::DEFAULT_ENDPOINT.to_string()),
            classifier_language: env::var("CLASSIFIER_LANGUAGE")
                .unwrap_or_else(|_| "ar".to_string()),
            classifier_timeout_ms: parse_var("CLASSIFIER_TIMEOUT_MS", 3000)?,
            failure_policy: parse_var("CLASSIFIER_FAILURE_POLICY", FailurePolicy::FailOpen)?,
            sensitive_words_path: optional_var("SENSITIVE_WORDS_PATH"),
            toxicity_threshold: parse_var("TOXICITY_THRESHOLD", 0.7)?,
            profanity_threshold: parse_var("PROFANITY_THRESHOLD", 0.7)?,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "complaint-service".to_string()),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("TOXICITY_THRESHOLD", self.toxicity_threshold),
            ("PROFANITY_THRESHOLD", self.profanity_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ComplaintError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.db_max_connections == 0 {
            return Err(ComplaintError::Config(
                "DB_MAX_CONNECTIONS must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ComplaintError::Config(format!("invalid {}={:?}: {}", name, raw, e))),
        Err(_) => Ok(default),
    }
}
