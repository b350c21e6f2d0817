//! Perspective-style comment analysis over HTTP

use super::{AbuseClassifier, ClassifierError};
use crate::models::AbuseScores;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str =
    "https://commentanalyzer.googleapis.com/v1alpha1/comments:analyze";

const TOXICITY: &str = "TOXICITY";
const PROFANITY: &str = "PROFANITY";
const THREAT: &str = "THREAT";
const INSULT: &str = "INSULT";

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(rename = "attributeScores", default)]
    attribute_scores: HashMap<String, AttributeScore>,
}

#[derive(Debug, Deserialize)]
struct AttributeScore {
    #[serde(rename = "summaryScore")]
    summary_score: SummaryScore,
}

#[derive(Debug, Deserialize)]
struct SummaryScore {
    value: f32,
}

impl AnalyzeResponse {
    /// Attributes the service did not score count as 0.0.
    fn scores(&self) -> AbuseScores {
        let score = |name: &str| {
            self.attribute_scores
                .get(name)
                .map(|a| a.summary_score.value)
                .unwrap_or(0.0)
        };
        AbuseScores::new(score(TOXICITY), score(PROFANITY), score(THREAT), score(INSULT))
    }
}

pub struct PerspectiveClassifier {
    client: HttpClient,
    endpoint: String,
    api_key: String,
}

impl PerspectiveClassifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl AbuseClassifier for PerspectiveClassifier {
    async fn analyze(&self, text: &str, language: &str) -> Result<AbuseScores, ClassifierError> {
        let body = serde_json::json!({
            "comment": { "text": text },
            "languages": [language],
            "requestedAttributes": {
                "TOXICITY": {},
                "PROFANITY": {},
                "THREAT": {},
                "INSULT": {},
            },
            "doNotStore": true,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Malformed(e.to_string()))?;

        let scores = parsed.scores();
        tracing::debug!(
            toxicity = scores.toxicity,
            profanity = scores.profanity,
            threat = scores.threat,
            insult = scores.insult,
            "Text analyzed"
        );

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn classifier(server: &MockServer) -> PerspectiveClassifier {
        PerspectiveClassifier::new(
            format!("{}/v1alpha1/comments:analyze", server.uri()),
            "test-key",
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_reads_summary_scores() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1alpha1/comments:analyze"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({ "languages": ["ar"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "attributeScores": {
                    "TOXICITY": { "summaryScore": { "value": 0.91, "type": "PROBABILITY" } },
                    "PROFANITY": { "summaryScore": { "value": 0.2, "type": "PROBABILITY" } },
                    "INSULT": { "summaryScore": { "value": 0.5, "type": "PROBABILITY" } }
                },
                "languages": ["ar"]
            })))
            .mount(&server)
            .await;

        let scores = classifier(&server).analyze("نص", "ar").await.unwrap();
        assert!((scores.toxicity - 0.91).abs() < f32::EPSILON);
        assert!((scores.profanity - 0.2).abs() < f32::EPSILON);
        assert_eq!(scores.threat, 0.0);
        assert!((scores.insult - 0.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let err = classifier(&server).analyze("text", "ar").await.unwrap_err();
        assert!(matches!(err, ClassifierError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let classifier = PerspectiveClassifier::new(
            "http://127.0.0.1:9/analyze",
            "k",
            Duration::from_millis(200),
        )
        .unwrap();
        let err = classifier.analyze("text", "ar").await.unwrap_err();
        assert!(matches!(err, ClassifierError::Transport(_)));
    }
}
