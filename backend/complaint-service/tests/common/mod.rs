#![allow(dead_code)]

use async_trait::async_trait;
use complaint_service::classifier::{AbuseClassifier, ClassifierError};
use complaint_service::models::{
    AbuseScores, Administration, Attachments, Governorate, NewComplaint, Submitter,
};
use complaint_service::services::{AbusePolicy, ComplaintService, FailurePolicy};
use complaint_service::InMemoryRecordStore;
use resilience::RetryConfig;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Classifier returning preset scores per exact text, zero otherwise.
#[derive(Default)]
pub struct ScriptedClassifier {
    scores: Mutex<HashMap<String, AbuseScores>>,
    failing: bool,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn script(&self, text: &str, toxicity: f32) {
        self.scores
            .lock()
            .unwrap()
            .insert(text.to_string(), AbuseScores::new(toxicity, 0.0, 0.0, 0.0));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AbuseClassifier for ScriptedClassifier {
    async fn analyze(&self, text: &str, _language: &str) -> Result<AbuseScores, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(ClassifierError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(self
            .scores
            .lock()
            .unwrap()
            .get(text)
            .copied()
            .unwrap_or_default())
    }
}

pub struct Harness {
    pub service: Arc<ComplaintService>,
    pub store: Arc<InMemoryRecordStore>,
    pub classifier: Arc<ScriptedClassifier>,
}

pub fn harness() -> Harness {
    harness_with(ScriptedClassifier::new(), FailurePolicy::FailOpen)
}

pub fn harness_with(classifier: ScriptedClassifier, failure_policy: FailurePolicy) -> Harness {
    let store = Arc::new(InMemoryRecordStore::new());
    let classifier = Arc::new(classifier);
    let service = ComplaintService::new(
        store.clone(),
        classifier.clone(),
        AbusePolicy {
            failure_policy,
            ..AbusePolicy::default()
        },
        RetryConfig::none(),
    );
    Harness {
        service: Arc::new(service),
        store,
        classifier,
    }
}

pub fn complaint_input(
    email: &str,
    governorate: Governorate,
    administration: Administration,
    description: &str,
) -> NewComplaint {
    NewComplaint {
        submitter_name: "Citizen".into(),
        email: email.into(),
        governorate,
        administration,
        description: description.into(),
        attachments: Attachments::default(),
    }
}

pub fn submitter(email: &str) -> Submitter {
    Submitter {
        account_id: Uuid::new_v4(),
        email: email.into(),
    }
}
