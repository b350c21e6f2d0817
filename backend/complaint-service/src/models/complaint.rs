use super::{Administration, Governorate};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

stored_enum! {
    /// Complaint lifecycle status with its canonical stored label.
    pub enum ComplaintStatus: "complaint status" {
        /// Initial state, waiting for review
        Submitted => "قيد المراجعة",
        InProgress => "قيد التنفيذ",
        Resolved => "تم الحل",
        Rejected => "مرفوضة",
    }
}

impl ComplaintStatus {
    /// Validate state transition.
    ///
    /// submitted -> in-progress -> {resolved, rejected}; submitted -> rejected.
    /// Resolved and rejected have no way out; an abuse rejection is reversed
    /// by unflagging. Re-applying the current status is always accepted.
    pub fn can_transition_to(&self, next: ComplaintStatus) -> bool {
        *self == next
            || matches!(
                (self, next),
                (ComplaintStatus::Submitted, ComplaintStatus::InProgress)
                    | (ComplaintStatus::Submitted, ComplaintStatus::Rejected)
                    | (ComplaintStatus::InProgress, ComplaintStatus::Resolved)
                    | (ComplaintStatus::InProgress, ComplaintStatus::Rejected)
            )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Rejected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Attachment payloads; opaque to the moderation engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachments {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

/// Complaint record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: Uuid,
    /// Citizen-facing reference, assigned once at creation
    pub complaint_id: String,
    pub submitter_name: String,
    pub email: String,
    pub submitter_id: Option<Uuid>,
    pub governorate: Governorate,
    pub administration: Administration,
    pub description: String,
    pub attachments: Attachments,
    pub status: ComplaintStatus,
    pub is_abusive: bool,
    pub is_duplicate: bool,
    pub reviewed: bool,
    pub original_complaint_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl Complaint {
    pub fn is_anonymous(&self) -> bool {
        self.submitter_id.is_none()
    }
}

/// Submission payload from the intake form
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewComplaint {
    #[validate(length(min = 1, max = 200))]
    pub submitter_name: String,
    #[validate(email)]
    pub email: String,
    pub governorate: Governorate,
    pub administration: Administration,
    #[validate(length(min = 1, max = 10000))]
    pub description: String,
    #[serde(default)]
    pub attachments: Attachments,
}

/// Fully prepared row handed to the store on insert.
#[derive(Debug, Clone)]
pub struct ComplaintDraft {
    pub complaint_id: String,
    pub submitter_name: String,
    pub email: String,
    pub submitter_id: Option<Uuid>,
    pub governorate: Governorate,
    pub administration: Administration,
    pub description: String,
    pub attachments: Attachments,
}

impl ComplaintDraft {
    pub fn new(input: NewComplaint, submitter_id: Option<Uuid>) -> Self {
        Self {
            complaint_id: generate_complaint_id(),
            submitter_name: input.submitter_name.trim().to_string(),
            email: input.email.trim().to_string(),
            submitter_id,
            governorate: input.governorate,
            administration: input.administration,
            description: input.description,
            attachments: input.attachments,
        }
    }
}

/// Partial update of a complaint. `updated_at` is always refreshed by the store.
///
/// `complaint_id` and the routing fields are not updatable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplaintUpdate {
    pub updated_by: String,
    pub status: Option<ComplaintStatus>,
    pub description: Option<String>,
    pub is_abusive: Option<bool>,
    pub is_duplicate: Option<bool>,
    pub reviewed: Option<bool>,
    pub original_complaint_id: Option<Option<Uuid>>,
}

impl ComplaintUpdate {
    pub fn by(updated_by: impl Into<String>) -> Self {
        Self {
            updated_by: updated_by.into(),
            ..Self::default()
        }
    }

    pub fn status(mut self, status: ComplaintStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn duplicate(mut self, is_duplicate: bool, original: Option<Uuid>) -> Self {
        self.is_duplicate = Some(is_duplicate);
        self.reviewed = Some(is_duplicate);
        self.original_complaint_id = Some(original);
        self
    }

    /// Apply onto an in-memory copy.
    pub fn apply_to(&self, complaint: &mut Complaint, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            complaint.status = status;
        }
        if let Some(description) = &self.description {
            complaint.description = description.clone();
        }
        if let Some(is_abusive) = self.is_abusive {
            complaint.is_abusive = is_abusive;
        }
        if let Some(is_duplicate) = self.is_duplicate {
            complaint.is_duplicate = is_duplicate;
        }
        if let Some(reviewed) = self.reviewed {
            complaint.reviewed = reviewed;
        }
        if let Some(original) = self.original_complaint_id {
            complaint.original_complaint_id = original;
        }
        complaint.updated_at = now;
        complaint.updated_by = Some(self.updated_by.clone());
    }
}

/// Six-digit citizen-facing reference. Not guaranteed unique.
pub fn generate_complaint_id() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_transitions() {
        use ComplaintStatus::*;
        assert!(Submitted.can_transition_to(InProgress));
        assert!(Submitted.can_transition_to(Rejected));
        assert!(InProgress.can_transition_to(Resolved));
        assert!(InProgress.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Submitted));
        assert!(!Rejected.can_transition_to(InProgress));
        assert!(!Submitted.can_transition_to(Resolved));
        assert!(!Resolved.can_transition_to(InProgress));
        assert!(!Resolved.can_transition_to(Rejected));
        assert!(Resolved.can_transition_to(Resolved));
    }

    #[test]
    fn test_status_labels_round_trip() {
        for status in ComplaintStatus::ALL {
            let label = status.as_str();
            assert_eq!(ComplaintStatus::from_str(label).unwrap(), *status);
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", label));
        }
        assert!(ComplaintStatus::from_str("pending").is_err());
    }

    #[test]
    fn test_complaint_id_is_six_digits() {
        for _ in 0..100 {
            let id = generate_complaint_id();
            assert_eq!(id.len(), 6);
            assert!(id.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_new_complaint_validation() {
        let input = NewComplaint {
            submitter_name: "Mona".into(),
            email: "not-an-email".into(),
            governorate: Governorate::Giza,
            administration: Administration::Health,
            description: "Clinic closed".into(),
            attachments: Attachments::default(),
        };
        assert!(input.validate().is_err());

        let valid = NewComplaint {
            email: "mona@example.com".into(),
            ..input
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_duplicate_update_sets_reviewed() {
        let original = Uuid::new_v4();
        let update = ComplaintUpdate::by("mod").duplicate(true, Some(original));
        assert_eq!(update.is_duplicate, Some(true));
        assert_eq!(update.reviewed, Some(true));
        assert_eq!(update.original_complaint_id, Some(Some(original)));

        let cleared = ComplaintUpdate::by("mod").duplicate(false, None);
        assert_eq!(cleared.reviewed, Some(false));
        assert_eq!(cleared.original_complaint_id, Some(None));
    }
}
