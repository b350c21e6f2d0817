use super::{Administration, Governorate, Submitter};
use uuid::Uuid;

stored_enum! {
    /// Fixed set of roles understood by the engine.
    pub enum Role: "role" {
        Citizen => "citizen",
        Department => "department",
        Governorate => "governorate",
        Moderator => "moderator",
    }
}

/// Caller identity and scope, passed explicitly into every operation.
///
/// Scope attributes are optional because they arrive from an upstream
/// gateway; visibility rules fail closed when a required one is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Option<Uuid>,
    pub email: Option<String>,
    pub role: Role,
    pub administration: Option<Administration>,
    pub governorate: Option<Governorate>,
}

impl Actor {
    /// Authenticated citizen
    pub fn citizen(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            email: Some(email.into()),
            role: Role::Citizen,
            administration: None,
            governorate: None,
        }
    }

    /// Unauthenticated citizen identified only by email
    pub fn anonymous(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: Some(email.into()),
            role: Role::Citizen,
            administration: None,
            governorate: None,
        }
    }

    pub fn department(id: Uuid, administration: Administration, governorate: Governorate) -> Self {
        Self {
            id: Some(id),
            email: None,
            role: Role::Department,
            administration: Some(administration),
            governorate: Some(governorate),
        }
    }

    pub fn governorate_staff(id: Uuid, governorate: Governorate) -> Self {
        Self {
            id: Some(id),
            email: None,
            role: Role::Governorate,
            administration: None,
            governorate: Some(governorate),
        }
    }

    pub fn moderator(id: Uuid) -> Self {
        Self {
            id: Some(id),
            email: None,
            role: Role::Moderator,
            administration: None,
            governorate: None,
        }
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }

    /// Value written to `updated_by`.
    pub fn audit_identity(&self) -> String {
        match (&self.id, &self.email) {
            (Some(id), _) => format!("{}:{}", self.role, id),
            (None, Some(email)) => format!("{}:{}", self.role, email),
            (None, None) => format!("{}:anonymous", self.role),
        }
    }

    /// Submitter account for an authenticated citizen.
    pub fn as_submitter(&self) -> Option<Submitter> {
        match (self.role, self.id, &self.email) {
            (Role::Citizen, Some(account_id), Some(email)) => Some(Submitter {
                account_id,
                email: email.clone(),
            }),
            _ => None,
        }
    }
}
