//! Complaint status transitions.
//!
//! Authorization runs in a fixed order: the role must be allowed to set the
//! target at all, the complaint must be inside the actor's write scope, an
//! abusive complaint may only stay rejected, and the move must be an edge of
//! the status graph.

use super::update_with_retry;
use super::visibility::write_scope;
use crate::error::{ComplaintError, Result};
use crate::metrics;
use crate::models::{Actor, Complaint, ComplaintStatus, ComplaintUpdate, Role};
use crate::store::RecordStore;
use resilience::RetryConfig;
use std::sync::Arc;
use uuid::Uuid;

/// Targets a role may ever set. Moderators only reject; governorate staff
/// and citizens never transition.
pub fn permitted_targets(role: Role) -> &'static [ComplaintStatus] {
    match role {
        Role::Department => &[
            ComplaintStatus::InProgress,
            ComplaintStatus::Resolved,
            ComplaintStatus::Rejected,
        ],
        Role::Moderator => &[ComplaintStatus::Rejected],
        Role::Governorate | Role::Citizen => &[],
    }
}

/// Role check that needs no stored state.
pub fn authorize_role(actor: &Actor, target: ComplaintStatus) -> Result<()> {
    if permitted_targets(actor.role).contains(&target) {
        Ok(())
    } else {
        Err(ComplaintError::Unauthorized(format!(
            "role {} cannot set status {}",
            actor.role, target
        )))
    }
}

/// Scope, abuse-flag and graph checks against the current record.
pub fn authorize_transition(
    actor: &Actor,
    complaint: &Complaint,
    target: ComplaintStatus,
) -> Result<()> {
    authorize_role(actor, target)?;

    if !write_scope(actor).permits(complaint) {
        return Err(ComplaintError::Unauthorized(format!(
            "complaint {} is outside the actor's scope",
            complaint.id
        )));
    }

    let invalid = || ComplaintError::InvalidTransition {
        from: complaint.status.to_string(),
        to: target.to_string(),
    };

    // Abuse rejections are reversed through the unflag path only.
    if complaint.is_abusive && target != ComplaintStatus::Rejected {
        return Err(invalid());
    }

    if !complaint.status.can_transition_to(target) {
        return Err(invalid());
    }

    Ok(())
}

pub struct LifecycleService {
    store: Arc<dyn RecordStore>,
    retry: RetryConfig,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn RecordStore>, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    /// Overwrite the status and audit fields in a single update.
    ///
    /// Re-applying the current status is accepted and still refreshes
    /// `updated_at` and `updated_by`.
    pub async fn transition(
        &self,
        id: Uuid,
        target: ComplaintStatus,
        actor: &Actor,
    ) -> Result<Complaint> {
        authorize_role(actor, target)?;

        let current = self.store.get_complaint(id).await?;
        authorize_transition(actor, &current, target)?;

        let update = ComplaintUpdate::by(actor.audit_identity()).status(target);
        let updated = update_with_retry(self.store.as_ref(), &self.retry, id, &update).await?;

        metrics::record_transition(target.as_str());
        tracing::info!(
            complaint_id = %id,
            from = %current.status,
            to = %target,
            actor = %update.updated_by,
            "Complaint status changed"
        );

        Ok(updated)
    }
}
