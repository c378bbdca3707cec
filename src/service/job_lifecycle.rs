//! Job lifecycle service: pickup and return transitions.
//!
//! `Pending → PickedUp → Returned`, never skipping or reversing. Each
//! transition validates its condition snapshot and commits under the
//! job's write lock, so the snapshot, the actual timestamp, the state
//! flip, and (on pickup) the access payload become visible together.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    AccessPayload, ActorId, CaptureKind, ConditionSnapshot, EventBus, JobEvent, JobId,
    JobRegistry, JobState, RentalJob, SnapshotCorrection,
};
use crate::error::RentalError;
use crate::service::staff_role::{StaffRoleCheck, require_staff};
use crate::service::{AccessTokenIssuer, ConditionSnapshotValidator};

/// Orchestration layer for job transitions.
///
/// Every mutation follows the pattern: check role → acquire job lock →
/// check state → validate evidence → commit → release lock → emit event.
#[derive(Debug, Clone)]
pub struct JobLifecycle {
    registry: Arc<JobRegistry>,
    event_bus: EventBus,
    validator: ConditionSnapshotValidator,
    issuer: AccessTokenIssuer,
    roles: Arc<dyn StaffRoleCheck>,
}

impl JobLifecycle {
    /// Creates a new `JobLifecycle`.
    #[must_use]
    pub fn new(
        registry: Arc<JobRegistry>,
        event_bus: EventBus,
        validator: ConditionSnapshotValidator,
        issuer: AccessTokenIssuer,
        roles: Arc<dyn StaffRoleCheck>,
    ) -> Self {
        Self {
            registry,
            event_bus,
            validator,
            issuer,
            roles,
        }
    }

    /// Returns a reference to the inner [`JobRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Adds a freshly booked job to the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::Validation`] if the job is not pending or
    /// its ID is already taken.
    pub async fn register(&self, job: RentalJob) -> Result<JobId, RentalError> {
        job.ensure_state(JobState::Pending)
            .map_err(|e| RentalError::Validation(e.to_string()))?;
        let job_id = self.registry.insert(job).await?;
        let _ = self.event_bus.publish(JobEvent::JobRegistered {
            job_id: job_id.clone(),
            timestamp: Utc::now(),
        });
        tracing::info!(%job_id, "job registered");
        Ok(job_id)
    }

    /// Hands the vehicle over to the customer.
    ///
    /// Stores the pickup snapshot, stamps the actual pickup time and
    /// actor, moves the job to `PickedUp`, and issues its access payload.
    ///
    /// # Errors
    ///
    /// - [`RentalError::Forbidden`] if `actor` is not staff.
    /// - [`RentalError::JobNotFound`] for an unknown job.
    /// - [`RentalError::InvalidState`] unless the job is `Pending`.
    /// - [`RentalError::Validation`] if the snapshot is not a pickup
    ///   capture or was captured by someone other than `actor`, or
    ///   [`RentalError::IncompleteSnapshot`] if it is missing evidence.
    pub async fn process_pickup(
        &self,
        job_id: &JobId,
        snapshot: ConditionSnapshot,
        actor: ActorId,
    ) -> Result<RentalJob, RentalError> {
        require_staff(self.roles.as_ref(), &actor)?;

        let entry = self.registry.get(job_id).await?;
        let mut job = entry.write().await;
        self.check_transition(&job, JobState::Pending, CaptureKind::Pickup, &snapshot, &actor)?;

        let now = Utc::now();
        let odometer = snapshot.odometer;
        job.pickup_snapshot = Some(snapshot);
        job.actual_pickup_at = Some(now);
        job.picked_up_by = Some(actor.clone());
        job.state = JobState::PickedUp;
        if job.access_payload.is_none() {
            let payload = self.issuer.issue(&job);
            job.access_payload = Some(payload);
        }
        job.touch();
        let committed = job.clone();
        drop(job);

        let _ = self.event_bus.publish(JobEvent::PickedUp {
            job_id: job_id.clone(),
            actor: actor.clone(),
            odometer,
            timestamp: now,
        });
        tracing::info!(%job_id, %actor, "job picked up");
        Ok(committed)
    }

    /// Recovers the vehicle from the customer.
    ///
    /// # Errors
    ///
    /// Same as [`Self::process_pickup`], with `PickedUp` as the required
    /// state and a return capture as the required snapshot.
    pub async fn process_return(
        &self,
        job_id: &JobId,
        snapshot: ConditionSnapshot,
        actor: ActorId,
    ) -> Result<RentalJob, RentalError> {
        require_staff(self.roles.as_ref(), &actor)?;

        let entry = self.registry.get(job_id).await?;
        let mut job = entry.write().await;
        self.check_transition(&job, JobState::PickedUp, CaptureKind::Return, &snapshot, &actor)?;

        if let Some(pending) = job.pending_extension() {
            tracing::warn!(%job_id, request_id = %pending.id, "returning job with an unresolved extension");
        }

        let now = Utc::now();
        let odometer = snapshot.odometer;
        job.return_snapshot = Some(snapshot);
        job.actual_return_at = Some(now);
        job.returned_by = Some(actor.clone());
        job.state = JobState::Returned;
        job.touch();
        let committed = job.clone();
        drop(job);

        let _ = self.event_bus.publish(JobEvent::Returned {
            job_id: job_id.clone(),
            actor: actor.clone(),
            odometer,
            timestamp: now,
        });
        tracing::info!(%job_id, %actor, "job returned");
        Ok(committed)
    }

    /// Returns the evidence in force for a completed transition.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::JobNotFound`] for an unknown job and
    /// [`RentalError::NotAvailable`] if the transition has not happened.
    pub async fn view_confirmation(
        &self,
        job_id: &JobId,
        kind: CaptureKind,
    ) -> Result<ConditionSnapshot, RentalError> {
        let entry = self.registry.get(job_id).await?;
        let job = entry.read().await;
        tracing::debug!(%job_id, %kind, "confirmation requested");
        job.confirmation(kind)
            .cloned()
            .ok_or_else(|| RentalError::NotAvailable {
                job_id: job_id.clone(),
                kind,
            })
    }

    /// Returns the access payload of a picked-up job.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::JobNotFound`] for an unknown job and
    /// [`RentalError::NotAvailable`] before pickup.
    pub async fn access_payload(&self, job_id: &JobId) -> Result<AccessPayload, RentalError> {
        let entry = self.registry.get(job_id).await?;
        let job = entry.read().await;
        job.access_payload
            .clone()
            .ok_or_else(|| RentalError::NotAvailable {
                job_id: job_id.clone(),
                kind: CaptureKind::Pickup,
            })
    }

    /// Appends corrected evidence for a transition that already happened.
    ///
    /// The original snapshot and the actual timestamps stay as recorded;
    /// [`Self::view_confirmation`] returns the latest correction.
    ///
    /// # Errors
    ///
    /// - [`RentalError::Forbidden`] if `actor` is not staff.
    /// - [`RentalError::JobNotFound`] for an unknown job.
    /// - [`RentalError::NotAvailable`] if the transition has not happened.
    /// - [`RentalError::Validation`] for a blank reason, or
    ///   [`RentalError::IncompleteSnapshot`] for incomplete evidence.
    pub async fn record_correction(
        &self,
        job_id: &JobId,
        snapshot: ConditionSnapshot,
        actor: ActorId,
        reason: &str,
    ) -> Result<RentalJob, RentalError> {
        require_staff(self.roles.as_ref(), &actor)?;
        if reason.trim().is_empty() {
            return Err(RentalError::Validation(
                "a correction needs a reason".to_string(),
            ));
        }

        let entry = self.registry.get(job_id).await?;
        let mut job = entry.write().await;
        let kind = snapshot.kind;
        if job.snapshot(kind).is_none() {
            return Err(RentalError::NotAvailable {
                job_id: job_id.clone(),
                kind,
            });
        }
        self.validator.validate(&snapshot)?;

        let now = Utc::now();
        job.corrections.push(SnapshotCorrection {
            snapshot,
            reason: reason.trim().to_string(),
            recorded_by: actor.clone(),
            recorded_at: now,
        });
        job.touch();
        let committed = job.clone();
        drop(job);

        let _ = self.event_bus.publish(JobEvent::SnapshotCorrected {
            job_id: job_id.clone(),
            kind,
            actor: actor.clone(),
            timestamp: now,
        });
        tracing::info!(%job_id, %kind, %actor, "snapshot correction recorded");
        Ok(committed)
    }

    fn check_transition(
        &self,
        job: &RentalJob,
        required: JobState,
        kind: CaptureKind,
        snapshot: &ConditionSnapshot,
        actor: &ActorId,
    ) -> Result<(), RentalError> {
        if let Err(err) = job.ensure_state(required) {
            tracing::warn!(job_id = %job.id, %kind, state = %job.state, "transition refused");
            return Err(err);
        }
        if snapshot.kind != kind {
            return Err(RentalError::Validation(format!(
                "expected a {kind} snapshot, got a {} snapshot",
                snapshot.kind
            )));
        }
        if snapshot.captured_by != *actor {
            return Err(RentalError::Validation(format!(
                "{kind} snapshot captured by {} cannot be committed by {actor}",
                snapshot.captured_by
            )));
        }
        self.validator.validate(snapshot)
    }
}
