//! Rental job aggregate: agreed window, lifecycle state, and evidence.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    AccessPayload, ActorId, ApprovalState, CaptureKind, ConditionSnapshot, ExtensionRequest,
    ExtensionRequestId, JobId, SnapshotCorrection,
};
use crate::error::RentalError;

/// Lifecycle state of a job. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Booked, awaiting pickup.
    Pending,
    /// Vehicle is with the customer.
    PickedUp,
    /// Vehicle recovered; terminal.
    Returned,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::PickedUp => f.write_str("picked_up"),
            Self::Returned => f.write_str("returned"),
        }
    }
}

/// A single rental job.
///
/// `actual_pickup_at` is set iff the state is `PickedUp` or `Returned`;
/// `actual_return_at` is set iff the state is `Returned`. Both are
/// written once by [`crate::service::JobLifecycle`] and never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalJob {
    /// Job identifier (immutable).
    pub id: JobId,
    /// Holder's name.
    pub customer_name: String,
    /// Holder's contact identifier (phone number).
    pub contact: String,
    /// Plate of the vehicle assigned to the job.
    pub vehicle_plate: String,
    /// Agreed start of the rental, fleet wall-clock.
    pub ordered_start: NaiveDateTime,
    /// Agreed return time, fleet wall-clock.
    pub ordered_end: NaiveDateTime,
    /// Security deposit held for the job.
    pub deposit: Decimal,
    /// Lifecycle state.
    pub state: JobState,
    /// When the vehicle was handed over.
    pub actual_pickup_at: Option<DateTime<Utc>>,
    /// Staff member who processed the pickup.
    pub picked_up_by: Option<ActorId>,
    /// When the vehicle was recovered.
    pub actual_return_at: Option<DateTime<Utc>>,
    /// Staff member who processed the return.
    pub returned_by: Option<ActorId>,
    /// Evidence captured at pickup.
    pub pickup_snapshot: Option<ConditionSnapshot>,
    /// Evidence captured at return.
    pub return_snapshot: Option<ConditionSnapshot>,
    /// Corrections appended after a transition, oldest first.
    pub corrections: Vec<SnapshotCorrection>,
    /// Extension requests in submission order.
    pub extension_requests: Vec<ExtensionRequest>,
    /// Access payload, issued on first pickup.
    pub access_payload: Option<AccessPayload>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last committed mutation.
    pub last_modified_at: DateTime<Utc>,
    /// Incremented on every committed mutation; used for optimistic writes.
    pub version: u64,
}

impl RentalJob {
    /// Creates a pending job.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::Validation`] if the identifier or contact is
    /// blank, the agreed window is empty or reversed, or the deposit is
    /// negative.
    pub fn new(
        id: JobId,
        customer_name: impl Into<String>,
        contact: impl Into<String>,
        vehicle_plate: impl Into<String>,
        ordered_start: NaiveDateTime,
        ordered_end: NaiveDateTime,
        deposit: Decimal,
    ) -> Result<Self, RentalError> {
        let contact = contact.into();
        if id.as_str().trim().is_empty() {
            return Err(RentalError::Validation("job id must not be blank".to_string()));
        }
        if contact.trim().is_empty() {
            return Err(RentalError::Validation(format!(
                "job {id} needs a holder contact"
            )));
        }
        if ordered_end <= ordered_start {
            return Err(RentalError::Validation(format!(
                "job {id} return time {ordered_end} must be after start {ordered_start}"
            )));
        }
        if deposit.is_sign_negative() {
            return Err(RentalError::Validation(format!(
                "job {id} deposit must not be negative"
            )));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            customer_name: customer_name.into(),
            contact,
            vehicle_plate: vehicle_plate.into(),
            ordered_start,
            ordered_end,
            deposit,
            state: JobState::Pending,
            actual_pickup_at: None,
            picked_up_by: None,
            actual_return_at: None,
            returned_by: None,
            pickup_snapshot: None,
            return_snapshot: None,
            corrections: Vec::new(),
            extension_requests: Vec::new(),
            access_payload: None,
            created_at: now,
            last_modified_at: now,
            version: 0,
        })
    }

    /// Fails unless the job is in `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::InvalidState`] on mismatch.
    pub fn ensure_state(&self, expected: JobState) -> Result<(), RentalError> {
        if self.state == expected {
            return Ok(());
        }
        Err(RentalError::InvalidState {
            job_id: self.id.clone(),
            expected: expected.to_string(),
            actual: self.state.to_string(),
        })
    }

    /// Checks that `amended` only changes descriptive fields of this job.
    ///
    /// The holder name and vehicle plate may be edited. The identifier,
    /// contact, agreed window, and deposit are fixed at registration;
    /// lifecycle state, actual timestamps, evidence, corrections,
    /// extension requests, and the access payload are owned by the
    /// lifecycle and extension services.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::InvalidState`] if `amended` carries a
    /// different lifecycle state, or [`RentalError::Validation`] naming
    /// the first protected field that differs.
    pub fn check_amendment(&self, amended: &Self) -> Result<(), RentalError> {
        if amended.state != self.state {
            return Err(RentalError::InvalidState {
                job_id: self.id.clone(),
                expected: self.state.to_string(),
                actual: amended.state.to_string(),
            });
        }
        let protected = [
            ("id", amended.id == self.id),
            ("contact", amended.contact == self.contact),
            ("ordered_start", amended.ordered_start == self.ordered_start),
            ("ordered_end", amended.ordered_end == self.ordered_end),
            ("deposit", amended.deposit == self.deposit),
            ("actual_pickup_at", amended.actual_pickup_at == self.actual_pickup_at),
            ("picked_up_by", amended.picked_up_by == self.picked_up_by),
            ("actual_return_at", amended.actual_return_at == self.actual_return_at),
            ("returned_by", amended.returned_by == self.returned_by),
            ("pickup_snapshot", amended.pickup_snapshot == self.pickup_snapshot),
            ("return_snapshot", amended.return_snapshot == self.return_snapshot),
            ("corrections", amended.corrections == self.corrections),
            ("extension_requests", amended.extension_requests == self.extension_requests),
            ("access_payload", amended.access_payload == self.access_payload),
            ("created_at", amended.created_at == self.created_at),
        ];
        match protected.iter().find(|(_, unchanged)| !unchanged) {
            Some((field, _)) => Err(RentalError::Validation(format!(
                "job {} field {field} cannot be amended",
                self.id
            ))),
            None => Ok(()),
        }
    }

    /// Stamps a committed mutation.
    pub fn touch(&mut self) {
        self.version = self.version.saturating_add(1);
        self.last_modified_at = Utc::now();
    }

    /// Returns the original evidence stored for a transition.
    #[must_use]
    pub fn snapshot(&self, kind: CaptureKind) -> Option<&ConditionSnapshot> {
        match kind {
            CaptureKind::Pickup => self.pickup_snapshot.as_ref(),
            CaptureKind::Return => self.return_snapshot.as_ref(),
        }
    }

    /// Returns the evidence currently in force for a transition: the
    /// latest correction if any, else the original snapshot.
    #[must_use]
    pub fn confirmation(&self, kind: CaptureKind) -> Option<&ConditionSnapshot> {
        self.corrections
            .iter()
            .rev()
            .map(|c| &c.snapshot)
            .find(|s| s.kind == kind)
            .or_else(|| self.snapshot(kind))
    }

    /// Returns the outstanding pending extension request, if any.
    #[must_use]
    pub fn pending_extension(&self) -> Option<&ExtensionRequest> {
        self.extension_requests.iter().find(|r| r.is_pending())
    }

    /// Looks up an extension request by identifier.
    #[must_use]
    pub fn extension(&self, request_id: ExtensionRequestId) -> Option<&ExtensionRequest> {
        self.extension_requests.iter().find(|r| r.id == request_id)
    }

    /// Mutable lookup of an extension request.
    pub fn extension_mut(
        &mut self,
        request_id: ExtensionRequestId,
    ) -> Option<&mut ExtensionRequest> {
        self.extension_requests
            .iter_mut()
            .find(|r| r.id == request_id)
    }

    /// Return time in force: the most recently approved extension, or
    /// the agreed return time when none has been approved.
    #[must_use]
    pub fn effective_return_time(&self) -> NaiveDateTime {
        self.extension_requests
            .iter()
            .rev()
            .find(|r| r.state == ApprovalState::Approved)
            .map_or(self.ordered_end, |r| r.requested_return_time)
    }

    /// Sum of fees for approved extensions.
    #[must_use]
    pub fn approved_extension_fees(&self) -> Decimal {
        self.extension_requests
            .iter()
            .filter(|r| r.state == ApprovalState::Approved)
            .map(|r| r.calculation.fee)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Returns `true` if `presented` matches the holder contact, ignoring
    /// case and surrounding whitespace.
    #[must_use]
    pub fn holder_matches(&self, presented: &str) -> bool {
        normalize_contact(presented) == normalize_contact(&self.contact)
    }
}

/// Canonical form of a contact identifier for comparisons and checksums.
#[must_use]
pub fn normalize_contact(contact: &str) -> String {
    contact.trim().to_lowercase()
}

/// Lightweight summary of a job for list and search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    /// Job identifier.
    pub id: JobId,
    /// Holder's name.
    pub customer_name: String,
    /// Holder's contact identifier.
    pub contact: String,
    /// Lifecycle state.
    pub state: JobState,
    /// Return time in force.
    pub effective_return_time: NaiveDateTime,
    /// Whether an extension awaits a decision.
    pub has_pending_extension: bool,
}

impl From<&RentalJob> for JobSummary {
    fn from(job: &RentalJob) -> Self {
        Self {
            id: job.id.clone(),
            customer_name: job.customer_name.clone(),
            contact: job.contact.clone(),
            state: job.state,
            effective_return_time: job.effective_return_time(),
            has_pending_extension: job.pending_extension().is_some(),
        }
    }
}
