//! Domain events reflecting committed job mutations.
//!
//! Every committed change emits a [`JobEvent`] through the
//! [`super::EventBus`]. Presentation layers listen for `PickedUp` and
//! `Returned` to discard their local capture drafts for the job.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{ActorId, CaptureKind, ExtensionOrigin, ExtensionRequestId, JobId};

/// Domain event emitted after every committed mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum JobEvent {
    /// A job was added to the registry.
    JobRegistered {
        /// Job identifier.
        job_id: JobId,
        /// Registration timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Vehicle handed over; the access payload is now available.
    PickedUp {
        /// Job identifier.
        job_id: JobId,
        /// Staff member who processed the pickup.
        actor: ActorId,
        /// Odometer at pickup.
        odometer: Option<i64>,
        /// Pickup timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Vehicle recovered.
    Returned {
        /// Job identifier.
        job_id: JobId,
        /// Staff member who processed the return.
        actor: ActorId,
        /// Odometer at return.
        odometer: Option<i64>,
        /// Return timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A correction was appended to previously captured evidence.
    SnapshotCorrected {
        /// Job identifier.
        job_id: JobId,
        /// Transition whose evidence was corrected.
        kind: CaptureKind,
        /// Staff member who recorded the correction.
        actor: ActorId,
        /// Correction timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An extension request was submitted.
    ExtensionSubmitted {
        /// Job identifier.
        job_id: JobId,
        /// Request identifier.
        request_id: ExtensionRequestId,
        /// Who raised it.
        origin: ExtensionOrigin,
        /// Proposed return time.
        requested_return_time: NaiveDateTime,
        /// Quoted fee.
        fee: Decimal,
        /// Submission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An extension request was approved.
    ExtensionApproved {
        /// Job identifier.
        job_id: JobId,
        /// Request identifier.
        request_id: ExtensionRequestId,
        /// Approver.
        actor: ActorId,
        /// Approval timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An extension request was rejected.
    ExtensionRejected {
        /// Job identifier.
        job_id: JobId,
        /// Request identifier.
        request_id: ExtensionRequestId,
        /// Staff member who rejected it.
        actor: ActorId,
        /// Rejection timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Payment for an extension was recorded or changed.
    ExtensionPaymentRecorded {
        /// Job identifier.
        job_id: JobId,
        /// Request identifier.
        request_id: ExtensionRequestId,
        /// Amount collected.
        amount: Decimal,
        /// Recording timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl JobEvent {
    /// Returns the job ID associated with this event.
    #[must_use]
    pub fn job_id(&self) -> &JobId {
        match self {
            Self::JobRegistered { job_id, .. }
            | Self::PickedUp { job_id, .. }
            | Self::Returned { job_id, .. }
            | Self::SnapshotCorrected { job_id, .. }
            | Self::ExtensionSubmitted { job_id, .. }
            | Self::ExtensionApproved { job_id, .. }
            | Self::ExtensionRejected { job_id, .. }
            | Self::ExtensionPaymentRecorded { job_id, .. } => job_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::JobRegistered { .. } => "job_registered",
            Self::PickedUp { .. } => "picked_up",
            Self::Returned { .. } => "returned",
            Self::SnapshotCorrected { .. } => "snapshot_corrected",
            Self::ExtensionSubmitted { .. } => "extension_submitted",
            Self::ExtensionApproved { .. } => "extension_approved",
            Self::ExtensionRejected { .. } => "extension_rejected",
            Self::ExtensionPaymentRecorded { .. } => "extension_payment_recorded",
        }
    }
}
