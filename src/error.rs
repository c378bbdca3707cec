//! Rental core error types with stable error-code mapping.
//!
//! [`RentalError`] is the central error type for the crate. Every variant
//! folds into one [`ErrorKind`] so that thin UI/API layers can choose a
//! user-facing message without matching on every variant, and carries a
//! stable numeric code for logs and client payloads.

use serde::Serialize;

use crate::domain::{ActorId, CaptureKind, ExtensionRequestId, JobId};
use crate::service::snapshot_validator::SnapshotIssue;

/// Coarse error category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or incomplete input.
    Validation,
    /// Transition attempted from a state that does not permit it.
    InvalidState,
    /// Unknown job or extension request.
    NotFound,
    /// Presented identity does not match the job holder.
    Authentication,
    /// Confirmation requested before the transition occurred.
    NotAvailable,
    /// Actor lacks the staff role required for the operation.
    Forbidden,
    /// Optimistic write lost against a concurrent writer.
    Conflict,
    /// Unexpected internal failure.
    Internal,
}

/// Structured error body handed to presentation layers.
///
/// ```json
/// {
///   "code": 3001,
///   "kind": "invalid_state",
///   "message": "job JOB-2025-001 is picked_up; expected pending"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
}

/// Crate-wide error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category       |
/// |-----------|----------------|
/// | 1000–1999 | Validation     |
/// | 2000–2999 | Not Found      |
/// | 3000–3999 | State/Conflict |
/// | 4000–4999 | Auth           |
/// | 5000–5999 | Availability   |
/// | 9000–9999 | Internal       |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RentalError {
    /// Input validation failed.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Condition snapshot is missing required evidence.
    #[error("incomplete condition snapshot: {0}")]
    IncompleteSnapshot(SnapshotIssue),

    /// Job is not in a state that permits the requested transition.
    #[error("job {job_id} is {actual}; expected {expected}")]
    InvalidState {
        /// Job identifier.
        job_id: JobId,
        /// State the operation requires.
        expected: String,
        /// State the job is actually in.
        actual: String,
    },

    /// A pending extension request already exists for the job.
    #[error("job {0} already has a pending extension request")]
    DuplicatePendingExtension(JobId),

    /// Extension request is not in a state that permits the operation.
    #[error("extension request {request_id} is {actual}; expected {expected}")]
    ExtensionState {
        /// Extension request identifier.
        request_id: ExtensionRequestId,
        /// State the operation requires.
        expected: String,
        /// State the request is actually in.
        actual: String,
    },

    /// Job with the given identifier was not found.
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    /// Extension request with the given identifier was not found.
    #[error("extension request not found: {0}")]
    ExtensionNotFound(ExtensionRequestId),

    /// Presented contact identifier does not match the job holder.
    #[error("identity check failed for job {0}")]
    Authentication(JobId),

    /// Confirmation for a transition that has not happened yet.
    #[error("{kind} confirmation not available for job {job_id}")]
    NotAvailable {
        /// Job identifier.
        job_id: JobId,
        /// Transition that was requested.
        kind: CaptureKind,
    },

    /// Actor is not a member of the staff role.
    #[error("actor {0} is not authorised for staff operations")]
    Forbidden(ActorId),

    /// Optimistic write rejected because the stored version moved on.
    #[error("job {job_id} was modified concurrently (expected version {expected}, found {found})")]
    Conflict {
        /// Job identifier.
        job_id: JobId,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        found: u64,
    },

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RentalError {
    /// Returns the coarse category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::IncompleteSnapshot(_) => ErrorKind::Validation,
            Self::InvalidState { .. }
            | Self::DuplicatePendingExtension(_)
            | Self::ExtensionState { .. } => ErrorKind::InvalidState,
            Self::JobNotFound(_) | Self::ExtensionNotFound(_) => ErrorKind::NotFound,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::NotAvailable { .. } => ErrorKind::NotAvailable,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::IncompleteSnapshot(_) => 1002,
            Self::JobNotFound(_) => 2001,
            Self::ExtensionNotFound(_) => 2002,
            Self::InvalidState { .. } => 3001,
            Self::DuplicatePendingExtension(_) => 3002,
            Self::ExtensionState { .. } => 3003,
            Self::Conflict { .. } => 3009,
            Self::Authentication(_) => 4001,
            Self::Forbidden(_) => 4003,
            Self::NotAvailable { .. } => 5001,
            Self::Internal(_) => 9000,
        }
    }

    /// Converts the error into the structured body shown to users.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.error_code(),
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_errors_share_kind() {
        let dup = RentalError::DuplicatePendingExtension(JobId::from("JOB-1"));
        let state = RentalError::InvalidState {
            job_id: JobId::from("JOB-1"),
            expected: "pending".to_string(),
            actual: "picked_up".to_string(),
        };
        assert_eq!(dup.kind(), ErrorKind::InvalidState);
        assert_eq!(state.kind(), ErrorKind::InvalidState);
        assert_ne!(dup.error_code(), state.error_code());
    }

    #[test]
    fn body_carries_message_and_code() {
        let err = RentalError::NotAvailable {
            job_id: JobId::from("JOB-9"),
            kind: CaptureKind::Return,
        };
        let body = err.to_body();
        assert_eq!(body.code, 5001);
        assert_eq!(body.kind, ErrorKind::NotAvailable);
        assert!(body.message.contains("JOB-9"));
        assert!(body.message.contains("return"));
    }

    #[test]
    fn body_serializes_snake_case_kind() {
        let body = RentalError::Authentication(JobId::from("JOB-2")).to_body();
        let json = serde_json::to_string(&body).unwrap_or_default();
        assert!(json.contains("\"kind\":\"authentication\""));
        assert!(json.contains("4001"));
    }
}
