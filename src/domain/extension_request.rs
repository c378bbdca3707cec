//! Requests to move a job's return time later, with their pricing.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ActorId, ExtensionRequestId, JobId};
use crate::error::RentalError;
use crate::pricing::ExtensionCalculation;

/// Who raised the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionOrigin {
    /// Raised by the customer from the self-service view.
    Customer,
    /// Raised by staff at the counter, usually during return.
    Staff,
}

/// Approval state of an extension request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    /// Awaiting a staff decision.
    Pending,
    /// Accepted by staff.
    Approved,
    /// Declined by staff.
    Rejected,
}

impl fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Approved => f.write_str("approved"),
            Self::Rejected => f.write_str("rejected"),
        }
    }
}

/// A priced request to extend a job's return time.
///
/// The reference return time is snapshotted at submission for audit; it
/// is never recomputed even if later extensions are approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRequest {
    /// Request identifier.
    pub id: ExtensionRequestId,
    /// Job the request belongs to.
    pub job_id: JobId,
    /// Return time in force when the request was raised.
    pub reference_return_time: NaiveDateTime,
    /// Proposed new return time.
    pub requested_return_time: NaiveDateTime,
    /// Derived duration, rate bucket and fee.
    pub calculation: ExtensionCalculation,
    /// Who raised the request.
    pub origin: ExtensionOrigin,
    /// Actor who raised the request.
    pub requested_by: ActorId,
    /// Submission timestamp.
    pub requested_at: DateTime<Utc>,
    /// Approval state.
    pub state: ApprovalState,
    /// Amount collected from the customer, once paid.
    pub collected_amount: Option<Decimal>,
    /// Staff member who approved or rejected the request.
    pub resolved_by: Option<ActorId>,
    /// When the request was approved or rejected.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ExtensionRequest {
    /// Creates a pending request.
    #[must_use]
    pub fn new(
        job_id: JobId,
        reference_return_time: NaiveDateTime,
        requested_return_time: NaiveDateTime,
        calculation: ExtensionCalculation,
        origin: ExtensionOrigin,
        requested_by: ActorId,
    ) -> Self {
        Self {
            id: ExtensionRequestId::new(),
            job_id,
            reference_return_time,
            requested_return_time,
            calculation,
            origin,
            requested_by,
            requested_at: Utc::now(),
            state: ApprovalState::Pending,
            collected_amount: None,
            resolved_by: None,
            resolved_at: None,
        }
    }

    /// Returns `true` while awaiting a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == ApprovalState::Pending
    }

    /// Marks the request approved.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::ExtensionState`] unless the request is pending.
    pub fn approve(&mut self, resolved_by: ActorId) -> Result<(), RentalError> {
        self.resolve(ApprovalState::Approved, resolved_by)
    }

    /// Marks the request rejected.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::ExtensionState`] unless the request is pending.
    pub fn reject(&mut self, resolved_by: ActorId) -> Result<(), RentalError> {
        self.resolve(ApprovalState::Rejected, resolved_by)
    }

    fn resolve(&mut self, outcome: ApprovalState, resolved_by: ActorId) -> Result<(), RentalError> {
        if !self.is_pending() {
            return Err(self.state_error("pending"));
        }
        self.state = outcome;
        self.resolved_by = Some(resolved_by);
        self.resolved_at = Some(Utc::now());
        Ok(())
    }

    /// Records the amount collected for this extension.
    ///
    /// Approved requests accept a payment from any origin. A pending
    /// staff-originated request is settled at the counter: recording its
    /// payment approves it on behalf of the staff member who raised it.
    ///
    /// Returns `false` when the same amount was already recorded.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::Validation`] for a negative amount and
    /// [`RentalError::ExtensionState`] for rejected requests or pending
    /// customer requests.
    pub fn record_payment(&mut self, amount: Decimal) -> Result<bool, RentalError> {
        if amount.is_sign_negative() {
            return Err(RentalError::Validation(format!(
                "collected amount must not be negative: {amount}"
            )));
        }
        match (self.state, self.origin) {
            (ApprovalState::Approved, _) => {}
            (ApprovalState::Pending, ExtensionOrigin::Staff) => {
                let by = self.requested_by.clone();
                self.resolve(ApprovalState::Approved, by)?;
            }
            _ => return Err(self.state_error("approved")),
        }
        if self.collected_amount == Some(amount) {
            return Ok(false);
        }
        self.collected_amount = Some(amount);
        Ok(true)
    }

    fn state_error(&self, expected: &str) -> RentalError {
        RentalError::ExtensionState {
            request_id: self.id,
            expected: expected.to_string(),
            actual: self.state.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::pricing::{PricingStrategy, TimeExtensionCalculator};
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        let Some(t) = NaiveDate::from_ymd_opt(2025, 1, day).and_then(|d| d.and_hms_opt(hour, 0, 0))
        else {
            panic!("valid timestamp");
        };
        t
    }

    fn make_request(origin: ExtensionOrigin) -> ExtensionRequest {
        let calculator = TimeExtensionCalculator::default();
        let Some(calc) = calculator.compute(PricingStrategy::Hourly, at(15, 18), at(15, 21)) else {
            panic!("expected a valid extension");
        };
        ExtensionRequest::new(
            JobId::from("JOB-1"),
            at(15, 18),
            at(15, 21),
            calc,
            origin,
            ActorId::from("requester"),
        )
    }

    #[test]
    fn new_request_is_pending_and_unpaid() {
        let req = make_request(ExtensionOrigin::Customer);
        assert!(req.is_pending());
        assert!(req.collected_amount.is_none());
        assert!(req.resolved_by.is_none());
    }

    #[test]
    fn approve_stamps_resolver() {
        let mut req = make_request(ExtensionOrigin::Customer);
        assert!(req.approve(ActorId::from("staff-1")).is_ok());
        assert_eq!(req.state, ApprovalState::Approved);
        assert_eq!(req.resolved_by, Some(ActorId::from("staff-1")));
        assert!(req.resolved_at.is_some());
    }

    #[test]
    fn cannot_resolve_twice() {
        let mut req = make_request(ExtensionOrigin::Customer);
        assert!(req.reject(ActorId::from("staff-1")).is_ok());
        let Err(err) = req.approve(ActorId::from("staff-2")) else {
            panic!("second resolution must fail");
        };
        assert!(matches!(err, RentalError::ExtensionState { .. }));
        assert_eq!(req.state, ApprovalState::Rejected);
    }

    #[test]
    fn customer_payment_requires_approval() {
        let mut req = make_request(ExtensionOrigin::Customer);
        assert!(req.record_payment(Decimal::new(30, 0)).is_err());
        assert!(req.approve(ActorId::from("staff-1")).is_ok());
        assert_eq!(req.record_payment(Decimal::new(30, 0)).ok(), Some(true));
    }

    #[test]
    fn staff_payment_settles_pending_request() {
        let mut req = make_request(ExtensionOrigin::Staff);
        assert_eq!(req.record_payment(Decimal::new(30, 0)).ok(), Some(true));
        assert_eq!(req.state, ApprovalState::Approved);
        assert_eq!(req.resolved_by, Some(ActorId::from("requester")));
    }

    #[test]
    fn repeated_payment_is_noop_and_new_amount_overwrites() {
        let mut req = make_request(ExtensionOrigin::Staff);
        assert_eq!(req.record_payment(Decimal::new(30, 0)).ok(), Some(true));
        assert_eq!(req.record_payment(Decimal::new(30, 0)).ok(), Some(false));
        assert_eq!(req.record_payment(Decimal::new(25, 0)).ok(), Some(true));
        assert_eq!(req.collected_amount, Some(Decimal::new(25, 0)));
    }

    #[test]
    fn negative_payment_is_rejected() {
        let mut req = make_request(ExtensionOrigin::Staff);
        let Err(err) = req.record_payment(Decimal::new(-1, 0)) else {
            panic!("negative payment must fail");
        };
        assert!(matches!(err, RentalError::Validation(_)));
        assert!(req.is_pending());
    }
}
