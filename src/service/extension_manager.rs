//! Extension request service: submission, approval, and payment.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::domain::{
    ActorId, ApprovalState, EventBus, ExtensionOrigin, ExtensionRequest, ExtensionRequestId,
    JobEvent, JobId, JobRegistry, JobState, RentalJob,
};
use crate::error::RentalError;
use crate::pricing::{PricingStrategy, TimeExtensionCalculator};
use crate::service::staff_role::{StaffRoleCheck, require_staff};

/// Owns the extension request queue of every job.
///
/// Requests are stored on their job so they commit under the same per-job
/// lock as lifecycle transitions; a side index maps request IDs to jobs.
/// At most one request per job is `Pending` at a time.
#[derive(Debug)]
pub struct ExtensionRequestManager {
    registry: Arc<JobRegistry>,
    event_bus: EventBus,
    calculator: TimeExtensionCalculator,
    roles: Arc<dyn StaffRoleCheck>,
    index: RwLock<HashMap<ExtensionRequestId, JobId>>,
}

impl ExtensionRequestManager {
    /// Creates a new `ExtensionRequestManager`.
    #[must_use]
    pub fn new(
        registry: Arc<JobRegistry>,
        event_bus: EventBus,
        calculator: TimeExtensionCalculator,
        roles: Arc<dyn StaffRoleCheck>,
    ) -> Self {
        Self {
            registry,
            event_bus,
            calculator,
            roles,
            index: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the calculator used to price requests.
    #[must_use]
    pub const fn calculator(&self) -> &TimeExtensionCalculator {
        &self.calculator
    }

    /// Submits a request priced with hourly peak/low rates.
    ///
    /// # Errors
    ///
    /// See [`Self::submit_with_strategy`].
    pub async fn submit(
        &self,
        job_id: &JobId,
        proposed_return_time: NaiveDateTime,
        origin: ExtensionOrigin,
        requested_by: ActorId,
    ) -> Result<ExtensionRequest, RentalError> {
        self.submit_with_strategy(
            job_id,
            proposed_return_time,
            origin,
            requested_by,
            PricingStrategy::Hourly,
        )
        .await
    }

    /// Submits a pending extension request priced with `strategy`.
    ///
    /// # Errors
    ///
    /// - [`RentalError::Forbidden`] for a staff-origin request from a
    ///   non-staff actor.
    /// - [`RentalError::JobNotFound`] for an unknown job.
    /// - [`RentalError::InvalidState`] if the job was already returned.
    /// - [`RentalError::DuplicatePendingExtension`] if one is outstanding.
    /// - [`RentalError::Validation`] if the proposed time is not after the
    ///   return time in force.
    pub async fn submit_with_strategy(
        &self,
        job_id: &JobId,
        proposed_return_time: NaiveDateTime,
        origin: ExtensionOrigin,
        requested_by: ActorId,
        strategy: PricingStrategy,
    ) -> Result<ExtensionRequest, RentalError> {
        if origin == ExtensionOrigin::Staff {
            require_staff(self.roles.as_ref(), &requested_by)?;
        }

        let entry = self.registry.get(job_id).await?;
        let mut job = entry.write().await;
        let request =
            self.price_request(&job, proposed_return_time, origin, requested_by, strategy)?;
        job.extension_requests.push(request.clone());
        job.touch();
        self.index.write().await.insert(request.id, job_id.clone());
        drop(job);

        self.publish_submitted(&request);
        tracing::info!(
            %job_id,
            request_id = %request.id,
            hours = request.calculation.hours,
            fee = %request.calculation.fee,
            "extension submitted"
        );
        Ok(request)
    }

    /// Approves a pending request. The job's agreed return time is left
    /// untouched; the approval becomes the job's effective return time.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::Forbidden`] for non-staff resolvers,
    /// [`RentalError::ExtensionNotFound`] for an unknown request, and
    /// [`RentalError::ExtensionState`] if it is not pending.
    pub async fn approve(
        &self,
        request_id: ExtensionRequestId,
        resolved_by: ActorId,
    ) -> Result<ExtensionRequest, RentalError> {
        self.resolve(request_id, resolved_by, ApprovalState::Approved)
            .await
    }

    /// Rejects a pending request.
    ///
    /// # Errors
    ///
    /// Same as [`Self::approve`].
    pub async fn reject(
        &self,
        request_id: ExtensionRequestId,
        resolved_by: ActorId,
    ) -> Result<ExtensionRequest, RentalError> {
        self.resolve(request_id, resolved_by, ApprovalState::Rejected)
            .await
    }

    async fn resolve(
        &self,
        request_id: ExtensionRequestId,
        resolved_by: ActorId,
        outcome: ApprovalState,
    ) -> Result<ExtensionRequest, RentalError> {
        require_staff(self.roles.as_ref(), &resolved_by)?;
        let job_id = self.job_for(request_id).await?;

        let entry = self.registry.get(&job_id).await?;
        let mut job = entry.write().await;
        let request = job
            .extension_mut(request_id)
            .ok_or(RentalError::ExtensionNotFound(request_id))?;
        if outcome == ApprovalState::Approved {
            request.approve(resolved_by.clone())?;
        } else {
            request.reject(resolved_by.clone())?;
        }
        let request = request.clone();
        job.touch();
        drop(job);

        let event = if outcome == ApprovalState::Approved {
            JobEvent::ExtensionApproved {
                job_id: job_id.clone(),
                request_id,
                actor: resolved_by.clone(),
                timestamp: Utc::now(),
            }
        } else {
            JobEvent::ExtensionRejected {
                job_id: job_id.clone(),
                request_id,
                actor: resolved_by.clone(),
                timestamp: Utc::now(),
            }
        };
        let _ = self.event_bus.publish(event);
        tracing::info!(%job_id, %request_id, actor = %resolved_by, state = %outcome, "extension resolved");
        Ok(request)
    }

    /// Records the amount collected for a request.
    ///
    /// Re-recording the same amount is a no-op; a different amount
    /// overwrites the previous one. A pending staff-origin request is
    /// approved by its payment.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::Forbidden`] for non-staff actors,
    /// [`RentalError::ExtensionNotFound`] for an unknown request,
    /// [`RentalError::Validation`] for a negative amount, and
    /// [`RentalError::ExtensionState`] if the request cannot take payment.
    pub async fn record_payment(
        &self,
        request_id: ExtensionRequestId,
        collected_amount: Decimal,
        recorded_by: ActorId,
    ) -> Result<ExtensionRequest, RentalError> {
        require_staff(self.roles.as_ref(), &recorded_by)?;
        let job_id = self.job_for(request_id).await?;

        let entry = self.registry.get(&job_id).await?;
        let mut job = entry.write().await;
        let request = job
            .extension_mut(request_id)
            .ok_or(RentalError::ExtensionNotFound(request_id))?;
        let was_pending = request.is_pending();
        let previous = request.collected_amount;
        let changed = request.record_payment(collected_amount)?;
        let request = request.clone();
        if changed {
            job.touch();
        }
        drop(job);

        if !changed {
            tracing::debug!(%job_id, %request_id, "payment already recorded");
            return Ok(request);
        }
        if let Some(previous) = previous {
            tracing::warn!(%job_id, %request_id, %previous, amount = %collected_amount, "collected amount overwritten");
        }
        if was_pending {
            self.publish_approved(&request);
        }
        let _ = self.event_bus.publish(JobEvent::ExtensionPaymentRecorded {
            job_id: job_id.clone(),
            request_id,
            amount: collected_amount,
            timestamp: Utc::now(),
        });
        tracing::info!(%job_id, %request_id, amount = %collected_amount, "extension payment recorded");
        Ok(request)
    }

    /// Prices, approves, and records payment for a counter-side extension
    /// in one unit of work. The result is already resolved.
    ///
    /// # Errors
    ///
    /// Same as [`Self::submit_with_strategy`], plus
    /// [`RentalError::Validation`] for a negative amount.
    pub async fn record_staff_extension(
        &self,
        job_id: &JobId,
        proposed_return_time: NaiveDateTime,
        actor: ActorId,
        collected_amount: Decimal,
        strategy: PricingStrategy,
    ) -> Result<ExtensionRequest, RentalError> {
        require_staff(self.roles.as_ref(), &actor)?;

        let entry = self.registry.get(job_id).await?;
        let mut job = entry.write().await;
        let mut request = self.price_request(
            &job,
            proposed_return_time,
            ExtensionOrigin::Staff,
            actor.clone(),
            strategy,
        )?;
        request.record_payment(collected_amount)?;
        job.extension_requests.push(request.clone());
        job.touch();
        self.index.write().await.insert(request.id, job_id.clone());
        drop(job);

        self.publish_submitted(&request);
        self.publish_approved(&request);
        let _ = self.event_bus.publish(JobEvent::ExtensionPaymentRecorded {
            job_id: job_id.clone(),
            request_id: request.id,
            amount: collected_amount,
            timestamp: Utc::now(),
        });
        tracing::info!(
            %job_id,
            request_id = %request.id,
            %actor,
            fee = %request.calculation.fee,
            collected = %collected_amount,
            "staff extension recorded"
        );
        Ok(request)
    }

    /// Returns a request by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::ExtensionNotFound`] for an unknown request.
    pub async fn get(&self, request_id: ExtensionRequestId) -> Result<ExtensionRequest, RentalError> {
        let job_id = self.job_for(request_id).await?;
        let job = self.registry.snapshot(&job_id).await?;
        job.extension(request_id)
            .cloned()
            .ok_or(RentalError::ExtensionNotFound(request_id))
    }

    /// Returns the requests of a job in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::JobNotFound`] for an unknown job.
    pub async fn list_for_job(&self, job_id: &JobId) -> Result<Vec<ExtensionRequest>, RentalError> {
        Ok(self.registry.snapshot(job_id).await?.extension_requests)
    }

    /// Returns the outstanding pending request of a job, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::JobNotFound`] for an unknown job.
    pub async fn pending_for_job(
        &self,
        job_id: &JobId,
    ) -> Result<Option<ExtensionRequest>, RentalError> {
        let job = self.registry.snapshot(job_id).await?;
        Ok(job.pending_extension().cloned())
    }

    fn price_request(
        &self,
        job: &RentalJob,
        proposed_return_time: NaiveDateTime,
        origin: ExtensionOrigin,
        requested_by: ActorId,
        strategy: PricingStrategy,
    ) -> Result<ExtensionRequest, RentalError> {
        if job.state == JobState::Returned {
            return Err(RentalError::InvalidState {
                job_id: job.id.clone(),
                expected: "pending or picked_up".to_string(),
                actual: job.state.to_string(),
            });
        }
        if job.pending_extension().is_some() {
            tracing::warn!(job_id = %job.id, "duplicate pending extension refused");
            return Err(RentalError::DuplicatePendingExtension(job.id.clone()));
        }
        let reference = job.effective_return_time();
        let calculation = self
            .calculator
            .compute(strategy, reference, proposed_return_time)
            .ok_or_else(|| {
                RentalError::Validation(format!(
                    "proposed return time {proposed_return_time} must be after {reference}"
                ))
            })?;
        Ok(ExtensionRequest::new(
            job.id.clone(),
            reference,
            proposed_return_time,
            calculation,
            origin,
            requested_by,
        ))
    }

    async fn job_for(&self, request_id: ExtensionRequestId) -> Result<JobId, RentalError> {
        self.index
            .read()
            .await
            .get(&request_id)
            .cloned()
            .ok_or(RentalError::ExtensionNotFound(request_id))
    }

    fn publish_submitted(&self, request: &ExtensionRequest) {
        let _ = self.event_bus.publish(JobEvent::ExtensionSubmitted {
            job_id: request.job_id.clone(),
            request_id: request.id,
            origin: request.origin,
            requested_return_time: request.requested_return_time,
            fee: request.calculation.fee,
            timestamp: Utc::now(),
        });
    }

    fn publish_approved(&self, request: &ExtensionRequest) {
        let actor = request
            .resolved_by
            .clone()
            .unwrap_or_else(|| request.requested_by.clone());
        let _ = self.event_bus.publish(JobEvent::ExtensionApproved {
            job_id: request.job_id.clone(),
            request_id: request.id,
            actor,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::service::StaffRoster;
    use chrono::NaiveDate;
    use tokio_test::{assert_err, assert_ok};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        let Some(t) = NaiveDate::from_ymd_opt(2025, 1, day).and_then(|d| d.and_hms_opt(hour, 0, 0))
        else {
            panic!("valid timestamp");
        };
        t
    }

    fn job_id() -> JobId {
        JobId::from("JOB-2025-001")
    }

    fn staff() -> ActorId {
        ActorId::from("staff-1")
    }

    fn customer() -> ActorId {
        ActorId::from("customer")
    }

    async fn make_manager() -> ExtensionRequestManager {
        let registry = Arc::new(JobRegistry::new());
        let Ok(job) = RentalJob::new(
            job_id(),
            "Aisyah Rahman",
            "+60123456789",
            "WXY 1234",
            at(12, 9),
            at(15, 18),
            Decimal::new(200, 0),
        ) else {
            panic!("valid job");
        };
        assert_ok!(registry.insert(job).await);
        let roles: Arc<dyn StaffRoleCheck> = Arc::new(StaffRoster::new([staff()]));
        ExtensionRequestManager::new(
            registry,
            EventBus::new(64),
            TimeExtensionCalculator::default(),
            roles,
        )
    }

    #[tokio::test]
    async fn customer_submission_is_pending_and_priced() {
        let manager = make_manager().await;
        let request = assert_ok!(
            manager
                .submit(&job_id(), at(16, 10), ExtensionOrigin::Customer, customer())
                .await
        );
        assert_eq!(request.state, ApprovalState::Pending);
        assert_eq!(request.reference_return_time, at(15, 18));
        assert_eq!(request.calculation.hours, 16);
        assert_eq!(request.calculation.fee, Decimal::new(240, 0));
    }

    #[tokio::test]
    async fn second_pending_submission_is_refused() {
        let manager = make_manager().await;
        assert_ok!(
            manager
                .submit(&job_id(), at(16, 10), ExtensionOrigin::Customer, customer())
                .await
        );
        let err = assert_err!(
            manager
                .submit(&job_id(), at(16, 12), ExtensionOrigin::Customer, customer())
                .await
        );
        assert!(matches!(err, RentalError::DuplicatePendingExtension(_)));
        let Ok(requests) = manager.list_for_job(&job_id()).await else {
            panic!("job missing");
        };
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn earlier_time_is_a_validation_error() {
        let manager = make_manager().await;
        let err = assert_err!(
            manager
                .submit(&job_id(), at(15, 18), ExtensionOrigin::Customer, customer())
                .await
        );
        assert!(matches!(err, RentalError::Validation(_)));
    }

    #[tokio::test]
    async fn approval_moves_effective_return_time_only() {
        let manager = make_manager().await;
        let request = assert_ok!(
            manager
                .submit(&job_id(), at(16, 10), ExtensionOrigin::Customer, customer())
                .await
        );
        let approved = assert_ok!(manager.approve(request.id, staff()).await);
        assert_eq!(approved.state, ApprovalState::Approved);
        assert_eq!(approved.resolved_by, Some(staff()));

        let Ok(job) = manager.registry.snapshot(&job_id()).await else {
            panic!("job missing");
        };
        assert_eq!(job.ordered_end, at(15, 18));
        assert_eq!(job.effective_return_time(), at(16, 10));

        let next = assert_ok!(
            manager
                .submit(&job_id(), at(16, 12), ExtensionOrigin::Customer, customer())
                .await
        );
        assert_eq!(next.reference_return_time, at(16, 10));
        assert_eq!(next.calculation.hours, 2);
    }

    #[tokio::test]
    async fn resolving_twice_is_invalid_state() {
        let manager = make_manager().await;
        let request = assert_ok!(
            manager
                .submit(&job_id(), at(16, 10), ExtensionOrigin::Customer, customer())
                .await
        );
        assert_ok!(manager.reject(request.id, staff()).await);
        let err = assert_err!(manager.approve(request.id, staff()).await);
        assert!(matches!(err, RentalError::ExtensionState { .. }));
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let manager = make_manager().await;
        let err = assert_err!(manager.approve(ExtensionRequestId::new(), staff()).await);
        assert!(matches!(err, RentalError::ExtensionNotFound(_)));
    }

    #[tokio::test]
    async fn non_staff_cannot_approve() {
        let manager = make_manager().await;
        let request = assert_ok!(
            manager
                .submit(&job_id(), at(16, 10), ExtensionOrigin::Customer, customer())
                .await
        );
        let err = assert_err!(manager.approve(request.id, customer()).await);
        assert!(matches!(err, RentalError::Forbidden(_)));
    }

    #[tokio::test]
    async fn payment_before_approval_is_refused_for_customer_requests() {
        let manager = make_manager().await;
        let request = assert_ok!(
            manager
                .submit(&job_id(), at(16, 10), ExtensionOrigin::Customer, customer())
                .await
        );
        let err = assert_err!(
            manager
                .record_payment(request.id, Decimal::new(240, 0), staff())
                .await
        );
        assert!(matches!(err, RentalError::ExtensionState { .. }));

        assert_ok!(manager.approve(request.id, staff()).await);
        let paid = assert_ok!(
            manager
                .record_payment(request.id, Decimal::new(240, 0), staff())
                .await
        );
        assert_eq!(paid.collected_amount, Some(Decimal::new(240, 0)));
    }

    #[tokio::test]
    async fn repeated_payment_emits_one_event() {
        let manager = make_manager().await;
        let mut rx = manager.event_bus.subscribe();
        let request = assert_ok!(
            manager
                .submit(&job_id(), at(16, 10), ExtensionOrigin::Staff, staff())
                .await
        );
        assert_ok!(
            manager
                .record_payment(request.id, Decimal::new(240, 0), staff())
                .await
        );
        assert_ok!(
            manager
                .record_payment(request.id, Decimal::new(240, 0), staff())
                .await
        );

        let mut types = Vec::new();
        while let Ok(event) = rx.try_recv() {
            types.push(event.event_type_str());
        }
        assert_eq!(
            types,
            vec![
                "extension_submitted",
                "extension_approved",
                "extension_payment_recorded"
            ]
        );
    }

    #[tokio::test]
    async fn staff_extension_is_recorded_resolved() {
        let manager = make_manager().await;
        let request = assert_ok!(
            manager
                .record_staff_extension(
                    &job_id(),
                    at(17, 21),
                    staff(),
                    Decimal::new(115, 0),
                    PricingStrategy::DayPlusHour,
                )
                .await
        );
        assert_eq!(request.state, ApprovalState::Approved);
        assert_eq!(request.origin, ExtensionOrigin::Staff);
        assert_eq!(request.calculation.days, 2);
        assert_eq!(request.calculation.remainder_hours, 3);
        assert_eq!(request.calculation.fee, Decimal::new(115, 0));
        assert_eq!(request.collected_amount, Some(Decimal::new(115, 0)));
        let pending = assert_ok!(manager.pending_for_job(&job_id()).await);
        assert!(pending.is_none());
        let fetched = assert_ok!(manager.get(request.id).await);
        assert_eq!(fetched, request);
    }

    #[tokio::test]
    async fn staff_origin_requires_staff_actor() {
        let manager = make_manager().await;
        let err = assert_err!(
            manager
                .submit(&job_id(), at(16, 10), ExtensionOrigin::Staff, customer())
                .await
        );
        assert!(matches!(err, RentalError::Forbidden(_)));
    }

    #[tokio::test]
    async fn returned_job_rejects_extensions() {
        let manager = make_manager().await;
        let Ok(entry) = manager.registry.get(&job_id()).await else {
            panic!("job missing");
        };
        entry.write().await.state = JobState::Returned;
        let err = assert_err!(
            manager
                .submit(&job_id(), at(16, 10), ExtensionOrigin::Customer, customer())
                .await
        );
        assert!(matches!(err, RentalError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn concurrent_submissions_leave_one_pending() {
        let manager = Arc::new(make_manager().await);
        let mut handles = Vec::new();
        for hour in 19..23 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager
                    .submit(&job_id(), at(15, hour), ExtensionOrigin::Customer, customer())
                    .await
            }));
        }
        let mut ok = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await {
                Ok(Ok(_)) => ok += 1,
                Ok(Err(RentalError::DuplicatePendingExtension(_))) => duplicates += 1,
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(duplicates, 3);
    }
}
