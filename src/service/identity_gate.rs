//! Holder identity checks for the customer self-service view.

use std::sync::Arc;

use crate::domain::{CaptureKind, JobId, JobRegistry, RentalJob};
use crate::error::RentalError;
use crate::service::AccessTokenIssuer;

/// Matches a presented contact identifier against the job holder.
///
/// Only the customer-facing flow goes through here; staff flows are
/// authorised by [`super::StaffRoleCheck`] instead.
#[derive(Debug, Clone)]
pub struct IdentityGate {
    registry: Arc<JobRegistry>,
    issuer: AccessTokenIssuer,
}

impl IdentityGate {
    /// Creates a gate over the given registry.
    #[must_use]
    pub fn new(registry: Arc<JobRegistry>, issuer: AccessTokenIssuer) -> Self {
        Self { registry, issuer }
    }

    /// Returns the job if `presented_contact` matches its holder.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::JobNotFound`] for an unknown job and
    /// [`RentalError::Authentication`] on a contact mismatch.
    pub async fn verify(
        &self,
        job_id: &JobId,
        presented_contact: &str,
    ) -> Result<RentalJob, RentalError> {
        let job = self.registry.snapshot(job_id).await?;
        if !job.holder_matches(presented_contact) {
            tracing::warn!(%job_id, "holder identity mismatch");
            return Err(RentalError::Authentication(job_id.clone()));
        }
        tracing::debug!(%job_id, "holder identity verified");
        Ok(job)
    }

    /// Verifies a scanned access payload and returns its job.
    ///
    /// # Errors
    ///
    /// Propagates [`AccessTokenIssuer::parse`] and [`Self::verify`]
    /// failures, and returns [`RentalError::NotAvailable`] if the job has
    /// not been picked up yet.
    pub async fn verify_payload(&self, payload: &str) -> Result<RentalJob, RentalError> {
        let claims = self.issuer.parse(payload)?;
        let job = self.verify(&claims.job_id, &claims.contact).await?;
        if job.access_payload.is_none() {
            return Err(RentalError::NotAvailable {
                job_id: claims.job_id,
                kind: CaptureKind::Pickup,
            });
        }
        Ok(job)
    }
}
