//! Deterministic access payloads for customer self-service views.
//!
//! Payload layout:
//!
//! ```text
//! <base>?job=<urlenc job id>&contact=<urlenc contact>&sig=<b64url sha256>
//! ```
//!
//! `sig` is SHA-256 over `key \n job id \n normalized contact`, encoded as
//! unpadded URL-safe base64. Nothing time- or randomness-dependent goes
//! in, so re-issuing for the same job yields identical bytes.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::domain::rental_job::normalize_contact;
use crate::domain::{AccessPayload, JobId, RentalJob};
use crate::error::RentalError;

/// Job identifier and contact recovered from a verified payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Job identifier.
    pub job_id: JobId,
    /// Holder contact embedded in the payload.
    pub contact: String,
}

/// Issues and checks access payloads.
#[derive(Debug, Clone)]
pub struct AccessTokenIssuer {
    base_uri: String,
    key: String,
}

impl AccessTokenIssuer {
    /// Creates an issuer for the given base URI and checksum key.
    #[must_use]
    pub fn new(base_uri: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            key: key.into(),
        }
    }

    /// Derives the payload for a job.
    #[must_use]
    pub fn issue(&self, job: &RentalJob) -> AccessPayload {
        let contact = job.contact.trim();
        AccessPayload::new(format!(
            "{}?job={}&contact={}&sig={}",
            self.base_uri,
            urlencoding::encode(job.id.as_str()),
            urlencoding::encode(contact),
            self.checksum(job.id.as_str(), contact),
        ))
    }

    /// Decodes a payload and verifies its checksum.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::Validation`] if the payload is not one of
    /// ours or is missing a field, and [`RentalError::Authentication`] if
    /// the checksum does not match.
    pub fn parse(&self, payload: &str) -> Result<AccessClaims, RentalError> {
        let query = payload
            .strip_prefix(self.base_uri.as_str())
            .and_then(|rest| rest.strip_prefix('?'))
            .ok_or_else(|| RentalError::Validation("unrecognised access payload".to_string()))?;

        let mut job = None;
        let mut contact = None;
        let mut sig = None;
        for pair in query.split('&') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let decoded = urlencoding::decode(value)
                .map_err(|e| RentalError::Validation(format!("malformed access payload: {e}")))?
                .into_owned();
            match name {
                "job" => job = Some(decoded),
                "contact" => contact = Some(decoded),
                "sig" => sig = Some(decoded),
                _ => {}
            }
        }

        let (Some(job), Some(contact), Some(sig)) = (job, contact, sig) else {
            return Err(RentalError::Validation(
                "access payload is missing a field".to_string(),
            ));
        };

        let job_id = JobId::new(job);
        if self.checksum(job_id.as_str(), &contact) != sig {
            tracing::warn!(%job_id, "access payload checksum mismatch");
            return Err(RentalError::Authentication(job_id));
        }
        Ok(AccessClaims { job_id, contact })
    }

    fn checksum(&self, job_id: &str, contact: &str) -> String {
        let material = format!("{}\n{}\n{}", self.key, job_id, normalize_contact(contact));
        URL_SAFE_NO_PAD.encode(Sha256::digest(material.as_bytes()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn make_job(id: &str, contact: &str) -> RentalJob {
        let (Some(start), Some(end)) = (
            NaiveDate::from_ymd_opt(2025, 1, 12).and_then(|d| d.and_hms_opt(9, 0, 0)),
            NaiveDate::from_ymd_opt(2025, 1, 15).and_then(|d| d.and_hms_opt(18, 0, 0)),
        ) else {
            panic!("valid timestamps");
        };
        let Ok(job) = RentalJob::new(
            JobId::from(id),
            "Aisyah Rahman",
            contact,
            "WXY 1234",
            start,
            end,
            Decimal::new(200, 0),
        ) else {
            panic!("valid job");
        };
        job
    }

    fn issuer() -> AccessTokenIssuer {
        AccessTokenIssuer::new("rental://jobs/confirm", "test-key")
    }

    #[test]
    fn issue_is_byte_identical_across_calls() {
        let job = make_job("JOB-2025-001", "+60123456789");
        let a = issuer().issue(&job);
        let b = issuer().issue(&job);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn payload_encodes_job_and_contact() {
        let job = make_job("JOB-2025-001", "+60123456789");
        let payload = issuer().issue(&job);
        assert!(payload.as_str().starts_with("rental://jobs/confirm?job=JOB-2025-001&"));
        assert!(payload.as_str().contains("contact=%2B60123456789"));
    }

    #[test]
    fn different_jobs_get_different_payloads() {
        let a = issuer().issue(&make_job("JOB-1", "+601"));
        let b = issuer().issue(&make_job("JOB-2", "+601"));
        assert_ne!(a, b);
    }

    #[test]
    fn parse_round_trips_claims() {
        let job = make_job("JOB 7/A", "+60123456789");
        let payload = issuer().issue(&job);
        let Ok(claims) = issuer().parse(payload.as_str()) else {
            panic!("payload must verify");
        };
        assert_eq!(claims.job_id, job.id);
        assert_eq!(claims.contact, "+60123456789");
    }

    #[test]
    fn tampered_contact_fails_authentication() {
        let job = make_job("JOB-1", "+60123456789");
        let payload = issuer().issue(&job);
        let tampered = payload.as_str().replace("60123456789", "60000000000");
        let result = issuer().parse(&tampered);
        assert!(matches!(result, Err(RentalError::Authentication(_))));
    }

    #[test]
    fn other_key_fails_authentication() {
        let job = make_job("JOB-1", "+60123456789");
        let payload = AccessTokenIssuer::new("rental://jobs/confirm", "other").issue(&job);
        let result = issuer().parse(payload.as_str());
        assert!(matches!(result, Err(RentalError::Authentication(_))));
    }

    #[test]
    fn foreign_or_truncated_payload_is_invalid() {
        assert!(matches!(
            issuer().parse("https://example.com/?job=JOB-1"),
            Err(RentalError::Validation(_))
        ));
        assert!(matches!(
            issuer().parse("rental://jobs/confirm?job=JOB-1&contact=%2B601"),
            Err(RentalError::Validation(_))
        ));
    }
}
