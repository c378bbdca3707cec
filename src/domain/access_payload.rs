//! Scannable access payload issued once a job is picked up.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deterministic payload rendered as a scannable code.
///
/// Built by [`crate::service::AccessTokenIssuer`]; contains no randomness
/// or timestamp, so a printed code stays valid for the life of the job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessPayload(String);

impl AccessPayload {
    /// Wraps an already-encoded payload string.
    #[must_use]
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Returns the encoded payload.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the payload bytes handed to the code renderer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for AccessPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
