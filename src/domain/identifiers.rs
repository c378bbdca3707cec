//! Type-safe identifiers for jobs, extension requests, and actors.
//!
//! Job identifiers are opaque string tokens issued by the booking side
//! (e.g. `JOB-2025-001`); extension request identifiers are generated
//! here as UUID v4. Newtypes keep the three from being mixed up.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a rental job.
///
/// Immutable once the job is created. Used as the dictionary key in
/// [`super::JobRegistry`] and embedded in the access payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Creates a `JobId` from any string-like token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for JobId {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Unique identifier for an extension request (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionRequestId(uuid::Uuid);

impl ExtensionRequestId {
    /// Creates a new random `ExtensionRequestId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ExtensionRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExtensionRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a staff member or customer performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Creates an `ActorId` from any string-like identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
