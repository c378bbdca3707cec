//! Domain layer: identifiers, entities, events, and the job registry.
//!
//! This module contains the rental-job model (jobs, condition snapshots,
//! extension requests), the event bus for broadcasting committed
//! mutations, and the registry providing per-job locked storage.

pub mod access_payload;
pub mod condition_snapshot;
pub mod event_bus;
pub mod extension_request;
pub mod identifiers;
pub mod job_event;
pub mod job_registry;
pub mod rental_job;

pub use access_payload::AccessPayload;
pub use condition_snapshot::{
    CaptureKind, ConditionSnapshot, FuelLevel, PhotoCategory, PhotoEvidence, SnapshotCorrection,
};
pub use event_bus::EventBus;
pub use extension_request::{ApprovalState, ExtensionOrigin, ExtensionRequest};
pub use identifiers::{ActorId, ExtensionRequestId, JobId};
pub use job_event::JobEvent;
pub use job_registry::JobRegistry;
pub use rental_job::{JobState, JobSummary, RentalJob};
