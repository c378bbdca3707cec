//! # rental-lifecycle
//!
//! Rental-job lifecycle state machine and time-extension billing engine
//! for a fleet-rental back-office.
//!
//! A job moves `Pending → PickedUp → Returned`. Each transition is gated
//! by a complete condition snapshot (odometer, fuel, photo evidence,
//! agreement reference) and commits atomically under a per-job lock. The
//! first pickup issues a deterministic access payload that customers scan
//! to open their self-service view. Extensions to the return time are
//! priced by peak/low hourly rates or by day + hour rates, and go through
//! a pending → approved/rejected flow with payment recording.
//!
//! ## Architecture
//!
//! ```text
//! UI / API layer
//!     │
//!     ├── IdentityGate ── AccessTokenIssuer      (customer view)
//!     ├── JobLifecycle ── ConditionSnapshotValidator
//!     │                └─ AccessTokenIssuer      (staff P&R flow)
//!     ├── ExtensionRequestManager ── TimeExtensionCalculator
//!     │
//!     ├── EventBus (domain/)
//!     └── JobRegistry (domain/)
//! ```

pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod pricing;
pub mod service;
