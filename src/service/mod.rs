//! Service layer: business rules and transition orchestration.
//!
//! [`JobLifecycle`] drives pickup and return, [`ExtensionRequestManager`]
//! owns extension requests, and [`IdentityGate`] guards the customer
//! view. Validation and payload derivation are leaf helpers shared by
//! those services.

pub mod access_token;
pub mod extension_manager;
pub mod identity_gate;
pub mod job_lifecycle;
pub mod snapshot_validator;
pub mod staff_role;

pub use access_token::{AccessClaims, AccessTokenIssuer};
pub use extension_manager::ExtensionRequestManager;
pub use identity_gate::IdentityGate;
pub use job_lifecycle::JobLifecycle;
pub use snapshot_validator::{ConditionSnapshotValidator, SnapshotIssue};
pub use staff_role::{StaffRoleCheck, StaffRoster};
