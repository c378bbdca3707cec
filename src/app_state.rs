//! Shared application state wiring the services over one job registry.

use std::sync::Arc;

use crate::config::RentalConfig;
use crate::domain::{EventBus, JobRegistry};
use crate::service::{
    AccessTokenIssuer, ConditionSnapshotValidator, ExtensionRequestManager, IdentityGate,
    JobLifecycle, StaffRoleCheck,
};

/// Everything a UI or API layer needs, built once at startup.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Job store shared by all services.
    pub registry: Arc<JobRegistry>,
    /// Event bus for draft invalidation and notifications.
    pub event_bus: EventBus,
    /// Pickup and return transitions.
    pub lifecycle: JobLifecycle,
    /// Extension requests.
    pub extensions: Arc<ExtensionRequestManager>,
    /// Customer self-service identity checks.
    pub identity: IdentityGate,
}

impl AppState {
    /// Builds the service graph from configuration and a role check.
    #[must_use]
    pub fn new(config: &RentalConfig, roles: Arc<dyn StaffRoleCheck>) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let event_bus = EventBus::new(config.event_bus_capacity);
        let issuer = AccessTokenIssuer::new(
            config.access_payload_base_uri.clone(),
            config.access_payload_key.clone(),
        );

        let lifecycle = JobLifecycle::new(
            Arc::clone(&registry),
            event_bus.clone(),
            ConditionSnapshotValidator::new(),
            issuer.clone(),
            Arc::clone(&roles),
        );
        let extensions = Arc::new(ExtensionRequestManager::new(
            Arc::clone(&registry),
            event_bus.clone(),
            config.calculator(),
            roles,
        ));
        let identity = IdentityGate::new(Arc::clone(&registry), issuer);

        Self {
            registry,
            event_bus,
            lifecycle,
            extensions,
            identity,
        }
    }
}
