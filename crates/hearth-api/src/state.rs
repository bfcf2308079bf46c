//! API application state shared across handlers.

use hearth_auth::{CredentialVerifier, TrustedNetworks};
use hearth_entity::EntityRegistry;
use hearth_events::EventBus;
use hearth_telemetry::Metrics;

/// Shared dependencies for the HTTP layer.
pub struct ApiState {
    pub(crate) verifier: CredentialVerifier,
    pub(crate) trusted: TrustedNetworks,
    pub(crate) use_x_forwarded_for: bool,
    pub(crate) registry: EntityRegistry,
    pub(crate) events: EventBus,
    pub(crate) metrics: Metrics,
}

impl ApiState {
    /// Assemble the state from already-built components.
    #[must_use]
    pub fn new(
        verifier: CredentialVerifier,
        trusted: TrustedNetworks,
        use_x_forwarded_for: bool,
        registry: EntityRegistry,
        events: EventBus,
        metrics: Metrics,
    ) -> Self {
        Self {
            verifier,
            trusted,
            use_x_forwarded_for,
            registry,
            events,
            metrics,
        }
    }
}
