//! Lookup table for configured entities.

use std::collections::BTreeMap;
use std::sync::Arc;

use hearth_events::EventBus;
use hearth_telemetry::Metrics;
use tracing::info;

use crate::runner::CommandRunner;
use crate::switch::{CommandSwitch, SwitchSpec};

/// All controllable entities, keyed by entity id.
#[derive(Clone)]
pub struct EntityRegistry {
    switches: BTreeMap<String, Arc<CommandSwitch>>,
}

impl EntityRegistry {
    /// Build the registry from configured switch specs, sharing one command
    /// runner and event bus across all entities.
    #[must_use]
    pub fn new(
        specs: Vec<SwitchSpec>,
        runner: Arc<dyn CommandRunner>,
        events: &EventBus,
        metrics: &Metrics,
    ) -> Self {
        let switches: BTreeMap<String, Arc<CommandSwitch>> = specs
            .into_iter()
            .map(|spec| {
                let entity_id = spec.entity_id.clone();
                let switch = Arc::new(CommandSwitch::new(
                    spec,
                    Arc::clone(&runner),
                    events.clone(),
                    metrics.clone(),
                ));
                (entity_id, switch)
            })
            .collect();

        metrics.set_configured_entities(i64::try_from(switches.len()).unwrap_or(i64::MAX));
        info!(count = switches.len(), "entity registry initialised");
        Self { switches }
    }

    /// Look up a switch by entity id.
    #[must_use]
    pub fn get(&self, entity_id: &str) -> Option<&Arc<CommandSwitch>> {
        self.switches.get(entity_id)
    }

    /// Iterate over all switches in entity-id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CommandSwitch>> {
        self.switches.values()
    }

    /// Number of configured entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.switches.len()
    }

    /// Whether any entities are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }
}
