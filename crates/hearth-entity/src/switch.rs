//! Shell-command-backed switch entity.

use std::sync::{Arc, Mutex};

use hearth_auth::Identity;
use hearth_events::{Event, EventBus, SwitchState};
use hearth_telemetry::Metrics;
use tracing::{debug, error};

use crate::capability::Capability;
use crate::permissions::{PermissionDenied, PermissionTable, check_access};
use crate::runner::CommandRunner;

/// Plain description of a switch, produced by the configuration layer.
#[derive(Debug, Clone)]
pub struct SwitchSpec {
    /// Slug identifying the entity in API routes and events.
    pub entity_id: String,
    /// Friendly name shown to users and used in denial messages.
    pub name: String,
    /// Command executed to turn the switch on.
    pub command_on: String,
    /// Command executed to turn the switch off.
    pub command_off: String,
    /// Optional command polled for the actual state (exit 0 means on).
    pub command_state: Option<String>,
    /// Optional per-user capability grants; `None` means unrestricted.
    pub permissions: Option<PermissionTable>,
}

/// A switch toggled by shell commands.
///
/// When a state command is configured it is the source of truth and on/off
/// commands never update the cached state optimistically; without one, the
/// cache flips as soon as the command succeeds.
pub struct CommandSwitch {
    spec: SwitchSpec,
    state: Mutex<bool>,
    runner: Arc<dyn CommandRunner>,
    events: EventBus,
    metrics: Metrics,
}

impl CommandSwitch {
    /// Build a switch around the injected command runner and event bus.
    #[must_use]
    pub fn new(
        spec: SwitchSpec,
        runner: Arc<dyn CommandRunner>,
        events: EventBus,
        metrics: Metrics,
    ) -> Self {
        Self {
            spec,
            state: Mutex::new(false),
            runner,
            events,
            metrics,
        }
    }

    /// Slug identifying the entity.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.spec.entity_id
    }

    /// Friendly name of the entity.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Whether the cached state is assumed rather than queried.
    #[must_use]
    pub fn assumed_state(&self) -> bool {
        self.spec.command_state.is_none()
    }

    /// Whether the switch has a state command worth polling.
    #[must_use]
    pub fn should_poll(&self) -> bool {
        self.spec.command_state.is_some()
    }

    /// Cached on/off state, gated on read access.
    pub fn current_state(&self, identity: &Identity) -> Result<bool, PermissionDenied> {
        self.check(identity, Capability::Read)?;
        Ok(self.is_on())
    }

    /// Turn the switch on, gated on write access.
    ///
    /// Returns the cached state after the attempt. A command that fails to
    /// run or exits non-zero leaves the state untouched; that is logged, not
    /// propagated.
    pub async fn turn_on(&self, identity: &Identity) -> Result<bool, PermissionDenied> {
        self.check(identity, Capability::Write)?;
        if self.execute(&self.spec.command_on).await && self.assumed_state() {
            self.set_state(true);
        }
        Ok(self.is_on())
    }

    /// Turn the switch off, gated on write access.
    pub async fn turn_off(&self, identity: &Identity) -> Result<bool, PermissionDenied> {
        self.check(identity, Capability::Write)?;
        if self.execute(&self.spec.command_off).await && self.assumed_state() {
            self.set_state(false);
        }
        Ok(self.is_on())
    }

    /// Poll the state command and update the cached state.
    ///
    /// Write access is required before the state command is even looked at:
    /// polling refreshes the cached state, so reading fresh state is gated as
    /// a write. Returns `None` when no state command is configured or the
    /// poll itself failed (the state is then unknown, not changed).
    pub async fn refresh(&self, identity: &Identity) -> Result<Option<bool>, PermissionDenied> {
        self.check(identity, Capability::Write)?;

        let Some(command_state) = self.spec.command_state.as_deref() else {
            debug!(entity = %self.spec.entity_id, "no state command configured; skipping refresh");
            return Ok(None);
        };

        match self.runner.run(command_state).await {
            Ok(is_on) => {
                self.set_state(is_on);
                Ok(Some(is_on))
            }
            Err(err) => {
                error!(entity = %self.spec.entity_id, error = %err, "state command failed");
                self.metrics.inc_command_failure(&self.spec.entity_id);
                Ok(None)
            }
        }
    }

    fn check(&self, identity: &Identity, capability: Capability) -> Result<(), PermissionDenied> {
        check_access(
            self.spec.permissions.as_ref(),
            identity,
            capability,
            &self.spec.name,
        )
        .inspect_err(|denied| {
            self.metrics
                .inc_permission_denial(&denied.requested.to_string());
        })
    }

    async fn execute(&self, command: &str) -> bool {
        match self.runner.run(command).await {
            Ok(true) => true,
            Ok(false) => {
                error!(entity = %self.spec.entity_id, command = %command, "command failed");
                self.metrics.inc_command_failure(&self.spec.entity_id);
                false
            }
            Err(err) => {
                error!(entity = %self.spec.entity_id, command = %command, error = %err, "command could not be run");
                self.metrics.inc_command_failure(&self.spec.entity_id);
                false
            }
        }
    }

    fn is_on(&self) -> bool {
        *self.state.lock().expect("switch state mutex poisoned")
    }

    fn set_state(&self, is_on: bool) {
        let changed = {
            let mut state = self.state.lock().expect("switch state mutex poisoned");
            let changed = *state != is_on;
            *state = is_on;
            changed
        };
        if changed {
            self.metrics.inc_event("state_changed");
            self.events.publish(Event::StateChanged {
                entity_id: self.spec.entity_id.clone(),
                state: SwitchState::from(is_on),
            });
        }
    }
}
