//! Controllable entities for the Hearth gateway.
//!
//! # Design
//! - Entities are shell-command-backed switches with optional per-user
//!   permission tables.
//! - Authorization is explicit: every state read or write takes the caller's
//!   resolved [`hearth_auth::Identity`] as a parameter and is checked against
//!   the entity's capability grants before anything runs.
//! - Command execution goes through the [`CommandRunner`] seam so tests never
//!   spawn real processes.

mod capability;
mod permissions;
mod registry;
mod runner;
mod switch;

pub use capability::{Capability, CapabilitySet, InvalidCapability};
pub use permissions::{ANY_USER, PermissionDenied, PermissionTable, check_access};
pub use registry::EntityRegistry;
pub use runner::{CommandError, CommandRunner, ShellCommandRunner};
pub use switch::{CommandSwitch, SwitchSpec};
