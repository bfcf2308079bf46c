//! Per-entity permission tables and the access check they back.

use std::collections::BTreeMap;

use hearth_auth::Identity;
use thiserror::Error;
use tracing::warn;

use crate::capability::{Capability, CapabilitySet};

/// Sentinel identity used when no named user was resolved for the caller.
pub const ANY_USER: &str = "any_user";

/// Capability grants for one entity, keyed by user identifier.
///
/// Absence of a table on an entity means "unrestricted"; absence of a user
/// inside a table means "no capabilities".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    grants: BTreeMap<String, CapabilitySet>,
}

impl PermissionTable {
    /// Build a table from parsed grants.
    #[must_use]
    pub fn new(grants: BTreeMap<String, CapabilitySet>) -> Self {
        Self { grants }
    }

    /// Capabilities granted to the user; the empty set when the user has no
    /// entry.
    #[must_use]
    pub fn capabilities_for(&self, user: &str) -> CapabilitySet {
        self.grants.get(user).copied().unwrap_or(CapabilitySet::EMPTY)
    }
}

/// Denied entity access, carrying everything a caller needs to act on the
/// denial programmatically.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "User '{user}' does not have '{requested}' permission for '{entity}', only has '{granted}'."
)]
pub struct PermissionDenied {
    /// Acting user identifier (the [`ANY_USER`] sentinel when anonymous).
    pub user: String,
    /// Capability that was requested.
    pub requested: Capability,
    /// Friendly name of the entity the action targeted.
    pub entity: String,
    /// Capabilities the user actually holds on the entity.
    pub granted: CapabilitySet,
}

/// Check whether `identity` may exercise `capability` on the entity.
///
/// Grant resolution:
/// 1. A named identity acts as itself; an anonymous one acts as [`ANY_USER`].
/// 2. No table on the entity grants everything to everyone.
/// 3. With a table, the user's grants decide by membership; users without an
///    entry hold nothing.
///
/// Denials are logged here and alter no state; propagation to the caller is
/// mandatory.
pub fn check_access(
    table: Option<&PermissionTable>,
    identity: &Identity,
    capability: Capability,
    entity: &str,
) -> Result<(), PermissionDenied> {
    let user = identity.user().unwrap_or(ANY_USER);
    let granted = table.map_or(CapabilitySet::ALL, |table| table.capabilities_for(user));

    if granted.contains(capability) {
        return Ok(());
    }

    let denied = PermissionDenied {
        user: user.to_string(),
        requested: capability,
        entity: entity.to_string(),
        granted,
    };
    warn!(
        user = %denied.user,
        requested = %denied.requested,
        entity = %denied.entity,
        granted = %denied.granted,
        "entity access denied"
    );
    Err(denied)
}
