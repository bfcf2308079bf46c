//! Caller identity resolved during authentication.

use serde::{Deserialize, Serialize};

/// Identity of the caller once authentication has been evaluated.
///
/// A caller authenticated through the legacy shared secret or a trusted
/// network has proven possession, not a name, and stays [`Identity::Anonymous`].
/// Only a named-credential match yields [`Identity::Named`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    /// No named user was resolved for the caller.
    Anonymous,
    /// Caller matched the named credential for this user identifier.
    Named(String),
}

impl Identity {
    /// Name of the user, when one was resolved.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Named(user) => Some(user),
        }
    }
}
