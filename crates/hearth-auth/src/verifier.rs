//! Secret verification against the configured credential set.

use std::collections::BTreeMap;

use tracing::debug;

use crate::compare::constant_time_eq;
use crate::hash::hash_password;
use crate::identity::Identity;

/// Outcome of a single verification attempt.
///
/// A wrong secret is an expected outcome, not an error; there is no failure
/// path here beyond `authenticated == false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthAttempt {
    /// Whether the presented secret matched any configured credential.
    pub authenticated: bool,
    /// Identity resolved from a named-credential match.
    pub identity: Identity,
}

impl AuthAttempt {
    /// Verdict for a caller that matched nothing.
    #[must_use]
    pub const fn denied() -> Self {
        Self {
            authenticated: false,
            identity: Identity::Anonymous,
        }
    }

    /// Verdict for a caller that proved possession without a name (legacy
    /// shared secret or trusted origin).
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            authenticated: true,
            identity: Identity::Anonymous,
        }
    }

    /// Verdict for a caller that matched a named credential.
    #[must_use]
    pub const fn named(user: String) -> Self {
        Self {
            authenticated: true,
            identity: Identity::Named(user),
        }
    }
}

/// Verifies presented secrets against the legacy shared secret and the
/// named-credential map.
///
/// The precedence is part of the security model and must not be reordered:
/// the legacy secret is checked first, then each stored digest. The key
/// derivation runs at most once per attempt, however many users are
/// configured.
#[derive(Debug, Clone, Default)]
pub struct CredentialVerifier {
    api_password: Option<String>,
    users: BTreeMap<String, String>,
}

impl CredentialVerifier {
    /// Build a verifier from the configured legacy secret and user digests.
    #[must_use]
    pub fn new(api_password: Option<String>, users: BTreeMap<String, String>) -> Self {
        Self {
            api_password,
            users,
        }
    }

    /// Whether any credential is configured at all. When this is false the
    /// gateway runs open: the middleware authenticates every request.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.api_password.is_some() || !self.users.is_empty()
    }

    /// Check a presented secret against every configured credential.
    #[must_use]
    pub fn verify(&self, presented: &str) -> AuthAttempt {
        if let Some(api_password) = &self.api_password
            && constant_time_eq(presented.as_bytes(), api_password.as_bytes())
        {
            debug!("legacy shared secret matched");
            return AuthAttempt::anonymous();
        }

        if !self.users.is_empty() {
            let digest = hash_password(presented);
            for (user, stored) in &self.users {
                if constant_time_eq(digest.as_bytes(), stored.as_bytes()) {
                    debug!(user = %user, "stored digest matched");
                    return AuthAttempt::named(user.clone());
                }
            }
        }

        AuthAttempt::denied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(user, password)| ((*user).to_string(), hash_password(password)))
            .collect()
    }

    #[test]
    fn legacy_secret_matches_without_a_name() {
        let verifier = CredentialVerifier::new(Some("S".to_string()), BTreeMap::new());
        let attempt = verifier.verify("S");
        assert!(attempt.authenticated);
        assert_eq!(attempt.identity, Identity::Anonymous);
    }

    #[test]
    fn wrong_legacy_secret_is_denied() {
        let verifier = CredentialVerifier::new(Some("S".to_string()), BTreeMap::new());
        assert_eq!(verifier.verify("wrong"), AuthAttempt::denied());
    }

    #[test]
    fn named_credentials_resolve_the_matching_user() {
        let verifier = CredentialVerifier::new(None, users(&[("alice", "pw1"), ("bob", "pw2")]));
        assert_eq!(
            verifier.verify("pw1").identity,
            Identity::Named("alice".to_string())
        );
        assert_eq!(
            verifier.verify("pw2").identity,
            Identity::Named("bob".to_string())
        );
        assert!(!verifier.verify("pw3").authenticated);
    }

    #[test]
    fn legacy_secret_takes_precedence_over_users() {
        let verifier =
            CredentialVerifier::new(Some("pw1".to_string()), users(&[("alice", "pw1")]));
        let attempt = verifier.verify("pw1");
        assert!(attempt.authenticated);
        assert_eq!(attempt.identity, Identity::Anonymous);
    }

    #[test]
    fn no_credentials_denies_every_secret() {
        let verifier = CredentialVerifier::default();
        assert!(!verifier.has_credentials());
        assert!(!verifier.verify("anything").authenticated);
    }
}
