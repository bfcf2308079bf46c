//! Trusted-network membership test for origin-based authentication.

use std::net::IpAddr;

use ipnet::IpNet;

/// Set of networks whose members authenticate by origin alone.
///
/// Purely a numeric containment test over the address handed in by the HTTP
/// layer's real-IP resolution; no reverse lookups, no interface inspection.
#[derive(Debug, Clone, Default)]
pub struct TrustedNetworks {
    networks: Vec<IpNet>,
}

impl TrustedNetworks {
    /// Build the matcher from already-parsed network ranges.
    #[must_use]
    pub fn new(networks: Vec<IpNet>) -> Self {
        Self { networks }
    }

    /// Whether any networks are configured at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// True iff the caller address is known and falls inside at least one
    /// configured network.
    #[must_use]
    pub fn is_trusted(&self, addr: Option<IpAddr>) -> bool {
        addr.is_some_and(|ip| self.networks.iter().any(|net| net.contains(&ip)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn networks(specs: &[&str]) -> TrustedNetworks {
        TrustedNetworks::new(
            specs
                .iter()
                .map(|spec| spec.parse().expect("test network parses"))
                .collect(),
        )
    }

    #[test]
    fn member_address_is_trusted() {
        let trusted = networks(&["10.0.0.0/24"]);
        assert!(trusted.is_trusted(Some("10.0.0.5".parse().unwrap())));
    }

    #[test]
    fn outside_address_is_not_trusted() {
        let trusted = networks(&["10.0.0.0/24"]);
        assert!(!trusted.is_trusted(Some("192.168.1.1".parse().unwrap())));
    }

    #[test]
    fn unknown_origin_is_never_trusted() {
        let trusted = networks(&["10.0.0.0/24"]);
        assert!(!trusted.is_trusted(None));
    }

    #[test]
    fn any_configured_network_grants_trust() {
        let trusted = networks(&["10.0.0.0/24", "fd00::/8"]);
        assert!(trusted.is_trusted(Some("fd00::1".parse().unwrap())));
    }

    #[test]
    fn empty_set_trusts_nothing() {
        assert!(!TrustedNetworks::default().is_trusted(Some("10.0.0.5".parse().unwrap())));
    }
}
