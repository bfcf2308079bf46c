//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers deserialized from the settings file.
//! - Conversion helpers hand the parsed values to the auth and entity layers
//!   so those crates never see raw configuration.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};

use hearth_auth::{CredentialVerifier, TrustedNetworks};
use hearth_entity::{PermissionTable, SwitchSpec};
use ipnet::IpNet;
use serde::Deserialize;

/// Root settings document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// HTTP listener and authentication settings.
    pub http: HttpSettings,
    /// Controllable switches, keyed by entity slug.
    #[serde(default)]
    pub switches: BTreeMap<String, SwitchSettings>,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogSettings,
}

/// HTTP listener and authentication settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSettings {
    /// Port the API server binds to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Address the API server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: IpAddr,
    /// Legacy process-wide shared secret. When set, authentication is
    /// mandatory for every request; when absent together with `api_users`,
    /// the gateway runs open.
    #[serde(default)]
    pub api_password: Option<String>,
    /// Named credentials: user identifier to stored password digest.
    #[serde(default)]
    pub api_users: BTreeMap<String, UserCredential>,
    /// Networks whose members authenticate by origin alone.
    #[serde(default)]
    pub trusted_networks: Vec<IpNet>,
    /// Whether to honour `x-forwarded-for` when resolving the caller address.
    #[serde(default)]
    pub use_x_forwarded_for: bool,
}

/// Stored credential for one named user.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserCredential {
    /// Lowercase hex digest produced by the provisioning tool.
    pub password_hash: String,
}

/// One controllable switch.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchSettings {
    /// Display name; falls back to the entity slug.
    #[serde(default)]
    pub friendly_name: Option<String>,
    /// Command executed to turn the switch on.
    #[serde(default = "default_command")]
    pub command_on: String,
    /// Command executed to turn the switch off.
    #[serde(default = "default_command")]
    pub command_off: String,
    /// Optional command polled for the actual state (exit 0 means on).
    #[serde(default)]
    pub command_state: Option<String>,
    /// Per-user permission strings (`r`, `w`, `x`); absence means
    /// unrestricted.
    #[serde(default)]
    pub permissions: Option<BTreeMap<String, String>>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format name (`pretty` or `json`); unset infers from the build.
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

impl Settings {
    /// Build the credential verifier from the configured secrets.
    #[must_use]
    pub fn verifier(&self) -> CredentialVerifier {
        let users = self
            .http
            .api_users
            .iter()
            .map(|(user, credential)| (user.clone(), credential.password_hash.clone()))
            .collect();
        CredentialVerifier::new(self.http.api_password.clone(), users)
    }

    /// Build the trusted-network matcher from the configured ranges.
    #[must_use]
    pub fn trusted_networks(&self) -> TrustedNetworks {
        TrustedNetworks::new(self.http.trusted_networks.clone())
    }

    /// Convert the switch sections into entity specs.
    ///
    /// Assumes [`crate::load_settings`] has validated permission strings; a
    /// string that fails to parse here is a programming error upstream.
    ///
    /// # Panics
    ///
    /// Panics if a permission string was not validated at load time.
    #[must_use]
    pub fn switch_specs(&self) -> Vec<SwitchSpec> {
        self.switches
            .iter()
            .map(|(entity_id, switch)| SwitchSpec {
                entity_id: entity_id.clone(),
                name: switch
                    .friendly_name
                    .clone()
                    .unwrap_or_else(|| entity_id.clone()),
                command_on: switch.command_on.clone(),
                command_off: switch.command_off.clone(),
                command_state: switch.command_state.clone(),
                permissions: switch.permissions.as_ref().map(|grants| {
                    PermissionTable::new(
                        grants
                            .iter()
                            .map(|(user, perm)| {
                                (
                                    user.clone(),
                                    perm.parse().expect("permission string validated at load"),
                                )
                            })
                            .collect(),
                    )
                }),
            })
            .collect()
    }
}

fn default_port() -> u16 {
    8123
}

fn default_bind_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_command() -> String {
    "true".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_auth::Identity;
    use hearth_entity::{Capability, check_access};

    fn minimal_settings(toml: &str) -> Settings {
        toml::from_str(toml).expect("settings parse")
    }

    #[test]
    fn defaults_fill_in_missing_fields() {
        let settings = minimal_settings("[http]\n");
        assert_eq!(settings.http.port, 8123);
        assert_eq!(settings.http.bind_addr, default_bind_addr());
        assert!(settings.http.api_password.is_none());
        assert!(settings.http.api_users.is_empty());
        assert!(settings.switches.is_empty());
        assert_eq!(settings.log.level, "info");
    }

    #[test]
    fn switch_commands_default_to_true() {
        let settings = minimal_settings("[http]\n[switches.lamp]\n");
        let specs = settings.switch_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].command_on, "true");
        assert_eq!(specs[0].command_off, "true");
        assert_eq!(specs[0].name, "lamp");
        assert!(specs[0].permissions.is_none());
    }

    #[test]
    fn permissions_parse_into_capability_sets() {
        let settings = minimal_settings(
            "[http]\n[switches.lamp]\n[switches.lamp.permissions]\nalice = \"rw\"\n",
        );
        let specs = settings.switch_specs();
        let table = specs[0].permissions.as_ref().expect("table present");
        assert!(
            check_access(
                Some(table),
                &Identity::Named("alice".to_string()),
                Capability::Write,
                "lamp",
            )
            .is_ok()
        );
    }

    #[test]
    fn verifier_reflects_configured_credentials() {
        let settings = minimal_settings("[http]\napi_password = \"S\"\n");
        let verifier = settings.verifier();
        assert!(verifier.has_credentials());
        assert!(verifier.verify("S").authenticated);
    }

    #[test]
    fn trusted_networks_round_trip() {
        let settings = minimal_settings("[http]\ntrusted_networks = [\"10.0.0.0/24\"]\n");
        let trusted = settings.trusted_networks();
        assert!(trusted.is_trusted(Some("10.0.0.5".parse().unwrap())));
        assert!(!trusted.is_trusted(Some("192.168.1.1".parse().unwrap())));
    }
}
