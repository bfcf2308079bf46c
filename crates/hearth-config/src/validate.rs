//! Validation helpers for loaded settings.

use hearth_auth::DIGEST_HEX_LEN;
use hearth_entity::CapabilitySet;

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;

/// Validate a parsed settings document.
///
/// Everything checked here is something the rest of the workspace assumes:
/// digests are well formed, slugs are routable, permission strings parse.
pub(crate) fn validate_settings(settings: &Settings) -> ConfigResult<()> {
    if settings.http.port == 0 {
        return Err(ConfigError::InvalidField {
            section: "http".to_string(),
            field: "port".to_string(),
            value: Some("0".to_string()),
            reason: "must be between 1 and 65535",
        });
    }

    for (user, credential) in &settings.http.api_users {
        validate_digest(user, &credential.password_hash)?;
    }

    for (entity_id, switch) in &settings.switches {
        validate_slug(entity_id)?;
        if let Some(permissions) = &switch.permissions {
            for (user, perm) in permissions {
                if perm.parse::<CapabilitySet>().is_err() {
                    return Err(ConfigError::InvalidField {
                        section: format!("switches.{entity_id}.permissions"),
                        field: user.clone(),
                        value: Some(perm.clone()),
                        reason: "permission characters must be from 'rwx'",
                    });
                }
            }
        }
    }

    Ok(())
}

fn validate_digest(user: &str, digest: &str) -> ConfigResult<()> {
    let well_formed = digest.len() == DIGEST_HEX_LEN
        && digest
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
    if well_formed {
        Ok(())
    } else {
        Err(ConfigError::InvalidField {
            section: "http.api_users".to_string(),
            field: user.to_string(),
            value: Some(digest.to_string()),
            reason: "password_hash must be 64 lowercase hex characters",
        })
    }
}

fn validate_slug(entity_id: &str) -> ConfigResult<()> {
    let well_formed = !entity_id.is_empty()
        && entity_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(ConfigError::InvalidField {
            section: "switches".to_string(),
            field: entity_id.to_string(),
            value: None,
            reason: "entity slugs must match [a-z0-9_]+",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_auth::hash_password;

    fn settings_from(toml: &str) -> Settings {
        toml::from_str(toml).expect("settings parse")
    }

    #[test]
    fn valid_settings_pass() {
        let toml = format!(
            "[http]\n[http.api_users.alice]\npassword_hash = \"{}\"\n[switches.lamp]\n[switches.lamp.permissions]\nalice = \"rw\"\n",
            hash_password("pw1")
        );
        assert!(validate_settings(&settings_from(&toml)).is_ok());
    }

    #[test]
    fn zero_port_is_rejected() {
        let err = validate_settings(&settings_from("[http]\nport = 0\n")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { field, .. } if field == "port"));
    }

    #[test]
    fn short_digest_is_rejected() {
        let toml = "[http]\n[http.api_users.alice]\npassword_hash = \"abc123\"\n";
        let err = validate_settings(&settings_from(toml)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { field, .. } if field == "alice"));
    }

    #[test]
    fn uppercase_digest_is_rejected() {
        let digest = hash_password("pw1").to_uppercase();
        let toml = format!("[http]\n[http.api_users.alice]\npassword_hash = \"{digest}\"\n");
        assert!(validate_settings(&settings_from(&toml)).is_err());
    }

    #[test]
    fn bad_permission_string_is_rejected() {
        let toml = "[http]\n[switches.lamp]\n[switches.lamp.permissions]\nalice = \"rq\"\n";
        let err = validate_settings(&settings_from(toml)).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidField { section, .. } if section == "switches.lamp.permissions")
        );
    }

    #[test]
    fn bad_slug_is_rejected() {
        let toml = "[http]\n[switches.\"Kitchen Light\"]\n";
        let err = validate_settings(&settings_from(toml)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { section, .. } if section == "switches"));
    }
}
