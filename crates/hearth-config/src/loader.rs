//! Settings file loading.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;
use crate::validate::validate_settings;

/// Settings file consulted when `HEARTH_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "hearth.toml";

/// Read, parse, and validate the settings file at `path`.
///
/// # Errors
///
/// Returns an error when the file cannot be read, is not valid TOML for the
/// settings schema, or fails validation.
pub fn load_settings(path: &Path) -> ConfigResult<Settings> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "settings.read",
        path: path.to_path_buf(),
        source,
    })?;

    let settings: Settings = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_settings(&settings)?;
    info!(
        path = %path.display(),
        switches = settings.switches.len(),
        users = settings.http.api_users.len(),
        "settings loaded"
    );
    Ok(settings)
}
