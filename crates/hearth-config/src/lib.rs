//! Configuration loading and validation for the Hearth gateway.
//!
//! # Design
//! - Settings are declared in a single TOML file and parsed into typed
//!   models; nothing else in the workspace touches raw configuration text.
//! - Validation happens at load time so the rest of the system can assume
//!   digests, slugs, and permission strings are well formed.

mod error;
mod loader;
mod model;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{DEFAULT_CONFIG_PATH, load_settings};
pub use model::{HttpSettings, LogSettings, Settings, SwitchSettings, UserCredential};
