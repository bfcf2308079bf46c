use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use hearth_api::ApiServer;
use hearth_config::{DEFAULT_CONFIG_PATH, Settings, load_settings};
use hearth_entity::{EntityRegistry, ShellCommandRunner};
use hearth_events::EventBus;
use hearth_telemetry::{LogFormat, LoggingConfig, Metrics};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Environment variable naming the settings file.
const CONFIG_ENV: &str = "HEARTH_CONFIG";

/// Dependencies required to bootstrap the Hearth gateway.
pub(crate) struct BootstrapDependencies {
    settings: Settings,
    events: EventBus,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment for the binary
    /// entrypoint.
    pub(crate) fn from_env() -> AppResult<Self> {
        let path = std::env::var(CONFIG_ENV)
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        let settings = load_settings(&path).map_err(|err| AppError::config("settings.load", err))?;
        Self::from_settings(settings)
    }

    /// Construct dependencies around already-loaded settings.
    pub(crate) fn from_settings(settings: Settings) -> AppResult<Self> {
        let events = EventBus::new();
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            settings,
            events,
            telemetry,
        })
    }
}

/// Entry point for the Hearth application boot sequence.
///
/// # Errors
///
/// Returns an error if dependency construction or application startup fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

/// Boot sequence that relies entirely on injected dependencies to simplify
/// testing.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    let BootstrapDependencies {
        settings,
        events,
        telemetry,
    } = dependencies;

    let logging = LoggingConfig {
        level: &settings.log.level,
        format: settings
            .log
            .format
            .as_deref()
            .map_or_else(LogFormat::infer, LogFormat::from_name),
    };
    hearth_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    info!("Hearth gateway bootstrap starting");

    let registry = EntityRegistry::new(
        settings.switch_specs(),
        Arc::new(ShellCommandRunner),
        &events,
        &telemetry,
    );
    events.publish(hearth_events::Event::SettingsChanged {
        description: format!("settings loaded with {} switches", registry.len()),
    });

    let api = ApiServer::new(&settings, registry, events.clone(), telemetry.clone());

    let addr = SocketAddr::new(settings.http.bind_addr, settings.http.port);
    info!(addr = %addr, "Launching API listener");

    api.serve(addr)
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("API server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependencies_build_from_settings() -> AppResult<()> {
        let settings: Settings =
            toml::from_str("[http]\n[switches.lamp]\n").expect("settings parse");
        let deps = BootstrapDependencies::from_settings(settings)?;
        assert_eq!(deps.settings.switches.len(), 1);
        assert!(deps.events.last_event_id().is_none());
        assert_eq!(deps.telemetry.snapshot().configured_entities, 0);
        Ok(())
    }
}
