//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes a minimal set of counters/gauges relevant to the gateway.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: std::sync::Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    events_emitted_total: IntCounterVec,
    auth_failures_total: IntCounter,
    permission_denials_total: IntCounterVec,
    command_failures_total: IntCounterVec,
    configured_entities: IntGauge,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Number of entities currently configured.
    pub configured_entities: i64,
    /// Total requests that presented no valid credential.
    pub auth_failures_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> Result<Self> {
        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests received"),
            &["route", "code"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "http_requests_total",
            source,
        })?;
        let events_emitted_total = IntCounterVec::new(
            Opts::new("events_emitted_total", "Domain events emitted by type"),
            &["type"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "events_emitted_total",
            source,
        })?;
        let auth_failures_total = IntCounter::with_opts(Opts::new(
            "auth_failures_total",
            "Requests that presented no valid credential",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "auth_failures_total",
            source,
        })?;
        let permission_denials_total = IntCounterVec::new(
            Opts::new(
                "permission_denials_total",
                "Entity actions denied by permission checks",
            ),
            &["capability"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "permission_denials_total",
            source,
        })?;
        let command_failures_total = IntCounterVec::new(
            Opts::new(
                "command_failures_total",
                "Entity shell commands that exited unsuccessfully",
            ),
            &["entity"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "command_failures_total",
            source,
        })?;
        let configured_entities = IntGauge::with_opts(Opts::new(
            "configured_entities",
            "Number of entities loaded from configuration",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "configured_entities",
            source,
        })?;

        let registry = Registry::new();
        register(&registry, "http_requests_total", http_requests_total.clone())?;
        register(
            &registry,
            "events_emitted_total",
            events_emitted_total.clone(),
        )?;
        register(&registry, "auth_failures_total", auth_failures_total.clone())?;
        register(
            &registry,
            "permission_denials_total",
            permission_denials_total.clone(),
        )?;
        register(
            &registry,
            "command_failures_total",
            command_failures_total.clone(),
        )?;
        register(&registry, "configured_entities", configured_entities.clone())?;

        Ok(Self {
            inner: std::sync::Arc::new(MetricsInner {
                registry,
                http_requests_total,
                events_emitted_total,
                auth_failures_total,
                permission_denials_total,
                command_failures_total,
                configured_entities,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Increment the emitted event counter for the specific event type.
    pub fn inc_event(&self, event_type: &str) {
        self.inner
            .events_emitted_total
            .with_label_values(&[event_type])
            .inc();
    }

    /// Increment the failed-authentication counter.
    pub fn inc_auth_failure(&self) {
        self.inner.auth_failures_total.inc();
    }

    /// Increment the permission-denial counter for the requested capability.
    pub fn inc_permission_denial(&self, capability: &str) {
        self.inner
            .permission_denials_total
            .with_label_values(&[capability])
            .inc();
    }

    /// Increment the command-failure counter for the entity.
    pub fn inc_command_failure(&self, entity: &str) {
        self.inner
            .command_failures_total
            .with_label_values(&[entity])
            .inc();
    }

    /// Set the configured-entity gauge.
    pub fn set_configured_entities(&self, count: i64) {
        self.inner.configured_entities.set(count);
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            configured_entities: self.inner.configured_entities.get(),
            auth_failures_total: self.inner.auth_failures_total.get(),
        }
    }
}

fn register<C>(registry: &Registry, name: &'static str, collector: C) -> Result<()>
where
    C: prometheus::core::Collector + 'static,
{
    registry
        .register(Box::new(collector))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}
