//! Router construction and server host for the API.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::{MatchedPath, Request, State},
    http::{HeaderName, Method, header::CONTENT_TYPE},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use hearth_config::Settings;
use hearth_entity::EntityRegistry;
use hearth_events::EventBus;
use hearth_telemetry::Metrics;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Span, info};

use crate::http::auth::authenticate;
use crate::http::constants::{HEADER_AUTH, HEADER_LAST_EVENT_ID};
use crate::http::health::{health, metrics};
use crate::http::sse::stream_events;
use crate::http::switches::{get_state, list_states, refresh, turn_off, turn_on};
use crate::state::ApiState;

/// Errors raised while hosting the API.
#[derive(Debug, Error)]
pub enum ApiServerError {
    /// Binding the listener failed.
    #[error("failed to bind api listener")]
    Bind {
        /// Address the listener attempted to bind.
        addr: SocketAddr,
        /// Source IO error.
        source: io::Error,
    },
    /// Serving requests failed.
    #[error("api server terminated with an error")]
    Serve {
        /// Source IO error.
        source: io::Error,
    },
}

/// Axum router wrapper that hosts the Hearth API services.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Construct a new API server with shared dependencies wired through
    /// application state.
    #[must_use]
    pub fn new(
        settings: &Settings,
        registry: EntityRegistry,
        events: EventBus,
        metrics: Metrics,
    ) -> Self {
        let state = Arc::new(ApiState::new(
            settings.verifier(),
            settings.trusted_networks(),
            settings.http.use_x_forwarded_for,
            registry,
            events,
            metrics,
        ));
        Self {
            router: Self::build_router(state),
        }
    }

    fn build_router(state: Arc<ApiState>) -> Router {
        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                CONTENT_TYPE,
                HeaderName::from_static(HEADER_AUTH),
                HeaderName::from_static(HEADER_LAST_EVENT_ID),
            ]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_response(|response: &Response, latency: Duration, span: &Span| {
                span.record("status_code", response.status().as_u16());
                span.record(
                    "latency_ms",
                    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                );
            });

        Router::new()
            .route("/api/health", get(health))
            .route("/api/metrics", get(metrics))
            .route("/api/states", get(list_states))
            .route("/api/states/{entity_id}", get(get_state))
            .route("/api/switches/{entity_id}/turn_on", post(turn_on))
            .route("/api/switches/{entity_id}/turn_off", post(turn_off))
            .route("/api/switches/{entity_id}/refresh", post(refresh))
            .route("/api/stream", get(stream_events))
            .layer(middleware::from_fn_with_state(
                Arc::clone(&state),
                authenticate,
            ))
            .layer(middleware::from_fn_with_state(
                Arc::clone(&state),
                record_http_request,
            ))
            .layer(trace_layer)
            .layer(cors_layer)
            .with_state(state)
    }

    /// Clone of the underlying router, mainly for in-process tests.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the listener and serve requests until shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or serving fails.
    pub async fn serve(self, addr: SocketAddr) -> Result<(), ApiServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(addr = %addr, "api listener bound");
        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|source| ApiServerError::Serve { source })?;
        Ok(())
    }
}

async fn record_http_request(
    State(state): State<Arc<ApiState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| req.uri().path().to_string(), |m| m.as_str().to_string());
    let response = next.run(req).await;
    state
        .metrics
        .inc_http_request(&route, response.status().as_u16());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;

    use axum::body::to_bytes;
    use axum::extract::ConnectInfo;
    use axum::http::{Request as HttpRequest, StatusCode};
    use hearth_auth::hash_password;
    use hearth_entity::ShellCommandRunner;
    use tower::ServiceExt;

    use crate::models::{EntityState, ProblemDetails};

    fn build_server(config: &str) -> ApiServer {
        let settings: Settings = toml::from_str(config).expect("test settings parse");
        let events = EventBus::with_capacity(16);
        let metrics = Metrics::new().expect("metrics registry builds");
        let registry = EntityRegistry::new(
            settings.switch_specs(),
            StdArc::new(ShellCommandRunner),
            &events,
            &metrics,
        );
        ApiServer::new(&settings, registry, events, metrics)
    }

    fn get(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).expect("body deserialises")
    }

    const OPEN_CONFIG: &str = r#"
[http]

[switches.lamp]
friendly_name = "Lamp"
"#;

    fn secured_config() -> String {
        format!(
            r#"
[http]
api_password = "S"
trusted_networks = ["10.0.0.0/24"]

[http.api_users.alice]
password_hash = "{alice}"

[http.api_users.bob]
password_hash = "{bob}"

[switches.lamp]
friendly_name = "Lamp"

[switches.lamp.permissions]
alice = "rw"
bob = "r"
"#,
            alice = hash_password("pw1"),
            bob = hash_password("pw2"),
        )
    }

    #[tokio::test]
    async fn zero_configuration_authenticates_every_request() {
        let router = build_server(OPEN_CONFIG).router();
        let response = router.oneshot(get("/api/states")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let states: Vec<EntityState> = body_json(response).await;
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].entity_id, "lamp");
        assert_eq!(states[0].state, "off");
    }

    #[tokio::test]
    async fn missing_secret_reaches_handler_and_is_rejected_there() {
        let router = build_server(&secured_config()).router();
        let response = router.oneshot(get("/api/states")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let problem: ProblemDetails = body_json(response).await;
        assert_eq!(problem.status, 401);
    }

    #[tokio::test]
    async fn legacy_secret_authenticates_via_header() {
        let router = build_server(&secured_config()).router();
        let mut request = get("/api/states");
        request
            .headers_mut()
            .insert(HEADER_AUTH, "S".parse().unwrap());
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_header_secret_is_not_authenticated() {
        let router = build_server(&secured_config()).router();
        let mut request = get("/api/states");
        request
            .headers_mut()
            .insert(HEADER_AUTH, "wrong".parse().unwrap());
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn query_parameter_secret_authenticates() {
        let router = build_server(&secured_config()).router();
        let response = router
            .oneshot(get("/api/states?api_password=S"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn trusted_network_origin_authenticates() {
        let router = build_server(&secured_config()).router();
        let mut request = get("/api/states");
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 5], 40000))));
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn untrusted_origin_is_not_authenticated() {
        let router = build_server(&secured_config()).router();
        let mut request = get("/api/states");
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 1], 40000))));
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn forwarded_header_is_ignored_unless_enabled() {
        let router = build_server(&secured_config()).router();
        let mut request = get("/api/states");
        request
            .headers_mut()
            .insert("x-forwarded-for", "10.0.0.5".parse().unwrap());
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn forwarded_header_resolves_origin_when_enabled() {
        let config = secured_config().replace(
            "trusted_networks = [\"10.0.0.0/24\"]",
            "trusted_networks = [\"10.0.0.0/24\"]\nuse_x_forwarded_for = true",
        );
        let router = build_server(&config).router();
        let mut request = get("/api/states");
        request
            .headers_mut()
            .insert("x-forwarded-for", "10.0.0.5, 172.16.0.1".parse().unwrap());
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn named_user_with_write_permission_can_switch() {
        let router = build_server(&secured_config()).router();
        let mut request = post("/api/switches/lamp/turn_on");
        request
            .headers_mut()
            .insert(HEADER_AUTH, "pw1".parse().unwrap());
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let state: EntityState = body_json(response).await;
        assert_eq!(state.state, "on");
        assert!(state.assumed_state);
    }

    #[tokio::test]
    async fn read_only_user_is_denied_with_structured_fields() {
        let router = build_server(&secured_config()).router();
        let mut request = post("/api/switches/lamp/turn_on");
        request
            .headers_mut()
            .insert(HEADER_AUTH, "pw2".parse().unwrap());
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let problem: ProblemDetails = body_json(response).await;
        let denial = problem.denial.expect("denial payload present");
        assert_eq!(denial.user, "bob");
        assert_eq!(denial.requested, "w");
        assert_eq!(denial.entity, "Lamp");
        assert_eq!(denial.granted, "r");
    }

    #[tokio::test]
    async fn read_only_user_still_sees_the_entity() {
        let router = build_server(&secured_config()).router();
        let mut request = get("/api/states/lamp");
        request
            .headers_mut()
            .insert(HEADER_AUTH, "pw2".parse().unwrap());
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn anonymous_caller_is_filtered_out_of_restricted_listings() {
        // Authenticated via the legacy secret, so no named user resolves and
        // the lamp's table has no entry for the sentinel identity.
        let router = build_server(&secured_config()).router();
        let response = router
            .oneshot(get("/api/states?api_password=S"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let states: Vec<EntityState> = body_json(response).await;
        assert!(states.is_empty());
    }

    #[tokio::test]
    async fn unknown_entity_is_not_found() {
        let router = build_server(OPEN_CONFIG).router();
        let response = router
            .oneshot(post("/api/switches/nope/turn_on"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn refresh_without_state_command_reports_unknown() {
        let router = build_server(OPEN_CONFIG).router();
        let response = router
            .oneshot(post("/api/switches/lamp/refresh"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let state: EntityState = body_json(response).await;
        assert_eq!(state.state, "unknown");
    }

    #[tokio::test]
    async fn health_is_reachable_without_credentials() {
        let router = build_server(&secured_config()).router();
        let response = router.oneshot(get("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_render_in_text_format() {
        let router = build_server(OPEN_CONFIG).router();
        let response = router.oneshot(get("/api/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("configured_entities"));
    }
}
