//! Authentication middleware for the HTTP layer.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use hearth_auth::{AuthAttempt, Identity};
use tracing::debug;

use crate::http::constants::{HEADER_AUTH, HEADER_FORWARDED_FOR, QUERY_API_PASSWORD};
use crate::http::errors::ApiError;
use crate::state::ApiState;

/// Per-request authentication verdict, attached as a request extension.
///
/// Owned by the request's lifetime; handlers read it, nothing else writes it.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Whether the caller presented a valid credential or a trusted origin.
    pub authenticated: bool,
    /// Identity resolved from a named credential, when one matched.
    pub identity: Identity,
}

impl AuthContext {
    /// The caller's identity, or an `unauthorized` error when the request
    /// carried no valid credential.
    pub(crate) fn require_authenticated(&self) -> Result<&Identity, ApiError> {
        if self.authenticated {
            Ok(&self.identity)
        } else {
            Err(ApiError::unauthorized(
                "request carried no valid credential",
            ))
        }
    }
}

/// Authentication middleware run for every request.
///
/// SECURITY DEFAULT: when neither a shared secret nor named credentials are
/// configured, every request is authenticated unconditionally. A
/// zero-configuration gateway is open by design; operators opt in to
/// authentication by configuring `http.api_password` or `http.api_users`.
///
/// Otherwise the checks run strictly in order, stopping at the first
/// success: the `x-hearth-auth` header, the `api_password` query parameter,
/// then the trusted-network origin match. The middleware never rejects;
/// handlers decide what an unauthenticated request may do.
pub(crate) async fn authenticate(
    State(state): State<Arc<ApiState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let attempt = evaluate(&state, &req);
    if !attempt.authenticated {
        state.metrics.inc_auth_failure();
        debug!(path = %req.uri().path(), "request not authenticated");
    }

    req.extensions_mut().insert(AuthContext {
        authenticated: attempt.authenticated,
        identity: attempt.identity,
    });

    next.run(req).await
}

fn evaluate(state: &ApiState, req: &Request<Body>) -> AuthAttempt {
    if !state.verifier.has_credentials() {
        return AuthAttempt::anonymous();
    }

    let mut attempt = AuthAttempt::denied();

    if let Some(secret) = header_secret(req) {
        attempt = state.verifier.verify(&secret);
    }

    if !attempt.authenticated
        && let Some(secret) = query_secret(req)
    {
        attempt = state.verifier.verify(&secret);
    }

    if !attempt.authenticated && state.trusted.is_trusted(caller_ip(state, req)) {
        debug!("request authenticated by trusted network origin");
        attempt = AuthAttempt::anonymous();
    }

    attempt
}

fn header_secret(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(HEADER_AUTH)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn query_secret(req: &Request<Body>) -> Option<String> {
    let query = req.uri().query()?;
    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=')
            && key == QUERY_API_PASSWORD
            && !value.is_empty()
        {
            return Some(value.to_string());
        }
    }
    None
}

/// Best-effort caller address: the first `x-forwarded-for` entry when the
/// listener sits behind a proxy, otherwise the socket peer address.
fn caller_ip(state: &ApiState, req: &Request<Body>) -> Option<IpAddr> {
    if state.use_x_forwarded_for
        && let Some(forwarded) = req.headers().get(HEADER_FORWARDED_FOR)
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next()
        && let Ok(ip) = first.trim().parse::<IpAddr>()
    {
        return Some(ip);
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}
