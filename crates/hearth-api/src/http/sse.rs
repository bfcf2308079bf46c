//! Server-sent events streaming for the event bus.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use axum::{
    Extension,
    extract::{Query, State},
    http::HeaderMap,
    response::sse::{self, Sse},
};
use futures_util::StreamExt;
use hearth_events::{EventBus, EventEnvelope, EventId};
use serde::Deserialize;
use tracing::error;

use crate::http::auth::AuthContext;
use crate::http::constants::{EVENT_KIND_WHITELIST, HEADER_LAST_EVENT_ID, SSE_KEEP_ALIVE_SECS};
use crate::http::errors::ApiError;
use crate::state::ApiState;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SseQuery {
    /// Comma-separated event kinds to keep; empty keeps everything.
    #[serde(default)]
    pub(crate) event: Option<String>,
}

pub(crate) async fn stream_events(
    State(state): State<Arc<ApiState>>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl futures_core::Stream<Item = Result<sse::Event, Infallible>> + Send>, ApiError>
{
    auth.require_authenticated()?;

    let last_id = headers
        .get(HEADER_LAST_EVENT_ID)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<EventId>().ok());

    let kinds = parse_kind_filter(&query)?;
    let stream = event_sse_stream(state.events.clone(), last_id, kinds);

    Ok(Sse::new(stream).keep_alive(
        sse::KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS))
            .text("keep-alive"),
    ))
}

pub(crate) fn parse_kind_filter(query: &SseQuery) -> Result<Vec<String>, ApiError> {
    let mut kinds = Vec::new();
    if let Some(events) = query.event.as_deref() {
        for value in events.split(',') {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if !EVENT_KIND_WHITELIST.contains(&value) {
                return Err(ApiError::bad_request(format!(
                    "event filter '{value}' is not recognised"
                )));
            }
            kinds.push(value.to_string());
        }
    }
    Ok(kinds)
}

pub(crate) fn event_replay_stream(
    bus: EventBus,
    since: Option<EventId>,
) -> impl futures_core::Stream<Item = EventEnvelope> + Send {
    stream! {
        let mut stream = bus.subscribe(since);
        while let Some(envelope) = stream.next().await {
            yield envelope;
        }
    }
}

pub(crate) fn event_sse_stream(
    bus: EventBus,
    since: Option<EventId>,
    kinds: Vec<String>,
) -> impl futures_core::Stream<Item = Result<sse::Event, Infallible>> + Send {
    let kinds = Arc::new(kinds);
    event_replay_stream(bus, since)
        .filter({
            let kinds = Arc::clone(&kinds);
            move |envelope| {
                let keep = kinds.is_empty() || kinds.iter().any(|k| k == envelope.event.kind());
                futures_util::future::ready(keep)
            }
        })
        .filter_map(|envelope| async move {
            match serde_json::to_string(&envelope) {
                Ok(payload) => Some(Ok(sse::Event::default()
                    .id(envelope.id.to_string())
                    .event(envelope.event.kind())
                    .data(payload))),
                Err(err) => {
                    error!(error = %err, "failed to serialise SSE event payload");
                    None
                }
            }
        })
}
