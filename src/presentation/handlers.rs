// HTTP request handlers
use crate::domain::chart::ChartView;
use crate::presentation::app_state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current chart series plus the fixed renderer options
pub async fn get_series(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.snapshot.borrow().clone();
    Json(ChartView {
        options: &state.chart_options,
        series: &snapshot.series,
    })
    .into_response()
}

/// Accept a bus payload (single message, envelope or batch) from a producer
pub async fn ingest_events(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let Some(ingest) = state.ingest.as_ref() else {
        return (StatusCode::NOT_FOUND, "HTTP ingest is disabled").into_response();
    };

    match ingest.submit(body) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            tracing::warn!("Rejected ingest payload: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

/// Relay record frames as Server-Sent Events
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut updates = BroadcastStream::new(state.broadcaster.subscribe());
    let mut shutdown = state.shutdown.clone();

    let stream = async_stream::stream! {
        loop {
            let frame = tokio::select! {
                _ = shutdown.changed() => None,
                frame = updates.next() => frame,
            };

            match frame {
                Some(Ok(update)) => {
                    let event = Event::default().id(update.seq.to_string()).data(update.payload);
                    yield Ok::<_, Infallible>(event);
                }
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    tracing::warn!(skipped, "SSE viewer lagged, frames dropped");
                }
                None => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
