// Route table for viewers, renderers and producers
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_series, health_check, ingest_events, stream_events};
use crate::presentation::ws::ws_handler;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Only the snapshot is compressed; streamed responses must flush per frame
    let api_routes = Router::new()
        .route("/series", get(get_series).layer(CompressionLayer::new()))
        .route("/stream", get(stream_events))
        .route("/events", post(ingest_events));

    Router::new()
        .route("/healthz", get(health_check))
        .route("/ws", get(ws_handler))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
