// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::application::broadcaster::{Broadcaster, DEFAULT_CAPACITY};
use crate::application::ingest_pipeline::{IngestPipeline, SeriesSnapshot};
use crate::application::telemetry_session::TelemetrySession;
use crate::application::telemetry_source::TelemetrySource;
use crate::domain::chart::ChartOptions;
use crate::infrastructure::config::{load_relay_config, RelayConfig, SourceKind};
use crate::infrastructure::http_ingest::{self, HttpIngestHandle};
use crate::infrastructure::ndjson_source::NdjsonSource;
use crate::presentation::app_state::AppState;
use crate::presentation::router::create_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (invalid settings abort startup)
    let config = load_relay_config()?;

    // Initialize tracing, RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Create telemetry source (bus boundary)
    let (source, ingest) = open_source(&config).await?;

    // Create session and pipeline (application layer)
    let broadcaster = Broadcaster::new(DEFAULT_CAPACITY);
    let (snapshot_tx, snapshot_rx) = watch::channel(SeriesSnapshot::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let session = TelemetrySession::new(config.window.max_len, config.window.max_entities);
    let pipeline = IngestPipeline::new(session, broadcaster.clone(), snapshot_tx);
    let ingest_task = tokio::spawn(pipeline.run(source, shutdown_rx.clone()));

    // Create application state
    let state = Arc::new(AppState {
        broadcaster,
        snapshot: snapshot_rx,
        ingest,
        chart_options: ChartOptions::default(),
        shutdown: shutdown_rx,
    });

    // Build router (presentation layer)
    let router = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;
    tracing::info!(
        source = ?config.source.kind,
        max_len = config.window.max_len,
        max_entities = config.window.max_entities,
        "Starting drone-telemetry-relay on {}",
        listener.local_addr()?
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    // Stop ingest; the in-memory window is discarded with the pipeline
    match ingest_task.await {
        Ok(stats) => tracing::info!(accepted = stats.accepted, "Relay stopped"),
        Err(e) => tracing::error!("Ingest pipeline panicked: {}", e),
    }

    Ok(())
}

async fn open_source(
    config: &RelayConfig,
) -> anyhow::Result<(Box<dyn TelemetrySource>, Option<HttpIngestHandle>)> {
    match config.source.kind {
        SourceKind::Stdin => {
            let source: Box<dyn TelemetrySource> = Box::new(NdjsonSource::stdin());
            Ok((source, None))
        }
        SourceKind::File => {
            let path = config
                .source
                .path
                .as_deref()
                .context("source.path is required for file sources")?;
            let source: Box<dyn TelemetrySource> = Box::new(NdjsonSource::open(path).await?);
            Ok((source, None))
        }
        SourceKind::Http => {
            let (handle, source) = http_ingest::channel(config.source.channel_capacity);
            let source: Box<dyn TelemetrySource> = Box::new(source);
            Ok((source, Some(handle)))
        }
    }
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown requested");
    let _ = shutdown_tx.send(true);
}
