// Application state for HTTP handlers
use crate::application::broadcaster::Broadcaster;
use crate::application::ingest_pipeline::SeriesSnapshot;
use crate::domain::chart::ChartOptions;
use crate::infrastructure::http_ingest::HttpIngestHandle;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Broadcaster,
    pub snapshot: watch::Receiver<SeriesSnapshot>,
    pub ingest: Option<HttpIngestHandle>,
    pub chart_options: ChartOptions,
    pub shutdown: watch::Receiver<bool>,
}
