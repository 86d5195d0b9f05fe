// Infrastructure layer - bus sources and configuration
pub mod bus_event;
pub mod config;
pub mod http_ingest;
pub mod ndjson_source;
