// Application layer - ingest use cases and the push channel
pub mod broadcaster;
pub mod ingest_pipeline;
pub mod materializer;
pub mod telemetry_session;
pub mod telemetry_source;
