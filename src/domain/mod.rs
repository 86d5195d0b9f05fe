// Domain layer - telemetry records, entity tracking, sliding windows
pub mod chart;
pub mod normalizer;
pub mod registry;
pub mod telemetry;
pub mod window;
