// Telemetry session - owned registry + window state for one viewer timeline
use crate::application::materializer::materialize;
use crate::domain::normalizer::normalize;
use crate::domain::registry::{EntityRegistry, DEFAULT_MAX_ENTITIES};
use crate::domain::telemetry::{Series, TelemetryRecord};
use crate::domain::window::{WindowedSeriesStore, DEFAULT_MAX_LEN};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Accepted(TelemetryRecord),
    Malformed,
    CapacityExceeded(String),
}

#[derive(Debug)]
pub struct TelemetrySession {
    registry: EntityRegistry,
    store: WindowedSeriesStore,
}

impl TelemetrySession {
    pub fn new(max_len: usize, max_entities: usize) -> Self {
        Self {
            registry: EntityRegistry::new(max_entities),
            store: WindowedSeriesStore::new(max_len),
        }
    }

    /// Normalize, admit and append one raw message.
    pub fn ingest(&mut self, raw: &Value) -> IngestOutcome {
        let Some(record) = normalize(raw) else {
            return IngestOutcome::Malformed;
        };

        if self.registry.admit_or_lookup(&record.entity_id).is_none() {
            return IngestOutcome::CapacityExceeded(record.entity_id);
        }

        self.store
            .append(&record.entity_id, record.timestamp.clone(), record.speed);
        IngestOutcome::Accepted(record)
    }

    pub fn series(&self) -> Vec<Series> {
        materialize(&self.registry, &self.store)
    }

    #[cfg(test)]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub fn store(&self) -> &WindowedSeriesStore {
        &self.store
    }
}

impl Default for TelemetrySession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEN, DEFAULT_MAX_ENTITIES)
    }
}
