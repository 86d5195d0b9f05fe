// Ingest pipeline - drives one session from a telemetry source to viewers
use crate::application::broadcaster::Broadcaster;
use crate::application::telemetry_session::{IngestOutcome, TelemetrySession};
use crate::application::telemetry_source::{SourceError, TelemetrySource};
use crate::domain::telemetry::Series;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// Current series together with the sequence of the last record folded into them.
#[derive(Debug, Clone, Default)]
pub struct SeriesSnapshot {
    pub seq: u64,
    pub series: Arc<Vec<Series>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub received: u64,
    pub accepted: u64,
    pub malformed: u64,
    pub rejected_capacity: u64,
    pub decode_failures: u64,
}

pub struct IngestPipeline {
    session: TelemetrySession,
    broadcaster: Broadcaster,
    snapshot_tx: watch::Sender<SeriesSnapshot>,
    seq: u64,
    stats: IngestStats,
}

impl IngestPipeline {
    pub fn new(
        session: TelemetrySession,
        broadcaster: Broadcaster,
        snapshot_tx: watch::Sender<SeriesSnapshot>,
    ) -> Self {
        Self {
            session,
            broadcaster,
            snapshot_tx,
            seq: 0,
            stats: IngestStats::default(),
        }
    }

    /// Process one decoded message end to end. Never fails.
    pub fn handle_event(&mut self, raw: Value) -> IngestOutcome {
        self.stats.received += 1;
        let outcome = self.session.ingest(&raw);

        match &outcome {
            IngestOutcome::Accepted(record) => {
                self.stats.accepted += 1;
                self.seq += 1;
                // Snapshot first: a viewer greeted from it can drop frames with seq <= snapshot.seq
                self.snapshot_tx.send_replace(SeriesSnapshot {
                    seq: self.seq,
                    series: Arc::new(self.session.series()),
                });
                let delivered = self
                    .broadcaster
                    .publish(self.seq, &record.to_relay_frame(self.seq));
                tracing::trace!(
                    entity_id = %record.entity_id,
                    seq = self.seq,
                    delivered,
                    "Relayed telemetry"
                );
            }
            IngestOutcome::Malformed => self.stats.malformed += 1,
            IngestOutcome::CapacityExceeded(_) => self.stats.rejected_capacity += 1,
        }

        outcome
    }

    fn handle_decode_failure(&mut self, error: SourceError) {
        self.stats.decode_failures += 1;
        tracing::warn!(error = %error, "Dropping undecodable message");
    }

    #[cfg(test)]
    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Consume the source until it is exhausted or shutdown is signalled.
    pub async fn run(
        mut self,
        mut source: Box<dyn TelemetrySource>,
        mut shutdown: watch::Receiver<bool>,
    ) -> IngestStats {
        tracing::info!("Ingest pipeline started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("Ingest pipeline stopping on shutdown");
                    break;
                }
                next = source.next_event() => match next {
                    Some(Ok(raw)) => {
                        self.handle_event(raw);
                    }
                    Some(Err(e)) => self.handle_decode_failure(e),
                    None => {
                        tracing::info!("Telemetry source exhausted");
                        break;
                    }
                }
            }
        }

        if let Err(e) = source.close().await {
            tracing::warn!("Failed to close telemetry source: {}", e);
        }

        let stats = self.stats;
        tracing::info!(
            received = stats.received,
            accepted = stats.accepted,
            malformed = stats.malformed,
            rejected_capacity = stats.rejected_capacity,
            decode_failures = stats.decode_failures,
            "Ingest pipeline stopped"
        );
        stats
    }
}
