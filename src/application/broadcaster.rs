// Push-channel fan-out of serialized frames to connected viewers
use serde::Serialize;
use tokio::sync::broadcast;

pub const DEFAULT_CAPACITY: usize = 256;

/// One serialized frame tagged with the ingest sequence that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayUpdate {
    pub seq: u64,
    pub payload: String,
}

#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<RelayUpdate>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RelayUpdate> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Serialize a frame and hand a copy to every subscriber. Returns how many received it.
    pub fn publish<T: Serialize>(&self, seq: u64, frame: &T) -> usize {
        let payload = match serde_json::to_string(frame) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize frame: {}", e);
                return 0;
            }
        };

        // No subscribers is the normal idle state, not a failure
        self.tx.send(RelayUpdate { seq, payload }).unwrap_or(0)
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
