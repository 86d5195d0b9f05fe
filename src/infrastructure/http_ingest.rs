// HTTP ingest source - producers POST bus payloads, the pipeline drains them
use crate::application::telemetry_source::{SourceError, TelemetrySource};
use crate::infrastructure::bus_event::decode_payload;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("ingest queue is full")]
    Full,
    #[error("ingest pipeline has stopped")]
    Closed,
}

#[derive(Clone)]
pub struct HttpIngestHandle {
    tx: mpsc::Sender<Bytes>,
}

impl HttpIngestHandle {
    /// Queue a raw payload without waiting. Decoding happens in the pipeline.
    pub fn submit(&self, payload: Bytes) -> Result<(), SubmitError> {
        self.tx.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })
    }
}

pub struct HttpIngestSource {
    rx: mpsc::Receiver<Bytes>,
    pending: VecDeque<Value>,
}

pub fn channel(capacity: usize) -> (HttpIngestHandle, HttpIngestSource) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        HttpIngestHandle { tx },
        HttpIngestSource {
            rx,
            pending: VecDeque::new(),
        },
    )
}

#[async_trait]
impl TelemetrySource for HttpIngestSource {
    async fn next_event(&mut self) -> Option<Result<Value, SourceError>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }

            let payload = self.rx.recv().await?;
            match decode_payload(&payload) {
                Ok(events) => self.pending.extend(events),
                Err(e) => return Some(Err(e)),
            }
        }
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.rx.close();
        let dropped = std::iter::from_fn(|| self.rx.try_recv().ok()).count();
        if dropped > 0 {
            tracing::info!(dropped, "Discarded queued payloads on close");
        }
        Ok(())
    }
}
