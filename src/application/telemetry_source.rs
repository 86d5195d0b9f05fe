// Source trait for decoded telemetry messages from the bus
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("undecodable message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("source read failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait TelemetrySource: Send {
    /// Next decoded message, `None` once the source is exhausted.
    ///
    /// A decode failure affects only that message; callers keep polling.
    async fn next_event(&mut self) -> Option<Result<Value, SourceError>>;

    /// Release the underlying consumer.
    async fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
