// Newline-delimited JSON telemetry source (stdin, files, piped bus consumers)
use crate::application::telemetry_source::{SourceError, TelemetrySource};
use crate::infrastructure::bus_event::decode_payload;
use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

pub struct NdjsonSource<R> {
    origin: String,
    lines: Lines<R>,
    pending: VecDeque<Value>,
    finished: bool,
}

impl<R: AsyncBufRead + Unpin + Send> NdjsonSource<R> {
    pub fn new(reader: R, origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            lines: reader.lines(),
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

impl NdjsonSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), "stdin")
    }
}

impl NdjsonSource<BufReader<File>> {
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open telemetry file {}", path.display()))?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> TelemetrySource for NdjsonSource<R> {
    async fn next_event(&mut self) -> Option<Result<Value, SourceError>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }

            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match decode_payload(line.as_bytes()) {
                        Ok(events) => self.pending.extend(events),
                        Err(e) => return Some(Err(e)),
                    }
                }
                Ok(None) => {
                    tracing::debug!("Reached end of {}", self.origin);
                    self.finished = true;
                }
                Err(e) => {
                    tracing::error!("Read from {} failed: {}", self.origin, e);
                    self.finished = true;
                    return Some(Err(SourceError::Io(e)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;

    async fn drain<R: AsyncBufRead + Unpin + Send>(
        source: &mut NdjsonSource<R>,
    ) -> Vec<Result<Value, SourceError>> {
        let mut events = Vec::new();
        while let Some(event) = source.next_event().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_reads_lines_batches_and_skips_blanks() {
        let input = concat!(
            "{\"droneId\":\"d1\"}\n",
            "\n",
            "[{\"droneId\":\"d2\"},{\"droneId\":\"d3\"}]\n",
            "   \n",
            "{\"droneId\":\"d4\"}"
        );
        let mut source = NdjsonSource::new(Cursor::new(input.as_bytes().to_vec()), "test");

        let ids: Vec<String> = drain(&mut source)
            .await
            .into_iter()
            .map(|e| e.unwrap()["droneId"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["d1", "d2", "d3", "d4"]);
    }

    #[tokio::test]
    async fn test_bad_line_does_not_end_the_stream() {
        let input = "{\"droneId\":\"d1\"}\nnot json\n{\"droneId\":\"d2\"}\n";
        let mut source = NdjsonSource::new(Cursor::new(input.as_bytes().to_vec()), "test");

        let events = drain(&mut source).await;
        assert_eq!(events.len(), 3);
        assert!(events[0].is_ok());
        assert!(matches!(events[1], Err(SourceError::Decode(_))));
        assert!(events[2].is_ok());
        assert!(source.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_open_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"droneId\":\"d1\",\"timestamp\":\"t1\",\"speed_mps\":1}}").unwrap();

        let mut source = NdjsonSource::open(file.path()).await.unwrap();
        let events = drain(&mut source).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap()["timestamp"], "t1");
    }

    #[tokio::test]
    async fn test_open_missing_file_fails() {
        assert!(NdjsonSource::open("/definitely/not/here.ndjson").await.is_err());
    }
}
