// WebSocket push channel for live viewers
use crate::application::broadcaster::RelayUpdate;
use crate::domain::telemetry::Series;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Serialize)]
struct ViewerGreeting<'a> {
    info: &'static str,
    seq: u64,
    series: &'a [Series],
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Frames already folded into the greeting's snapshot are skipped by seq
    let mut updates = state.broadcaster.subscribe();
    let snapshot = state.snapshot.borrow().clone();
    let since = snapshot.seq;
    let Some(greeting) = greeting_frame(since, &snapshot.series) else {
        return;
    };
    if sender.send(Message::Text(greeting)).await.is_err() {
        return;
    }
    tracing::debug!(viewers = state.broadcaster.subscriber_count(), "Viewer connected");

    let mut shutdown = state.shutdown.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let update = tokio::select! {
                _ = shutdown.changed() => break,
                update = next_fresh(&mut updates, since) => update,
            };

            match update {
                Ok(update) => {
                    if sender.send(Message::Text(update.payload)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Viewer lagged, frames dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    // Viewers have nothing to say; just watch for the close
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::debug!("Viewer disconnected");
}

/// Next update newer than `since`.
async fn next_fresh(
    updates: &mut broadcast::Receiver<RelayUpdate>,
    since: u64,
) -> Result<RelayUpdate, RecvError> {
    loop {
        let update = updates.recv().await?;
        if update.seq > since {
            return Ok(update);
        }
    }
}

fn greeting_frame(seq: u64, series: &[Series]) -> Option<String> {
    let greeting = ViewerGreeting {
        info: "WebSocket connected",
        seq,
        series,
    };
    match serde_json::to_string(&greeting) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::error!("Failed to serialize viewer greeting: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::broadcaster::Broadcaster;
    use crate::application::ingest_pipeline::{IngestPipeline, SeriesSnapshot};
    use crate::application::telemetry_session::TelemetrySession;
    use crate::domain::chart::PALETTE;
    use crate::domain::telemetry::SeriesPoint;
    use serde_json::{json, Value};
    use tokio::sync::watch;

    #[test]
    fn test_greeting_carries_current_snapshot() {
        let series = vec![Series::new(
            "d1".to_string(),
            PALETTE[0],
            vec![SeriesPoint::new("t1".to_string(), 4.0)],
        )];
        let frame: Value = serde_json::from_str(&greeting_frame(3, &series).unwrap()).unwrap();

        assert_eq!(frame["info"], "WebSocket connected");
        assert_eq!(frame["seq"], 3);
        assert_eq!(frame["series"][0]["label"], "d1");
        assert_eq!(frame["series"][0]["data"][0]["y"], 4.0);
    }

    #[test]
    fn test_greeting_with_no_series() {
        let frame = greeting_frame(0, &[]).unwrap();
        assert_eq!(frame, r#"{"info":"WebSocket connected","seq":0,"series":[]}"#);
    }

    #[tokio::test]
    async fn test_record_in_greeting_is_not_sent_again() {
        let broadcaster = Broadcaster::default();
        let (snapshot_tx, snapshot_rx) = watch::channel(SeriesSnapshot::default());
        let mut pipeline =
            IngestPipeline::new(TelemetrySession::default(), broadcaster.clone(), snapshot_tx);

        // A record lands between subscribing and reading the snapshot
        let mut updates = broadcaster.subscribe();
        pipeline.handle_event(json!({ "droneId": "d1", "timestamp": "t1", "speed_mps": 1 }));
        let snapshot = snapshot_rx.borrow().clone();
        assert_eq!(snapshot.seq, 1);
        assert_eq!(snapshot.series[0].data.len(), 1);

        pipeline.handle_event(json!({ "droneId": "d1", "timestamp": "t2", "speed_mps": 2 }));

        let update = next_fresh(&mut updates, snapshot.seq).await.unwrap();
        let frame: Value = serde_json::from_str(&update.payload).unwrap();
        assert_eq!(update.seq, 2);
        assert_eq!(frame["timestamp"], "t2");
        assert!(updates.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_next_fresh_reports_closed_channel() {
        let broadcaster = Broadcaster::default();
        let mut updates = broadcaster.subscribe();
        broadcaster.publish(1, &json!({ "entityId": "d1" }));
        drop(broadcaster);

        assert!(matches!(next_fresh(&mut updates, 1).await, Err(RecvError::Closed)));
    }
}
