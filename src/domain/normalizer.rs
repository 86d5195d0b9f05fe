// Message normalizer - canonical telemetry records from heterogeneous payloads
use super::telemetry::TelemetryRecord;
use serde_json::Value;

type FieldPath = &'static [&'static str];

/// Candidate locations per field, highest precedence first. A candidate is
/// chosen as soon as its key exists, even when the value is `null`.
const ENTITY_ID_PATHS: &[FieldPath] = &[
    &["IotData", "droneId"],
    &["droneId"],
    &["deviceId"],
    &["DeviceId"],
];

const TIMESTAMP_PATHS: &[FieldPath] = &[
    &["IotData", "timestamp"],
    &["timestamp"],
    &["MessageDate"],
    &["EnqueuedTimeUtc"],
    &["enqueuedTimeUtc"],
];

const SPEED_PATHS: &[FieldPath] = &[
    &["velocity", "speed_mps"],
    &["IotData", "velocity", "speed_mps"],
    &["IotData", "speed_mps"],
    &["IotData", "speed"],
    &["speed_mps"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingEntityId,
    MissingTimestamp,
    InvalidSpeed,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MissingEntityId => "missing entity id",
            Rejection::MissingTimestamp => "missing timestamp",
            Rejection::InvalidSpeed => "missing or non-numeric speed",
        }
    }
}

/// Normalize a raw payload, or `None` when any canonical field is missing.
pub fn normalize(raw: &Value) -> Option<TelemetryRecord> {
    match extract(raw) {
        Ok(record) => Some(record),
        Err(rejection) => {
            tracing::debug!(
                reason = rejection.as_str(),
                payload = %raw,
                "Ignoring telemetry message"
            );
            None
        }
    }
}

pub fn extract(raw: &Value) -> Result<TelemetryRecord, Rejection> {
    let entity_id = first_present(raw, ENTITY_ID_PATHS)
        .and_then(label_value)
        .ok_or(Rejection::MissingEntityId)?;
    let timestamp = first_present(raw, TIMESTAMP_PATHS)
        .and_then(label_value)
        .ok_or(Rejection::MissingTimestamp)?;
    let speed = first_present(raw, SPEED_PATHS)
        .and_then(speed_value)
        .ok_or(Rejection::InvalidSpeed)?;

    Ok(TelemetryRecord::new(entity_id, timestamp, speed))
}

/// Whether any entity id candidate key exists in the payload.
pub fn has_entity_candidate(raw: &Value) -> bool {
    first_present(raw, ENTITY_ID_PATHS).is_some()
}

fn first_present<'a>(raw: &'a Value, paths: &[FieldPath]) -> Option<&'a Value> {
    paths.iter().find_map(|path| lookup(raw, path))
}

fn lookup<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(raw, |node, key| node.as_object()?.get(*key))
}

fn label_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

// Stricter than a loose numeric cast: blank strings and booleans are rejected, not read as 0 or 1
fn speed_value(value: &Value) -> Option<f64> {
    let speed = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };

    speed.is_finite().then_some(speed)
}
