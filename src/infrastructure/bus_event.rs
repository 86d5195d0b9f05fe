// Bus event decoding - batches, envelopes and gap-filling from event metadata
use crate::application::telemetry_source::SourceError;
use crate::domain::normalizer::has_entity_candidate;
use chrono::{DateTime, SecondsFormat};
use serde_json::{Map, Value};

const DEVICE_ID_PROPERTY: &str = "iothub-connection-device-id";
const ENVELOPE_KEYS: [&str; 3] = ["enqueuedTimeUtc", "systemProperties", "properties"];

/// Decode one bus payload into messages. A JSON array is a batch and is
/// decoded as a unit.
pub fn decode_payload(bytes: &[u8]) -> Result<Vec<Value>, SourceError> {
    let value: Value = serde_json::from_slice(bytes)?;
    match value {
        Value::Array(items) => items.into_iter().map(unwrap_envelope).collect(),
        other => Ok(vec![unwrap_envelope(other)?]),
    }
}

/// Strip an event envelope (`body` plus bus metadata) down to its message.
///
/// Metadata only fills gaps: the device id is used when the body carries no
/// entity id candidate, the enqueued time when the body has none of its own.
/// Bare messages pass through untouched.
pub fn unwrap_envelope(value: Value) -> Result<Value, SourceError> {
    let Value::Object(mut envelope) = value else {
        return Ok(value);
    };
    if !is_envelope(&envelope) {
        return Ok(Value::Object(envelope));
    }

    let mut body = match envelope.remove("body") {
        Some(Value::String(text)) => serde_json::from_str(&text)?,
        Some(body) => body,
        None => Value::Null,
    };
    enrich(&mut body, &envelope);

    Ok(body)
}

fn is_envelope(fields: &Map<String, Value>) -> bool {
    fields.contains_key("body") && ENVELOPE_KEYS.iter().any(|key| fields.contains_key(*key))
}

fn enrich(body: &mut Value, envelope: &Map<String, Value>) {
    let device_id = if has_entity_candidate(body) {
        None
    } else {
        envelope
            .get("systemProperties")
            .and_then(|props| props.get(DEVICE_ID_PROPERTY))
            .cloned()
    };

    let has_enqueued =
        body.get("enqueuedTimeUtc").is_some() || body.get("EnqueuedTimeUtc").is_some();
    let enqueued = if has_enqueued {
        None
    } else {
        envelope.get("enqueuedTimeUtc").and_then(enqueued_time)
    };

    let Some(fields) = body.as_object_mut() else {
        return;
    };
    if let Some(device_id) = device_id {
        fields.insert("deviceId".to_string(), device_id);
    }
    if let Some(enqueued) = enqueued {
        fields.insert("enqueuedTimeUtc".to_string(), Value::String(enqueued));
    }
}

fn enqueued_time(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        _ => None,
    }
}
