// Telemetry data domain models
use serde::{Serialize, Serializer};
use std::fmt;

/// Canonical `(entity, timestamp, speed)` triple produced by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub entity_id: String,
    pub timestamp: String,
    pub speed: f64,
}

impl TelemetryRecord {
    pub fn new(entity_id: String, timestamp: String, speed: f64) -> Self {
        Self {
            entity_id,
            timestamp,
            speed,
        }
    }

    pub fn to_relay_frame(&self, seq: u64) -> RelayFrame {
        RelayFrame {
            seq,
            entity_id: self.entity_id.clone(),
            timestamp: self.timestamp.clone(),
            speed: self.speed,
            velocity: Velocity {
                speed_mps: self.speed,
            },
        }
    }
}

/// Record frame pushed to every connected viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayFrame {
    pub seq: u64,
    pub entity_id: String,
    pub timestamp: String,
    pub speed: f64,
    pub velocity: Velocity,
}

#[derive(Debug, Clone, Serialize)]
pub struct Velocity {
    pub speed_mps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: String,
    pub y: f64,
}

impl SeriesPoint {
    pub fn new(x: String, y: f64) -> Self {
        Self { x, y }
    }
}

/// One chart-ready series per tracked entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub label: String,
    pub border_color: Rgba,
    pub background_color: Rgba,
    pub data: Vec<SeriesPoint>,
}

impl Series {
    pub fn new(label: String, color: Rgba, data: Vec<SeriesPoint>) -> Self {
        Self {
            label,
            border_color: color,
            background_color: color.with_alpha(0.2),
            data,
        }
    }
}
