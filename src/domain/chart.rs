// Chart presentation model shared with the renderer
use super::telemetry::{Rgba, Series};
use serde::Serialize;

pub const PALETTE: [Rgba; 5] = [
    Rgba::new(230, 25, 75, 1.0),
    Rgba::new(60, 180, 75, 1.0),
    Rgba::new(0, 130, 200, 1.0),
    Rgba::new(245, 130, 48, 1.0),
    Rgba::new(145, 30, 180, 1.0),
];

pub fn palette_color(slot: usize) -> Rgba {
    PALETTE[slot % PALETTE.len()]
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub animation: bool,
    pub y_axis: YAxis,
    pub x_axis: XAxis,
    pub tooltip: Tooltip,
}

#[derive(Debug, Clone, Serialize)]
pub struct YAxis {
    pub id: String,
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct XAxis {
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tooltip {
    pub mode: String,
    pub intersect: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            animation: false,
            y_axis: YAxis {
                id: "Speed".to_string(),
                label: "Speed (m/s)".to_string(),
                min: 0.0,
                max: 300.0,
                step: 20.0,
            },
            x_axis: XAxis {
                label: "Timestamp (UTC)".to_string(),
            },
            tooltip: Tooltip {
                mode: "nearest".to_string(),
                intersect: false,
            },
        }
    }
}

/// Everything a renderer needs to draw the live chart.
#[derive(Debug, Serialize)]
pub struct ChartView<'a> {
    pub options: &'a ChartOptions,
    pub series: &'a [Series],
}
