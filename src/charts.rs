//! Chart descriptions for the dashboard client.
//!
//! Only selection and ordering of series happens here; drawing is up to the
//! browser. Input is the historical series as returned by the store (newest
//! first); every emitted series is oldest first.

use crate::db::models::{assets, parameters};
use crate::models::farm::Reading;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const NO_DATA: &str = "No data available";

// Palette shared with the client stylesheet
pub mod palette {
    pub const SOIL: &str = "#a5682a";
    pub const AIR_HUMIDITY: &str = "#6a82fb";
    pub const FEED: &str = "#ff9f43";
    pub const WATER: &str = "#fc5c7d";
    pub const TEMPERATURE: &str = "#ff6347";
    pub const COMFORT_ZONE: &str = "rgba(40, 167, 69, 0.1)";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub time: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: &'static str,
    pub color: &'static str,
    pub filled: bool,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub title: &'static str,
    /// `None` leaves the panel blank.
    pub series: Option<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Band {
    pub from: f64,
    pub to: f64,
    pub label: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plot {
    pub title: &'static str,
    pub height: u32,
    pub panels: Vec<Panel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_range: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<Band>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chart {
    Plot(Plot),
    Empty { message: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub humidity: Chart,
    pub resources: Chart,
    pub temperature: Chart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartsPayload {
    Charts(ChartSet),
    NoData { error: &'static str },
}

/// Shape the three dashboard charts, or signal that there is nothing to draw.
pub fn charts_payload(readings: &[Reading]) -> ChartsPayload {
    if readings.is_empty() {
        return ChartsPayload::NoData { error: NO_DATA };
    }
    ChartsPayload::Charts(ChartSet {
        humidity: humidity_chart(readings),
        resources: resources_chart(readings),
        temperature: temperature_chart(readings),
    })
}

pub fn humidity_chart(readings: &[Reading]) -> Chart {
    if !readings.iter().any(|r| r.parameter == parameters::HUMIDITY) {
        return Chart::Empty {
            message: "No humidity data available",
        };
    }
    Chart::Plot(Plot {
        title: "Humidity",
        height: 500,
        panels: vec![
            Panel {
                title: "Soil Humidity (%)",
                series: series(readings, parameters::HUMIDITY, assets::SOIL, "Soil", palette::SOIL, false),
            },
            Panel {
                title: "Air Humidity (%)",
                series: series(
                    readings,
                    parameters::HUMIDITY,
                    assets::AIR,
                    "Air",
                    palette::AIR_HUMIDITY,
                    false,
                ),
            },
        ],
        y_range: None,
        band: None,
    })
}

/// Feed and water levels; drawn even when both panels are blank.
pub fn resources_chart(readings: &[Reading]) -> Chart {
    Chart::Plot(Plot {
        title: "Resources",
        height: 400,
        panels: vec![
            Panel {
                title: "Feed Level (%)",
                series: series(readings, parameters::SILO, assets::FEED, "Feed", palette::FEED, true),
            },
            Panel {
                title: "Water Level (%)",
                series: series(readings, parameters::TANK, assets::WATER, "Water", palette::WATER, true),
            },
        ],
        y_range: Some([0.0, 101.0]),
        band: None,
    })
}

pub fn temperature_chart(readings: &[Reading]) -> Chart {
    let Some(air) = series(
        readings,
        parameters::TEMPERATURE,
        assets::AIR,
        "Temperature",
        palette::TEMPERATURE,
        false,
    ) else {
        return Chart::Empty {
            message: "No temperature data available",
        };
    };
    Chart::Plot(Plot {
        title: "Air Temperature (°C)",
        height: 400,
        panels: vec![Panel {
            title: "Temperature (°C)",
            series: Some(air),
        }],
        y_range: None,
        band: Some(Band {
            from: 25.0,
            to: 30.0,
            label: "Comfort Zone",
            color: palette::COMFORT_ZONE,
        }),
    })
}

fn series(
    readings: &[Reading],
    parameter: &str,
    asset: &str,
    name: &'static str,
    color: &'static str,
    filled: bool,
) -> Option<Series> {
    let mut points: Vec<Point> = readings
        .iter()
        .filter(|r| r.parameter == parameter && r.asset == asset)
        .map(|r| Point {
            time: r.timestamp,
            value: r.value,
        })
        .collect();
    if points.is_empty() {
        return None;
    }
    points.sort_by_key(|p| p.time);
    Some(Series {
        name,
        color,
        filled,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(parameter: &str, asset: &str, hour: u32, value: f64) -> Reading {
        Reading {
            parameter: parameter.into(),
            asset: asset.into(),
            value,
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
        }
    }

    fn plot(chart: &Chart) -> &Plot {
        match chart {
            Chart::Plot(p) => p,
            Chart::Empty { message } => panic!("expected plot, got empty chart: {}", message),
        }
    }

    #[test]
    fn empty_input_signals_no_data() {
        let payload = charts_payload(&[]);
        assert_eq!(payload, ChartsPayload::NoData { error: NO_DATA });
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({ "error": "No data available" })
        );
    }

    #[test]
    fn series_are_sorted_oldest_first() {
        let readings = vec![
            reading("Humidity", "Soil", 9, 33.0),
            reading("Humidity", "Soil", 7, 31.0),
            reading("Humidity", "Soil", 8, 32.0),
        ];
        let humidity = humidity_chart(&readings);
        let soil = plot(&humidity).panels[0].series.as_ref().unwrap();
        let values: Vec<f64> = soil.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![31.0, 32.0, 33.0]);
        assert!(plot(&humidity).panels[1].series.is_none());
    }

    #[test]
    fn missing_parameters_yield_empty_charts() {
        let readings = vec![reading("Silo", "Feed", 8, 60.0)];
        let ChartsPayload::Charts(set) = charts_payload(&readings) else {
            panic!("expected charts");
        };
        assert!(matches!(set.humidity, Chart::Empty { .. }));
        assert!(matches!(set.temperature, Chart::Empty { .. }));
        let resources = plot(&set.resources);
        assert!(resources.panels[0].series.as_ref().unwrap().filled);
        assert!(resources.panels[1].series.is_none());
        assert_eq!(resources.y_range, Some([0.0, 101.0]));
    }

    #[test]
    fn temperature_chart_only_uses_air_readings() {
        let readings = vec![
            reading("Temperature", "Air", 8, 24.0),
            reading("Temperature", "Soil", 8, 16.0),
        ];
        let chart = temperature_chart(&readings);
        let p = plot(&chart);
        assert_eq!(p.panels[0].series.as_ref().unwrap().points.len(), 1);
        assert_eq!(p.band.as_ref().map(|b| (b.from, b.to)), Some((25.0, 30.0)));
    }

    #[test]
    fn chart_kind_is_tagged() {
        let json = serde_json::to_value(temperature_chart(&[])).unwrap();
        assert_eq!(json["kind"], "empty");
        assert_eq!(json["message"], "No temperature data available");
    }
}
