//! Typed farm records produced from raw table rows.
//!
//! Notes
//! - Everything here is read-derived and rebuilt on every request.
//! - Values in the tables are text; `ReadingValue` keeps the numeric/text
//!   distinction explicit instead of inspecting types at runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot key for a (parameter, asset) pair, e.g. `Humidity_Soil`.
pub fn series_key(parameter: &str, asset: &str) -> String {
    format!("{}_{}", parameter, asset)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Numeric(f64),
    Text(String),
}

impl ReadingValue {
    /// Numeric when the trimmed text is a finite float, text otherwise.
    pub fn parse(raw: &str) -> Self {
        match parse_finite(raw) {
            Some(v) => ReadingValue::Numeric(v),
            None => ReadingValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ReadingValue::Numeric(v) => Some(*v),
            ReadingValue::Text(_) => None,
        }
    }
}

/// Finite-float coercion shared by the drop (historical) and retain (latest) policies.
pub fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One numeric observation from the historical log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub parameter: String,
    pub asset: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestValue {
    pub key: String,
    pub value: ReadingValue,
    pub timestamp: DateTime<Utc>,
}

/// Latest value per `parameter_asset` key.
pub type Snapshot = BTreeMap<String, LatestValue>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorState {
    Active,
    Inactive,
}

impl ActuatorState {
    /// Only the exact literal `ON` counts as active.
    pub fn from_raw(value: &str) -> Self {
        if value == crate::db::models::switch_state::ON {
            ActuatorState::Active
        } else {
            ActuatorState::Inactive
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub key: String,
    pub value: String,
    pub timestamp: DateTime<Utc>,
    pub status: ActuatorState,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoStatistics {
    pub aperture_count: u64,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpStatistics {
    pub ml_total: u64,
    pub liters_total: u64,
    pub ml_remainder: u64,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatistics {
    pub servo: ServoStatistics,
    pub pump: PumpStatistics,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Thresholds {
    pub critical: Option<f64>,
    pub low: Option<f64>,
    pub high: Option<f64>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct KpiDefinition {
    pub key: &'static str,
    pub title: &'static str,
    pub unit: &'static str,
    pub thresholds: Thresholds,
    pub icon: &'static str,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiStatus {
    Critical,
    Low,
    High,
    Good,
}

/// KPI value as shown on a tile: whole numbers stay integers.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Integer(i64),
    Decimal(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub title: String,
    pub value: DisplayValue,
    pub unit: String,
    pub status: KpiStatus,
    pub icon: String,
}
