//! Diesel row structs for the two farm tables.
//!
//! These mirror the SQL columns one to one; values stay as raw text here and
//! are only coerced when converted into `crate::models::farm` types.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::schema;

// Vocabulary written to `parameter` / `asset` / `value` columns.
pub mod parameters {
    pub const HUMIDITY: &str = "Humidity";
    pub const TEMPERATURE: &str = "Temperature";
    pub const SILO: &str = "Silo";
    pub const TANK: &str = "Tank";
    pub const STATUS: &str = "Stato";

    /// Parameters carrying numeric sensor readings.
    pub const SENSORS: [&str; 4] = [HUMIDITY, TEMPERATURE, SILO, TANK];
}

pub mod assets {
    pub const SOIL: &str = "Soil";
    pub const AIR: &str = "Air";
    pub const FEED: &str = "Feed";
    pub const WATER: &str = "Water";
    pub const PUMP: &str = "Pump";
    pub const SERVO: &str = "Servo";

    /// Assets whose `Stato` rows are ON/OFF actuator states.
    pub const ACTUATORS: [&str; 2] = [PUMP, SERVO];
}

pub mod switch_state {
    pub const ON: &str = "ON";
    pub const OFF: &str = "OFF";
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = schema::historical_log)]
pub struct LogRow {
    pub id: i64,
    pub time: DateTime<Utc>,
    pub parameter: String,
    pub asset: String,
    pub value: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::historical_log)]
pub struct NewLogRow {
    pub time: DateTime<Utc>,
    pub parameter: String,
    pub asset: String,
    pub value: String,
}

impl NewLogRow {
    pub fn new(time: DateTime<Utc>, parameter: &str, asset: &str, value: impl Into<String>) -> Self {
        Self {
            time,
            parameter: parameter.to_string(),
            asset: asset.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = schema::latest_state)]
pub struct StateRow {
    pub id: i64,
    pub time: DateTime<Utc>,
    pub parameter: String,
    pub asset: String,
    pub value: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::latest_state)]
pub struct NewStateRow {
    pub time: DateTime<Utc>,
    pub parameter: String,
    pub asset: String,
    pub value: String,
}

impl From<&NewLogRow> for NewStateRow {
    fn from(row: &NewLogRow) -> Self {
        Self {
            time: row.time,
            parameter: row.parameter.clone(),
            asset: row.asset.clone(),
            value: row.value.clone(),
        }
    }
}
