//! Read-only access to the farm tables.
//!
//! - Blocking diesel queries; one `PgConnection` per operation, dropped on return.
//! - Raw text rows are normalized into `crate::models::farm` types here.
//! - Failures are reported as `FetchError`; deciding what an empty dashboard
//!   looks like is left to `crate::services::dashboard`.

use crate::db::models::{LogRow, StateRow, assets, parameters};
use crate::models::farm::{
    ActuatorState, LatestValue, Reading, ReadingValue, Snapshot, SystemStatus, parse_finite, series_key,
};
use crate::schema;
use crate::utils::DayWindow;
use chrono::{DateTime, Utc};
use diesel::PgConnection;
use diesel::dsl::max;
use diesel::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

#[derive(Debug)]
pub enum FetchError {
    /// The store could not be reached
    Connection(diesel::ConnectionError),
    /// The store was reached but a query failed
    Query(diesel::result::Error),
}

impl core::fmt::Display for FetchError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FetchError::Connection(e) => write!(f, "connection failed: {}", e),
            FetchError::Query(e) => write!(f, "query failed: {}", e),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Connection(e) => Some(e),
            FetchError::Query(e) => Some(e),
        }
    }
}

impl From<diesel::ConnectionError> for FetchError {
    fn from(value: diesel::ConnectionError) -> Self {
        FetchError::Connection(value)
    }
}

impl From<diesel::result::Error> for FetchError {
    fn from(value: diesel::result::Error) -> Self {
        FetchError::Query(value)
    }
}

/// Row counts and newest timestamps, used by the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreInfo {
    pub historical_count: i64,
    pub state_count: i64,
    pub latest_historical: Option<DateTime<Utc>>,
    pub latest_state: Option<DateTime<Utc>>,
}

pub trait FarmStore {
    /// Numeric sensor readings with `timestamp >= since`, newest first.
    fn historical(&self, since: DateTime<Utc>) -> Result<Vec<Reading>, FetchError>;

    /// Latest value per sensor key; non-numeric values are kept as text.
    fn latest(&self) -> Result<Snapshot, FetchError>;

    /// Pump and servo switch states from the snapshot table.
    fn system_status(&self) -> Result<BTreeMap<String, SystemStatus>, FetchError>;

    /// Raw `Stato` values logged for `asset` within `window`, oldest first.
    fn actuator_states(&self, asset: &str, window: &DayWindow) -> Result<Vec<String>, FetchError>;

    fn info(&self) -> Result<StoreInfo, FetchError>;
}

/// Drop non-numeric rows and non-sensor parameters; newest first.
pub fn normalize_historical(rows: Vec<LogRow>) -> Vec<Reading> {
    let mut readings: Vec<Reading> = rows
        .into_iter()
        .filter(|row| parameters::SENSORS.contains(&row.parameter.as_str()))
        .filter_map(|row| {
            let value = parse_finite(&row.value)?;
            Some(Reading {
                parameter: row.parameter,
                asset: row.asset,
                value,
                timestamp: row.time,
            })
        })
        .collect();
    readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    readings
}

/// Build the sensor snapshot; duplicate keys resolve to the newest row.
pub fn normalize_latest(rows: Vec<StateRow>) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for row in rows {
        if !parameters::SENSORS.contains(&row.parameter.as_str()) {
            continue;
        }
        let key = series_key(&row.parameter, &row.asset);
        let value = LatestValue {
            key: key.clone(),
            value: ReadingValue::parse(&row.value),
            timestamp: row.time,
        };
        keep_newest(&mut snapshot, key, value, |v| v.timestamp);
    }
    snapshot
}

pub fn normalize_status(rows: Vec<StateRow>) -> BTreeMap<String, SystemStatus> {
    let mut statuses = BTreeMap::new();
    for row in rows {
        if row.parameter != parameters::STATUS || !assets::ACTUATORS.contains(&row.asset.as_str()) {
            continue;
        }
        let key = series_key(&row.parameter, &row.asset);
        let status = SystemStatus {
            key: key.clone(),
            status: ActuatorState::from_raw(&row.value),
            value: row.value,
            timestamp: row.time,
        };
        keep_newest(&mut statuses, key, status, |s| s.timestamp);
    }
    statuses
}

// Ties on timestamp go to the later row.
fn keep_newest<T>(map: &mut BTreeMap<String, T>, key: String, value: T, time_of: impl Fn(&T) -> DateTime<Utc>) {
    match map.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
        Entry::Occupied(mut slot) => {
            if time_of(&value) >= time_of(slot.get()) {
                slot.insert(value);
            }
        }
    }
}

/// Postgres-backed store. Holds only the URL; connections are per call.
#[derive(Debug, Clone)]
pub struct PgFarmStore {
    database_url: String,
}

impl PgFarmStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        PgFarmStore {
            database_url: database_url.into(),
        }
    }

    fn connect(&self) -> Result<PgConnection, FetchError> {
        Ok(PgConnection::establish(&self.database_url)?)
    }
}

impl FarmStore for PgFarmStore {
    fn historical(&self, since: DateTime<Utc>) -> Result<Vec<Reading>, FetchError> {
        use schema::historical_log::dsl as L;

        let mut conn = self.connect()?;
        let rows: Vec<LogRow> = L::historical_log
            .filter(L::time.ge(since).and(L::parameter.eq_any(parameters::SENSORS.to_vec())))
            .order((L::time.desc(), L::id.desc()))
            .select(LogRow::as_select())
            .load(&mut conn)?;
        Ok(normalize_historical(rows))
    }

    fn latest(&self) -> Result<Snapshot, FetchError> {
        use schema::latest_state::dsl as S;

        let mut conn = self.connect()?;
        let rows: Vec<StateRow> = S::latest_state
            .filter(S::parameter.eq_any(parameters::SENSORS.to_vec()))
            .order(S::id.asc())
            .select(StateRow::as_select())
            .load(&mut conn)?;
        Ok(normalize_latest(rows))
    }

    fn system_status(&self) -> Result<BTreeMap<String, SystemStatus>, FetchError> {
        use schema::latest_state::dsl as S;

        let mut conn = self.connect()?;
        let rows: Vec<StateRow> = S::latest_state
            .filter(
                S::parameter
                    .eq(parameters::STATUS)
                    .and(S::asset.eq_any(assets::ACTUATORS.to_vec())),
            )
            .order(S::id.asc())
            .select(StateRow::as_select())
            .load(&mut conn)?;
        Ok(normalize_status(rows))
    }

    fn actuator_states(&self, asset: &str, window: &DayWindow) -> Result<Vec<String>, FetchError> {
        use schema::historical_log::dsl as L;

        let mut conn = self.connect()?;
        let values = L::historical_log
            .filter(
                L::parameter
                    .eq(parameters::STATUS)
                    .and(L::asset.eq(asset))
                    .and(L::time.ge(window.start))
                    .and(L::time.lt(window.end)),
            )
            .order((L::time.asc(), L::id.asc()))
            .select(L::value)
            .load::<String>(&mut conn)?;
        Ok(values)
    }

    fn info(&self) -> Result<StoreInfo, FetchError> {
        use schema::historical_log::dsl as L;
        use schema::latest_state::dsl as S;

        let mut conn = self.connect()?;
        let historical_count: i64 = L::historical_log.count().get_result(&mut conn)?;
        let state_count: i64 = S::latest_state.count().get_result(&mut conn)?;
        let latest_historical: Option<DateTime<Utc>> = L::historical_log.select(max(L::time)).get_result(&mut conn)?;
        let latest_state: Option<DateTime<Utc>> = S::latest_state.select(max(S::time)).get_result(&mut conn)?;
        Ok(StoreInfo {
            historical_count,
            state_count,
            latest_historical,
            latest_state,
        })
    }
}
