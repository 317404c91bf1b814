//! Per-request dashboard payloads.
//!
//! Store failures stop here: they are logged and replaced with empty
//! collections or zero statistics so the client renders an empty dashboard.
//! Only `health` reports reachability.

use crate::charts::{self, ChartsPayload};
use crate::kpi::{self, KPI_DEFINITIONS};
use crate::models::farm::{Kpi, Reading, Snapshot, SystemStatistics, SystemStatus};
use crate::stats;
use crate::store::{FarmStore, StoreInfo};
use crate::utils::{day_window, hours_back};
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, error};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemsPayload {
    pub status: BTreeMap<String, SystemStatus>,
    pub statistics: SystemStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestDataPayload {
    pub sensors: Snapshot,
    pub systems: SystemsPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub reachable: bool,
    #[serde(flatten)]
    pub info: Option<StoreInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn historical_or_empty(store: &dyn FarmStore, since: DateTime<Utc>) -> Vec<Reading> {
    store.historical(since).unwrap_or_else(|e| {
        error!("Dashboard: historical fetch since {} failed: {}", since, e);
        Vec::new()
    })
}

pub fn latest_or_empty(store: &dyn FarmStore) -> Snapshot {
    store.latest().unwrap_or_else(|e| {
        error!("Dashboard: latest snapshot fetch failed: {}", e);
        Snapshot::new()
    })
}

pub fn status_or_empty(store: &dyn FarmStore) -> BTreeMap<String, SystemStatus> {
    store.system_status().unwrap_or_else(|e| {
        error!("Dashboard: system status fetch failed: {}", e);
        BTreeMap::new()
    })
}

pub fn charts(store: &dyn FarmStore, now: DateTime<Utc>, window_hours: u32) -> ChartsPayload {
    let readings = historical_or_empty(store, hours_back(now, window_hours));
    debug!("Dashboard: shaping charts from {} reading(s)", readings.len());
    charts::charts_payload(&readings)
}

pub fn kpis(store: &dyn FarmStore) -> Vec<Kpi> {
    kpi::classify(&latest_or_empty(store), &KPI_DEFINITIONS)
}

/// `now` decides which calendar day the statistics cover.
pub fn systems<Tz: TimeZone>(store: &dyn FarmStore, now: &DateTime<Tz>) -> SystemsPayload {
    SystemsPayload {
        status: status_or_empty(store),
        statistics: stats::today_statistics(store, &day_window(now)),
    }
}

pub fn latest_data<Tz: TimeZone>(store: &dyn FarmStore, now: &DateTime<Tz>) -> LatestDataPayload {
    LatestDataPayload {
        sensors: latest_or_empty(store),
        systems: systems(store, now),
    }
}

pub fn health(store: &dyn FarmStore) -> Health {
    match store.info() {
        Ok(info) => Health {
            reachable: true,
            info: Some(info),
            error: None,
        },
        Err(e) => {
            error!("Dashboard: store health check failed: {}", e);
            Health {
                reachable: false,
                info: None,
                error: Some(e.to_string()),
            }
        }
    }
}
