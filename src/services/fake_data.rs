use crate::db::models::{NewLogRow, NewStateRow, assets, parameters, switch_state};
use crate::services::ingest::{insert_log_rows, replace_state};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use diesel::PgConnection;
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::f64::consts::PI;

const STEP_MINUTES: i64 = 15;
const FEEDING_HOURS: [u32; 3] = [7, 12, 18];
const SOIL_PUMP_ON_BELOW: f64 = 35.0;
const SOIL_PUMP_OFF_ABOVE: f64 = 60.0;
const REFILL_BELOW: f64 = 15.0;
const REFILL_TO: f64 = 95.0;

pub fn run(conn: &mut PgConnection, days: u32) -> Result<(), String> {
    let now = Utc::now();
    let start = align_to_step(now - Duration::days(i64::from(days)));
    let end = align_to_step(now);
    if start >= end {
        return Err("Fake data generator requires start earlier than end".to_string());
    }

    let mut rng = SmallRng::seed_from_u64(0x0FA2_5EED_CAFE_F00Du64);
    let mut farm = FarmSim::new();

    info!("Fake data: generating synthetic farm history from {} to {}", start, end);

    let mut batch: Vec<NewLogRow> = Vec::with_capacity(samples_per_day() * FarmSim::ROWS_PER_STEP);
    let mut latest: BTreeMap<(String, String), NewStateRow> = BTreeMap::new();
    let mut inserted: usize = 0;
    let mut ts = start;
    let mut current_day = start.date_naive();
    let step = Duration::minutes(STEP_MINUTES);

    while ts < end {
        if ts.date_naive() != current_day {
            inserted += flush(conn, &mut batch)?;
            info!("Fake data: {} written ({} row(s) so far)", current_day, inserted);
            current_day = ts.date_naive();
        }

        for row in farm.step(ts, &mut rng) {
            latest.insert((row.parameter.clone(), row.asset.clone()), NewStateRow::from(&row));
            batch.push(row);
        }

        ts += step;
    }
    inserted += flush(conn, &mut batch)?;

    let state_rows: Vec<NewStateRow> = latest.into_values().collect();
    let replaced = replace_state(conn, &state_rows)?;
    info!(
        "Fake data: complete (days={}, log_inserts={}, state_rows={})",
        days, inserted, replaced
    );

    Ok(())
}

fn flush(conn: &mut PgConnection, batch: &mut Vec<NewLogRow>) -> Result<usize, String> {
    let inserted = insert_log_rows(conn, batch)?;
    batch.clear();
    Ok(inserted)
}

/// Tiny farm model: soil dries out and is irrigated by the pump, feed and
/// water drain and get refilled, the servo opens the feeder at fixed hours.
#[derive(Debug, Clone)]
struct FarmSim {
    soil_humidity: f64,
    feed_level: f64,
    water_level: f64,
    pump_on: bool,
}

impl FarmSim {
    const ROWS_PER_STEP: usize = 7;

    fn new() -> Self {
        FarmSim {
            soil_humidity: 45.0,
            feed_level: 80.0,
            water_level: 85.0,
            pump_on: false,
        }
    }

    fn step(&mut self, ts: DateTime<Utc>, rng: &mut SmallRng) -> Vec<NewLogRow> {
        let day_fraction = ts.time().num_seconds_from_midnight() as f64 / 86_400.0;
        let annual_fraction = ts.ordinal0() as f64 / 365.0;

        let temperature = compute_temperature(day_fraction, annual_fraction, rng);
        let air_humidity = compute_air_humidity(temperature, rng);

        // Pump with hysteresis on soil humidity; needs water in the tank.
        if self.soil_humidity < SOIL_PUMP_ON_BELOW && self.water_level > 5.0 {
            self.pump_on = true;
        } else if self.soil_humidity > SOIL_PUMP_OFF_ABOVE || self.water_level <= 5.0 {
            self.pump_on = false;
        }

        let evaporation = 0.25 + (temperature - 15.0).max(0.0) * 0.03;
        self.soil_humidity -= evaporation + rng.random_range(-0.1..=0.1);
        if self.pump_on {
            self.soil_humidity += rng.random_range(2.0..=3.0);
            self.water_level -= rng.random_range(0.6..=1.0);
        }
        self.soil_humidity = self.soil_humidity.clamp(5.0, 90.0);

        let feeding = FEEDING_HOURS.contains(&ts.hour()) && ts.minute() < 2 * STEP_MINUTES as u32;
        if feeding {
            self.feed_level -= rng.random_range(1.5..=3.0);
        }
        self.feed_level -= rng.random_range(0.0..=0.05);

        // Morning refills
        if ts.hour() == 6 && ts.minute() == 0 {
            if self.feed_level < REFILL_BELOW {
                self.feed_level = REFILL_TO;
            }
            if self.water_level < REFILL_BELOW {
                self.water_level = REFILL_TO;
            }
        }
        self.feed_level = self.feed_level.clamp(0.0, 100.0);
        self.water_level = self.water_level.clamp(0.0, 100.0);

        // The soil probe drops out now and then and reports OFF instead of a value.
        let soil_value = if rng.random_bool(0.01) {
            switch_state::OFF.to_string()
        } else {
            format!("{:.1}", self.soil_humidity)
        };

        vec![
            NewLogRow::new(ts, parameters::HUMIDITY, assets::SOIL, soil_value),
            NewLogRow::new(ts, parameters::HUMIDITY, assets::AIR, format!("{:.1}", air_humidity)),
            NewLogRow::new(ts, parameters::TEMPERATURE, assets::AIR, format!("{:.1}", temperature)),
            NewLogRow::new(ts, parameters::SILO, assets::FEED, format!("{:.1}", self.feed_level)),
            NewLogRow::new(ts, parameters::TANK, assets::WATER, format!("{:.1}", self.water_level)),
            NewLogRow::new(ts, parameters::STATUS, assets::PUMP, switch(self.pump_on)),
            NewLogRow::new(ts, parameters::STATUS, assets::SERVO, switch(feeding)),
        ]
    }
}

fn switch(on: bool) -> &'static str {
    if on { switch_state::ON } else { switch_state::OFF }
}

fn align_to_step(ts: DateTime<Utc>) -> DateTime<Utc> {
    let step_seconds = STEP_MINUTES * 60;
    let aligned = ts.timestamp().div_euclid(step_seconds) * step_seconds;
    DateTime::<Utc>::from_timestamp(aligned, 0).unwrap_or(ts)
}

fn samples_per_day() -> usize {
    (24 * 60 / STEP_MINUTES) as usize
}

fn compute_temperature(day_fraction: f64, annual_fraction: f64, rng: &mut SmallRng) -> f64 {
    let seasonal = ((annual_fraction - 0.3) * 2.0 * PI).sin() * 9.0;
    let diurnal = ((day_fraction - 0.375) * 2.0 * PI).sin() * 5.0;
    let random_variation = rng.random_range(-1.2..=1.2);
    (21.0 + seasonal + diurnal + random_variation).clamp(-5.0, 42.0)
}

fn compute_air_humidity(temperature: f64, rng: &mut SmallRng) -> f64 {
    let temperature_component = (22.0 - temperature) * 1.6;
    let random = rng.random_range(-4.0..=4.0);
    (60.0 + temperature_component + random).clamp(20.0, 98.0)
}
