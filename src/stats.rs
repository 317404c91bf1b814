//! Daily actuator statistics derived from the historical log.

use crate::db::models::{assets, switch_state};
use crate::models::farm::{PumpStatistics, ServoStatistics, SystemStatistics};
use crate::store::FarmStore;
use crate::utils::DayWindow;
use log::warn;

/// Volume attributed to each `ON` pump row. An approximation: sampling
/// interval and run time are not taken into account.
pub const PUMP_ML_PER_RECORD: u64 = 100;

/// Count OFF -> ON transitions between adjacent states (oldest first).
pub fn count_openings<'a>(states: impl IntoIterator<Item = &'a str>) -> u64 {
    let mut previous: Option<&str> = None;
    let mut openings = 0;
    for state in states {
        if state == switch_state::ON && previous == Some(switch_state::OFF) {
            openings += 1;
        }
        previous = Some(state);
    }
    openings
}

pub fn pump_usage(on_records: u64) -> PumpStatistics {
    let ml_total = on_records * PUMP_ML_PER_RECORD;
    PumpStatistics {
        ml_total,
        liters_total: ml_total / 1000,
        ml_remainder: ml_total % 1000,
    }
}

/// Servo and pump figures for `window`. Each half falls back to zero on its
/// own when its query fails.
pub fn today_statistics(store: &dyn FarmStore, window: &DayWindow) -> SystemStatistics {
    let servo = match store.actuator_states(assets::SERVO, window) {
        Ok(states) => ServoStatistics {
            aperture_count: count_openings(states.iter().map(String::as_str)),
        },
        Err(e) => {
            warn!("Stats: servo query failed, reporting 0 openings: {}", e);
            ServoStatistics::default()
        }
    };

    let pump = match store.actuator_states(assets::PUMP, window) {
        Ok(states) => pump_usage(states.iter().filter(|s| *s == switch_state::ON).count() as u64),
        Err(e) => {
            warn!("Stats: pump query failed, reporting 0 ml: {}", e);
            PumpStatistics::default()
        }
    };

    SystemStatistics { servo, pump }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::utils::day_window;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn counts_off_to_on_transitions_only() {
        assert_eq!(count_openings(["OFF", "ON", "ON", "OFF", "ON"]), 2);
    }

    #[test]
    fn leading_on_is_not_counted() {
        assert_eq!(count_openings(["ON", "OFF", "ON"]), 1);
        assert_eq!(count_openings(["ON"]), 0);
        assert_eq!(count_openings(Vec::<&str>::new()), 0);
    }

    #[test]
    fn unknown_states_break_transitions() {
        assert_eq!(count_openings(["OFF", "off", "ON"]), 0);
        assert_eq!(count_openings(["OFF", "On", "OFF", "ON"]), 1);
    }

    #[test]
    fn pump_usage_splits_liters_and_remainder() {
        assert_eq!(
            pump_usage(37),
            PumpStatistics {
                ml_total: 3700,
                liters_total: 3,
                ml_remainder: 700,
            }
        );
        assert_eq!(pump_usage(0), PumpStatistics::default());
        assert_eq!(pump_usage(10).ml_remainder, 0);
    }

    #[test]
    fn statistics_use_only_todays_rows_in_time_order() {
        let store = MemoryStore::new()
            .with_log(at(1, 23), "Stato", "Servo", "OFF")
            .with_log(at(2, 9), "Stato", "Servo", "ON")
            .with_log(at(2, 8), "Stato", "Servo", "OFF")
            .with_log(at(2, 10), "Stato", "Servo", "OFF")
            .with_log(at(2, 11), "Stato", "Servo", "ON")
            .with_log(at(1, 22), "Stato", "Pump", "ON")
            .with_log(at(2, 8), "Stato", "Pump", "ON")
            .with_log(at(2, 9), "Stato", "Pump", "ON")
            .with_log(at(2, 10), "Stato", "Pump", "OFF");

        let stats = today_statistics(&store, &day_window(&at(2, 12)));
        assert_eq!(stats.servo.aperture_count, 2);
        assert_eq!(stats.pump.ml_total, 200);
    }

    #[test]
    fn failing_servo_query_does_not_hide_pump_usage() {
        let store = MemoryStore::new()
            .with_log(at(2, 8), "Stato", "Pump", "ON")
            .with_log(at(2, 8), "Stato", "Servo", "OFF")
            .with_log(at(2, 9), "Stato", "Servo", "ON")
            .failing_asset("Servo");

        let stats = today_statistics(&store, &day_window(&at(2, 12)));
        assert_eq!(stats.servo.aperture_count, 0);
        assert_eq!(stats.pump.ml_total, 100);
    }

    #[test]
    fn failing_pump_query_does_not_hide_servo_openings() {
        let store = MemoryStore::new()
            .with_log(at(2, 8), "Stato", "Pump", "ON")
            .with_log(at(2, 8), "Stato", "Servo", "OFF")
            .with_log(at(2, 9), "Stato", "Servo", "ON")
            .failing_asset("Pump");

        let stats = today_statistics(&store, &day_window(&at(2, 12)));
        assert_eq!(stats.servo.aperture_count, 1);
        assert_eq!(stats.pump, PumpStatistics::default());
    }

    #[test]
    fn unreachable_store_yields_zeroes() {
        let stats = today_statistics(&MemoryStore::offline(), &day_window(&at(2, 12)));
        assert_eq!(stats, SystemStatistics::default());
    }
}
