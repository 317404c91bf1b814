//! KPI tiles: the fixed definition table and threshold classification.

use crate::models::farm::{DisplayValue, Kpi, KpiDefinition, KpiStatus, Snapshot, Thresholds};

/// Tile definitions in display order.
pub const KPI_DEFINITIONS: [KpiDefinition; 5] = [
    KpiDefinition {
        key: "Humidity_Soil",
        title: "Humidity Soil",
        unit: "%",
        thresholds: Thresholds {
            critical: Some(10.0),
            low: Some(30.0),
            high: Some(80.0),
        },
        icon: "💧",
    },
    KpiDefinition {
        key: "Humidity_Air",
        title: "Humidity Air",
        unit: "%",
        thresholds: Thresholds {
            critical: None,
            low: Some(50.0),
            high: Some(70.0),
        },
        icon: "🌫️",
    },
    KpiDefinition {
        key: "Silo_Feed",
        title: "Feed Level",
        unit: "%",
        thresholds: Thresholds {
            critical: Some(20.0),
            low: Some(40.0),
            high: None,
        },
        icon: "🌾",
    },
    KpiDefinition {
        key: "Tank_Water",
        title: "Water Level",
        unit: "%",
        thresholds: Thresholds {
            critical: Some(20.0),
            low: Some(40.0),
            high: None,
        },
        icon: "💧",
    },
    KpiDefinition {
        key: "Temperature_Air",
        title: "Temperature",
        unit: "°C",
        thresholds: Thresholds {
            critical: None,
            low: Some(20.0),
            high: Some(30.0),
        },
        icon: "🌡️",
    },
];

/// First match wins: critical (inclusive), then low and high (exclusive).
pub fn determine_status(value: f64, thresholds: &Thresholds) -> KpiStatus {
    if thresholds.critical.is_some_and(|critical| value <= critical) {
        KpiStatus::Critical
    } else if thresholds.low.is_some_and(|low| value < low) {
        KpiStatus::Low
    } else if thresholds.high.is_some_and(|high| value > high) {
        KpiStatus::High
    } else {
        KpiStatus::Good
    }
}

pub fn display_value(value: f64) -> DisplayValue {
    if value == value.trunc() && value.abs() < i64::MAX as f64 {
        DisplayValue::Integer(value as i64)
    } else {
        DisplayValue::Decimal((value * 10.0).round() / 10.0)
    }
}

/// One tile per definition whose key holds a numeric snapshot value.
pub fn classify(snapshot: &Snapshot, definitions: &[KpiDefinition]) -> Vec<Kpi> {
    definitions
        .iter()
        .filter_map(|def| {
            let value = snapshot.get(def.key)?.value.as_f64()?;
            Some(Kpi {
                title: def.title.to_string(),
                value: display_value(value),
                unit: def.unit.to_string(),
                status: determine_status(value, &def.thresholds),
                icon: def.icon.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::farm::{LatestValue, ReadingValue};
    use chrono::{TimeZone, Utc};

    fn snapshot(entries: &[(&str, ReadingValue)]) -> Snapshot {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        entries
            .iter()
            .map(|(key, value)| {
                (
                    key.to_string(),
                    LatestValue {
                        key: key.to_string(),
                        value: value.clone(),
                        timestamp: ts,
                    },
                )
            })
            .collect()
    }

    fn definition(key: &str) -> KpiDefinition {
        KPI_DEFINITIONS.into_iter().find(|d| d.key == key).unwrap()
    }

    #[test]
    fn boundaries_follow_inclusivity_rules() {
        for def in &KPI_DEFINITIONS {
            let t = &def.thresholds;
            if let Some(critical) = t.critical {
                assert_eq!(determine_status(critical, t), KpiStatus::Critical, "{}", def.key);
            }
            if let Some(low) = t.low {
                assert_eq!(determine_status(low, t), KpiStatus::Good, "{}", def.key);
                assert_eq!(determine_status(low - 0.1, t), KpiStatus::Low, "{}", def.key);
            }
            if let Some(high) = t.high {
                assert_eq!(determine_status(high, t), KpiStatus::Good, "{}", def.key);
                assert_eq!(determine_status(high + 0.1, t), KpiStatus::High, "{}", def.key);
            }
        }
    }

    #[test]
    fn soil_humidity_bands() {
        let t = &definition("Humidity_Soil").thresholds;
        assert_eq!(determine_status(5.0, t), KpiStatus::Critical);
        assert_eq!(determine_status(10.5, t), KpiStatus::Low);
        assert_eq!(determine_status(55.0, t), KpiStatus::Good);
        assert_eq!(determine_status(81.0, t), KpiStatus::High);
    }

    #[test]
    fn missing_thresholds_never_match() {
        let air = &definition("Humidity_Air").thresholds;
        assert_eq!(determine_status(-100.0, air), KpiStatus::Low);
        let feed = &definition("Silo_Feed").thresholds;
        assert_eq!(determine_status(1_000.0, feed), KpiStatus::Good);
    }

    #[test]
    fn rounds_for_display() {
        assert_eq!(display_value(25.0), DisplayValue::Integer(25));
        assert_eq!(display_value(25.04), DisplayValue::Decimal(25.0));
        assert_eq!(display_value(18.66), DisplayValue::Decimal(18.7));
        assert_eq!(display_value(-3.0), DisplayValue::Integer(-3));
    }

    #[test]
    fn display_rounds_scaled_halves_away_from_zero() {
        assert_eq!(display_value(0.15), DisplayValue::Decimal(0.2));
        assert_eq!(display_value(-0.15), DisplayValue::Decimal(-0.2));
        assert_eq!(display_value(2.25), DisplayValue::Decimal(2.3));
    }

    #[test]
    fn critical_soil_humidity_tile() {
        let kpis = classify(
            &snapshot(&[("Humidity_Soil", ReadingValue::Numeric(8.0))]),
            &KPI_DEFINITIONS,
        );
        assert_eq!(
            kpis,
            vec![Kpi {
                title: "Humidity Soil".into(),
                value: DisplayValue::Integer(8),
                unit: "%".into(),
                status: KpiStatus::Critical,
                icon: "💧".into(),
            }]
        );
    }

    #[test]
    fn absent_and_text_values_produce_no_tile() {
        let snap = snapshot(&[
            ("Humidity_Soil", ReadingValue::Text("OFF".into())),
            ("Tank_Water", ReadingValue::Numeric(35.0)),
            ("Stato_Pump", ReadingValue::Text("ON".into())),
        ]);
        let kpis = classify(&snap, &KPI_DEFINITIONS);
        assert_eq!(kpis.len(), 1);
        assert_eq!(kpis[0].title, "Water Level");
        assert_eq!(kpis[0].status, KpiStatus::Low);
        assert!(snap.contains_key("Humidity_Soil"));
    }

    #[test]
    fn tiles_follow_definition_order() {
        let snap = snapshot(&[
            ("Temperature_Air", ReadingValue::Numeric(31.2)),
            ("Silo_Feed", ReadingValue::Numeric(90.0)),
            ("Humidity_Air", ReadingValue::Numeric(60.0)),
            ("Humidity_Soil", ReadingValue::Numeric(45.0)),
            ("Tank_Water", ReadingValue::Numeric(15.0)),
        ]);
        let titles: Vec<_> = classify(&snap, &KPI_DEFINITIONS).into_iter().map(|k| k.title).collect();
        assert_eq!(
            titles,
            ["Humidity Soil", "Humidity Air", "Feed Level", "Water Level", "Temperature"]
        );
    }

    #[test]
    fn kpi_serializes_for_the_client() {
        let kpis = classify(
            &snapshot(&[("Temperature_Air", ReadingValue::Numeric(22.46))]),
            &KPI_DEFINITIONS,
        );
        let json = serde_json::to_value(&kpis).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "title": "Temperature",
                "value": 22.5,
                "unit": "°C",
                "status": "good",
                "icon": "🌡️"
            }])
        );
    }
}
