//! Handwritten Diesel schema declarations used by model structs.
//!
//! The tables themselves are created by the embedded migrations under
//! `migrations/`. Both tables store every value as text; typing happens when
//! rows are normalized in `crate::store`.

// Append-only log of sensor readings and actuator states
diesel::table! {
    historical_log (id) {
        id -> BigInt,
        time -> Timestamptz,
        parameter -> Text,
        asset -> Text,
        value -> Text,
    }
}

// Latest known value per (parameter, asset); not unique at the SQL level
diesel::table! {
    latest_state (id) {
        id -> BigInt,
        time -> Timestamptz,
        parameter -> Text,
        asset -> Text,
        value -> Text,
    }
}
