//! Utility functions for the standings service

use chrono::{DateTime, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Whole minutes elapsed from `start` to `time`, rounded down
pub fn minutes_since(start: DateTime<Utc>, time: DateTime<Utc>) -> i64 {
    (time - start).num_milliseconds().div_euclid(60_000)
}

/// Round to nearest, halves towards positive infinity
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}
