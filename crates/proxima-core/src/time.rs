//! Time helpers for the proximity hub
//!
//! All staleness and dedup decisions are data-driven expirations over epoch
//! seconds. Every store and dedup API takes `now` explicitly so tests can
//! cross windows without sleeping; `unix_now` is called only at the edges
//! (packet arrival, snapshot production).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current wall-clock time as fractional epoch seconds
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
}

/// Convert fractional epoch seconds back to a `SystemTime`
pub fn epoch_to_system_time(epoch_s: f64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs_f64(epoch_s.max(0.0))
}

/// Round to two decimal places (wire precision for d/q/vol fields)
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to one decimal place (wire precision for ages and uptimes)
#[inline]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
