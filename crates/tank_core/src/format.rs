//! Display helpers: fixed-decimal numbers and elapsed-time-to-clock-time.
//!
//! Pure functions over already-validated values; the caller owns the clock.

use chrono::{Duration, NaiveDateTime, Timelike};

/// Render a number with a fixed number of decimals.
pub fn fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// The wall-clock instant `elapsed_hours` after `now`.
///
/// Whole hours plus rounded minutes, so the result has minute resolution.
#[allow(clippy::cast_possible_truncation)] // elapsed_hours is bounded by the horizon
pub fn clock_after(now: NaiveDateTime, elapsed_hours: f64) -> NaiveDateTime {
    let hours = elapsed_hours.trunc() as i64;
    let minutes = (elapsed_hours.fract() * 60.0).round() as i64;
    now + Duration::hours(hours) + Duration::minutes(minutes)
}

/// Render an instant as `"HH:MM"`.
pub fn hhmm(at: NaiveDateTime) -> String {
    format!("{:02}:{:02}", at.hour(), at.minute())
}
