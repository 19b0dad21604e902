//! Duration normalization.
//!
//! Drivers hand back `interval` values either as a structured decomposition
//! or as an `HH:MM:SS.fraction` string. Both collapse to a whole number of
//! milliseconds; anything else is returned untouched.

use crate::db::{IntervalParts, Row, Value};
use regex::Regex;
use std::sync::LazyLock;

/// Row field that carries a duration.
pub const DURATION_FIELD: &str = "age";

const MS_PER_DAY: f64 = 86_400_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_MINUTE: f64 = 60_000.0;

static ENCODED_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+):(\d+):(\d+)\.(\d+)").expect("duration pattern is valid")
});

/// A value recognised as a duration, by shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationValue<'a> {
    /// `{days, hours, minutes, seconds, milliseconds}`, absent fields are zero.
    Structured(&'a IntervalParts),
    /// Text that contains `hours:minutes:seconds.fraction`.
    Encoded(&'a str),
}

impl<'a> DurationValue<'a> {
    /// Recognises the duration shapes. Other values are not durations.
    pub fn classify(value: &'a Value) -> Option<Self> {
        match value {
            Value::Interval(parts) => Some(Self::Structured(parts)),
            Value::String(text) => Some(Self::Encoded(text)),
            _ => None,
        }
    }

    /// Total milliseconds, or `None` when a string does not hold a duration.
    pub fn to_millis(self) -> Option<i64> {
        match self {
            Self::Structured(parts) => Some(structured_millis(parts)),
            Self::Encoded(text) => encoded_millis(text),
        }
    }
}

/// Normalizes a duration value to integer milliseconds.
///
/// Values that are not durations, including `Null`, pass through unchanged.
pub fn normalize(value: Value) -> Value {
    match DurationValue::classify(&value).and_then(DurationValue::to_millis) {
        Some(ms) => Value::Int(ms),
        None => value,
    }
}

/// Normalizes the duration field of a row in place, if present and non-null.
pub fn normalize_row(row: &mut Row) {
    if let Some(slot) = row.get_mut(DURATION_FIELD) {
        if !slot.is_null() {
            *slot = normalize(std::mem::take(slot));
        }
    }
}

// Seconds are floored on their own before the total is rounded; rounding
// the total alone gives different answers when milliseconds are also set.
fn structured_millis(parts: &IntervalParts) -> i64 {
    let total = parts.days.unwrap_or(0.0) * MS_PER_DAY
        + parts.hours.unwrap_or(0.0) * MS_PER_HOUR
        + parts.minutes.unwrap_or(0.0) * MS_PER_MINUTE
        + (parts.seconds.unwrap_or(0.0) * 1000.0).floor()
        + parts.milliseconds.unwrap_or(0.0);
    round_half_up(total)
}

fn encoded_millis(text: &str) -> Option<i64> {
    let caps = ENCODED_DURATION.captures(text)?;

    let hours = parse_or_zero(&caps[1]);
    let minutes = parse_or_zero(&caps[2]);
    let seconds = parse_or_zero(&format!("{}.{}", &caps[3], &caps[4]));

    Some(round_half_up(
        hours * MS_PER_HOUR + minutes * MS_PER_MINUTE + seconds * 1000.0,
    ))
}

fn parse_or_zero(digits: &str) -> f64 {
    digits.parse::<f64>().unwrap_or(0.0)
}

/// Rounds to the nearest integer, ties toward positive infinity.
fn round_half_up(x: f64) -> i64 {
    let floor = x.floor();
    let rounded = if x - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i64
}
