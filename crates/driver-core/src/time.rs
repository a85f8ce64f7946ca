//! Duration and timestamp text formats used in configuration documents.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::errors::{DriverError, ErrorInfo};

const MICROS_PER_SECOND: u64 = 1_000_000;

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y%m%d %H:%M:%S",
    "%Y%m%dT%H%M%S",
];

fn coercion_error(code: &str, expected: &str, value: &str) -> DriverError {
    DriverError::TypeCoercion(
        ErrorInfo::new(code, format!("could not parse \"{value}\" as {expected}"))
            .with_context("expected", expected)
            .with_context("value", value),
    )
}

fn split_micros(duration: &Duration) -> (&'static str, u64) {
    let micros = duration.num_microseconds().unwrap_or(i64::MAX);
    let sign = if micros < 0 { "-" } else { "" };
    (sign, micros.unsigned_abs())
}

/// Formats a duration as `HH:MM:SS.f` with total hours and trimmed fractional seconds.
///
/// At least one fractional digit is always written so the value reads back unchanged.
pub fn format_duration(duration: &Duration) -> String {
    let (sign, micros) = split_micros(duration);
    let total_seconds = micros / MICROS_PER_SECOND;
    let fraction = micros % MICROS_PER_SECOND;
    let fraction = if fraction == 0 {
        "0".to_string()
    } else {
        format!("{fraction:06}").trim_end_matches('0').to_string()
    };
    format!(
        "{sign}{:02}:{:02}:{:02}.{fraction}",
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60
    )
}

/// Formats a duration as `HH:MM:SS`, rounding to the nearest second.
pub fn format_clock_duration(duration: &Duration) -> String {
    let (sign, micros) = split_micros(duration);
    let total_seconds = (micros + MICROS_PER_SECOND / 2) / MICROS_PER_SECOND;
    format!(
        "{sign}{:02}:{:02}:{:02}",
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60
    )
}

/// Parses `HH:MM:SS[.f]`, `D:HH:MM:SS[.f]` or a plain number of seconds.
pub fn parse_duration(value: &str) -> Result<Duration, DriverError> {
    let trimmed = value.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let parts = body
        .split(':')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| coercion_error("invalid_duration", "duration", value))?;
    let seconds = match parts.as_slice() {
        [seconds] => *seconds,
        [hours, minutes, seconds] => hours * 3600.0 + minutes * 60.0 + seconds,
        [days, hours, minutes, seconds] => {
            days * 86_400.0 + hours * 3600.0 + minutes * 60.0 + seconds
        }
        _ => return Err(coercion_error("invalid_duration", "duration", value)),
    };
    let seconds = if negative { -seconds } else { seconds };
    duration_from_seconds(seconds).ok_or_else(|| coercion_error("invalid_duration", "duration", value))
}

/// Converts a number of seconds into a duration.
///
/// Returns `None` for non-finite values and for values outside the representable range.
pub fn duration_from_seconds(seconds: f64) -> Option<Duration> {
    let micros = (seconds * MICROS_PER_SECOND as f64).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(Duration::microseconds(micros as i64))
}

/// Shifts `timestamp` by `offset`, failing when the result leaves the calendar range.
pub fn offset_timestamp(
    timestamp: NaiveDateTime,
    offset: Duration,
    field: &str,
) -> Result<NaiveDateTime, DriverError> {
    timestamp.checked_add_signed(offset).ok_or_else(|| {
        DriverError::TypeCoercion(
            ErrorInfo::new(
                "timestamp_out_of_range",
                format!(
                    "{} shifted by {} is outside the supported calendar range",
                    format_timestamp(&timestamp),
                    format_duration(&offset)
                ),
            )
            .with_context("field", field)
            .with_context("timestamp", format_timestamp(&timestamp))
            .with_context("offset", format_duration(&offset)),
        )
    })
}

/// Returns the duration in fractional seconds.
pub fn duration_seconds(duration: &Duration) -> f64 {
    match duration.num_microseconds() {
        Some(micros) => micros as f64 / MICROS_PER_SECOND as f64,
        None => duration.num_seconds() as f64,
    }
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS`, keeping sub-second digits when present.
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    if timestamp.nanosecond() == 0 {
        timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        timestamp.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    }
}

/// Parses ISO-like timestamps with a space or `T` separator, or a bare date.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, DriverError> {
    let trimmed = value.trim().trim_end_matches('Z');
    for format in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| coercion_error("invalid_timestamp", "timestamp", value))
}
