//! Conversion between calendar date-times and the engine's day-serial
//! numbers.
//!
//! Serials count days since the fixed epoch 1899-12-30T00:00:00Z (day 1 is
//! 1899-12-31); the fractional part encodes time-of-day. Conversions work
//! in whole milliseconds so round-trips are exact for millisecond-precision
//! dates.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};

use crate::error::{CalcError, Result};

const MS_PER_DAY: f64 = 86_400_000.0;

/// The serial epoch: serial `0.0` corresponds to this instant.
pub fn serial_epoch() -> DateTime<Utc> {
    static EPOCH: OnceLock<DateTime<Utc>> = OnceLock::new();
    *EPOCH.get_or_init(|| {
        Utc.with_ymd_and_hms(1899, 12, 30, 0, 0, 0)
            .single()
            .expect("epoch is a valid UTC date")
    })
}

/// Render a date the way error messages and tests expect it.
pub fn format_iso(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert a date-time to its day serial.
///
/// Fails with [`CalcError::DateNotRepresentable`] for instants before the
/// epoch; out-of-range dates are never clamped.
pub fn date_to_serial(date: DateTime<Utc>) -> Result<f64> {
    let delta_ms = date.signed_duration_since(serial_epoch()).num_milliseconds();
    if delta_ms < 0 {
        return Err(CalcError::DateNotRepresentable(format_iso(date)));
    }
    Ok(delta_ms as f64 / MS_PER_DAY)
}

/// Convert a day serial back to a date-time.
///
/// Fails with [`CalcError::InvalidDateSerial`] for serials with no
/// calendar meaning: negative, non-finite, or past the end of the
/// representable date range.
pub fn serial_to_date(serial: f64) -> Result<DateTime<Utc>> {
    if !serial.is_finite() || serial < 0.0 {
        return Err(CalcError::InvalidDateSerial(serial));
    }
    let ms = (serial * MS_PER_DAY).round() as i64;
    serial_epoch()
        .checked_add_signed(Duration::milliseconds(ms))
        .ok_or(CalcError::InvalidDateSerial(serial))
}
