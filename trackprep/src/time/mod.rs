//! Timestamp parsing and reconstruction.
//!
//! Point timestamps arrive as ISO-8601-like strings without a timezone offset
//! (`YYYY-MM-DDTHH:MM:SS`) and are treated as UTC. The resampler works on an
//! integer seconds-since-epoch parameter and rebuilds timestamp strings from
//! interpolated epoch seconds.

use chrono::{DateTime, NaiveDateTime, Utc};
use polars::prelude::*;

use crate::core::error::{PrepError, PrepResult};
use crate::core::schema::{self, COL_TIME};

/// The point timestamp format. No timezone offset; interpreted as UTC.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses a point timestamp string.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
}

/// Parses a point timestamp into seconds since the Unix epoch.
///
/// # Examples
///
/// ```
/// use trackprep::time::timestamp_to_epoch_seconds;
///
/// assert_eq!(timestamp_to_epoch_seconds("1970-01-01T00:01:40").unwrap(), 100);
/// ```
pub fn timestamp_to_epoch_seconds(value: &str) -> Result<i64, chrono::ParseError> {
    Ok(parse_timestamp(value)?.and_utc().timestamp())
}

/// Rebuilds a timestamp string from (possibly fractional) epoch seconds.
///
/// Fractional seconds are truncated; the output carries second resolution
/// like the input schema.
pub fn epoch_seconds_to_timestamp(seconds: f64) -> PrepResult<String> {
    let whole = seconds.floor();
    if !whole.is_finite() {
        return Err(PrepError::EpochRange(seconds));
    }
    DateTime::<Utc>::from_timestamp(whole as i64, 0)
        .map(|dt| dt.format(TIME_FORMAT).to_string())
        .ok_or(PrepError::EpochRange(seconds))
}

/// Parses the whole `time` column into epoch seconds, failing fast on the
/// first missing or malformed value.
pub fn parse_time_column(df: &DataFrame) -> PrepResult<Vec<i64>> {
    let times = schema::str_column(df, COL_TIME)?;
    let mut seconds = Vec::with_capacity(times.len());
    for (row, value) in times.into_iter().enumerate() {
        let value = value.ok_or(PrepError::NullTimestamp { row })?;
        let parsed = timestamp_to_epoch_seconds(value).map_err(|source| PrepError::Timestamp {
            row,
            value: value.to_string(),
            source,
        })?;
        seconds.push(parsed);
    }
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let secs = timestamp_to_epoch_seconds("2020-06-15T12:30:45").unwrap();
        let back = epoch_seconds_to_timestamp(secs as f64).unwrap();
        assert_eq!(back, "2020-06-15T12:30:45");
    }

    #[test]
    fn test_fractional_seconds_truncate() {
        assert_eq!(
            epoch_seconds_to_timestamp(100.9).unwrap(),
            "1970-01-01T00:01:40"
        );
    }

    #[test]
    fn test_rejects_offset_suffix() {
        assert!(parse_timestamp("2020-06-15T12:30:45Z").is_err());
    }

    #[test]
    fn test_parse_time_column_reports_row() {
        let df = df!(
            "time" => ["2020-06-15T12:30:45", "not-a-time"],
        )
        .unwrap();
        let err = parse_time_column(&df).unwrap_err();
        match err {
            PrepError::Timestamp { row, value, .. } => {
                assert_eq!(row, 1);
                assert_eq!(value, "not-a-time");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_time_column_null_fails() {
        let df = df!(
            "time" => [Some("2020-06-15T12:30:45"), None],
        )
        .unwrap();
        assert!(matches!(
            parse_time_column(&df),
            Err(PrepError::NullTimestamp { row: 1 })
        ));
    }
}
