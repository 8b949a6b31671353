//! Column-role configuration for the point table.
//!
//! The working table carries a stable set of well-known columns (`id`, `time`,
//! `lng`, `lat`, `track.id`) plus an open set of `<name>.value` measurement
//! columns, `<name>.unit` tags and `track.*`/`sensor.*` metadata. The lists
//! that drive deduplication, sign validation and resampling are configuration
//! held in [`TrackSchema`] rather than string literals scattered through the
//! stages, and are validated against the actual input before a pipeline run.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::error::{PrepError, PrepResult};

/// Row identifier column, regenerated by the resampler.
pub const COL_ID: &str = "id";
/// Timestamp column, `YYYY-MM-DDTHH:MM:SS` without timezone offset.
pub const COL_TIME: &str = "time";
/// Longitude column (flattened geometry x).
pub const COL_LNG: &str = "lng";
/// Latitude column (flattened geometry y).
pub const COL_LAT: &str = "lat";
/// Track identifier column.
pub const COL_TRACK_ID: &str = "track.id";

const VALUE_SUFFIX: &str = ".value";
const UNIT_SUFFIX: &str = ".unit";

/// Column-role configuration with the domain-fixed envirocar defaults.
///
/// # Examples
///
/// ```
/// use trackprep::core::TrackSchema;
///
/// let schema = TrackSchema::default();
/// assert!(schema.identity_columns.iter().any(|c| c == "Speed.value"));
/// assert!(schema.non_negative_columns.iter().any(|c| c == "Rpm.value"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSchema {
    /// Columns that participate in duplicate identity comparison. Unit and id
    /// columns must never appear here.
    pub identity_columns: Vec<String>,
    /// Measurement columns that are physically non-negative.
    pub non_negative_columns: Vec<String>,
    /// Columns the resampler regenerates instead of interpolating or
    /// replicating.
    pub excluded_columns: Vec<String>,
}

impl Default for TrackSchema {
    fn default() -> Self {
        Self {
            identity_columns: [
                COL_LNG,
                COL_LAT,
                "Engine Load.value",
                "Calculated MAF.value",
                "Speed.value",
                "CO2.value",
                "Intake Pressure.value",
                "Rpm.value",
                "Intake Temperature.value",
                "Consumption (GPS-based).value",
                "GPS Altitude.value",
                "Throttle Position.value",
                "GPS Bearing.value",
                "Consumption.value",
                "GPS Accuracy.value",
                "CO2 Emission (GPS-based).value",
                "GPS Speed.value",
                "track.length",
                "track.begin",
                "track.end",
                "sensor.type",
                "sensor.engineDisplacement",
                "sensor.model",
                "sensor.id",
                "sensor.fuelType",
                "sensor.constructionYear",
                "sensor.manufacturer",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            non_negative_columns: [
                "Speed.value",
                "CO2.value",
                "Rpm.value",
                "Consumption (GPS-based).value",
                "Consumption.value",
                "CO2 Emission (GPS-based).value",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            excluded_columns: vec![COL_ID.to_string(), COL_TIME.to_string()],
        }
    }
}

impl TrackSchema {
    /// Checks that every column in `names` exists in the frame.
    pub fn require_columns(df: &DataFrame, names: &[String]) -> PrepResult<()> {
        for name in names {
            if df.column(name).is_err() {
                return Err(PrepError::MissingColumn(name.clone()));
            }
        }
        Ok(())
    }
}

/// Fetches a column, mapping the polars lookup failure to a descriptive error.
pub fn column<'a>(df: &'a DataFrame, name: &str) -> PrepResult<&'a Column> {
    df.column(name)
        .map_err(|_| PrepError::MissingColumn(name.to_string()))
}

/// Fetches a Float64 measurement column.
pub fn float_column<'a>(df: &'a DataFrame, name: &str) -> PrepResult<&'a Float64Chunked> {
    let col = column(df, name)?;
    col.f64().map_err(|_| PrepError::ColumnType {
        column: name.to_string(),
        expected: "Float64".to_string(),
        actual: format!("{:?}", col.dtype()),
    })
}

/// Fetches a String column.
pub fn str_column<'a>(df: &'a DataFrame, name: &str) -> PrepResult<&'a StringChunked> {
    let col = column(df, name)?;
    col.str().map_err(|_| PrepError::ColumnType {
        column: name.to_string(),
        expected: "String".to_string(),
        actual: format!("{:?}", col.dtype()),
    })
}

/// All `<name>.value` column names, in frame order.
pub fn value_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .filter(|name| name.as_str().ends_with(VALUE_SUFFIX))
        .map(|name| name.to_string())
        .collect()
}

/// All `<name>.unit` column names, in frame order.
pub fn unit_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .filter(|name| name.as_str().ends_with(UNIT_SUFFIX))
        .map(|name| name.to_string())
        .collect()
}

/// Continuous measurement fields: Float64 columns named `<name>.value`.
///
/// Flag columns (Int32), coordinates and incidental numeric metadata such as
/// `track.length` stay out of distribution-based statistics.
pub fn continuous_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| col.name().as_str().ends_with(VALUE_SUFFIX) && col.dtype() == &DataType::Float64)
        .map(|col| col.name().to_string())
        .collect()
}

/// Measurement columns whose declared unit is `%`.
///
/// Every `<name>.unit` column whose first value is `"%"` nominates
/// `<name>.value`; a nominated value column that is absent from the frame is
/// an input-shape error.
pub fn percentage_value_columns(df: &DataFrame) -> PrepResult<Vec<String>> {
    let mut names = Vec::new();
    for unit_name in unit_columns(df) {
        let unit = str_column(df, &unit_name)?;
        if unit.get(0) != Some("%") {
            continue;
        }
        let prefix = unit_name.trim_end_matches(UNIT_SUFFIX);
        let value_name = format!("{prefix}{VALUE_SUFFIX}");
        if df.column(&value_name).is_err() {
            return Err(PrepError::MissingColumn(value_name));
        }
        names.push(value_name);
    }
    Ok(names)
}
