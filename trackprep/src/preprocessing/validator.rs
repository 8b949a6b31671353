//! Input-schema validation with detailed error and warning reporting.
//!
//! Validates the point table against the configured column roles before a
//! pipeline run: required columns, measurement column types, timestamp
//! parseability, coordinate completeness, and the constancy of track-level
//! metadata (which is tolerated when violated, with the first observed value
//! treated as canonical downstream).

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::schema::{self, TrackSchema, COL_LAT, COL_LNG, COL_TIME, COL_TRACK_ID};
use crate::time;
use crate::trajectories::grouping;

const MAX_ITEMIZED: usize = 5;

/// Validation outcome with categorized issues and statistics.
///
/// Errors make `is_valid` false; warnings are informational.
///
/// # Examples
///
/// ```
/// use trackprep::preprocessing::validator::ValidationResult;
///
/// let mut result = ValidationResult::new();
/// assert!(result.is_valid);
///
/// result.add_error("missing required column: time".to_string());
/// assert!(!result.is_valid);
/// assert_eq!(result.errors.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ValidationStats,
}

/// Summary statistics computed during validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_points: usize,
    pub total_tracks: usize,
    pub value_columns: usize,
    pub unit_columns: usize,
    pub null_coordinates: usize,
    pub unparseable_timestamps: usize,
    pub inconsistent_metadata: usize,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            stats: ValidationStats::default(),
        }
    }

    /// Adds a critical error and marks the result as invalid.
    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        self.errors.push(error);
    }

    /// Adds a non-critical warning without invalidating the result.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for point tables.
pub struct TrackValidator;

impl TrackValidator {
    /// Validates a point table against the configured column roles.
    pub fn validate_dataframe(df: &DataFrame, track_schema: &TrackSchema) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.stats.total_points = df.height();

        for col in [COL_TIME, COL_TRACK_ID, COL_LNG, COL_LAT] {
            if df.column(col).is_err() {
                result.add_error(format!("missing required column: {col}"));
            }
        }
        if !result.is_valid {
            return result;
        }

        Self::check_measurement_columns(df, &mut result);
        Self::check_schema_lists(df, track_schema, &mut result);
        Self::check_timestamps(df, &mut result);
        Self::check_coordinates(df, &mut result);
        Self::check_metadata_constancy(df, &mut result);

        result
    }

    fn check_measurement_columns(df: &DataFrame, result: &mut ValidationResult) {
        let value_cols = schema::value_columns(df);
        result.stats.value_columns = value_cols.len();
        for name in &value_cols {
            if let Ok(col) = df.column(name) {
                if col.dtype() != &DataType::Float64 {
                    result.add_error(format!(
                        "measurement column '{}' has type {:?}, expected Float64",
                        name,
                        col.dtype()
                    ));
                }
            }
        }

        let unit_cols = schema::unit_columns(df);
        result.stats.unit_columns = unit_cols.len();
        for name in &unit_cols {
            let value_name = format!("{}.value", name.trim_end_matches(".unit"));
            if df.column(&value_name).is_err() {
                result.add_warning(format!(
                    "unit column '{name}' has no paired '{value_name}' column"
                ));
            }
        }
    }

    fn check_schema_lists(df: &DataFrame, track_schema: &TrackSchema, result: &mut ValidationResult) {
        for name in &track_schema.identity_columns {
            if df.column(name).is_err() {
                result.add_warning(format!(
                    "identity column '{name}' is not in the table; deduplication will fail"
                ));
            }
        }
        for name in &track_schema.non_negative_columns {
            if df.column(name).is_err() {
                result.add_warning(format!(
                    "non-negative column '{name}' is not in the table; the sign check will fail"
                ));
            }
        }
    }

    fn check_timestamps(df: &DataFrame, result: &mut ValidationResult) {
        let Ok(times) = schema::str_column(df, COL_TIME) else {
            result.add_error(format!("column '{COL_TIME}' must be String"));
            return;
        };
        for (row, value) in times.into_iter().enumerate() {
            let parseable = value
                .map(|v| time::parse_timestamp(v).is_ok())
                .unwrap_or(false);
            if !parseable {
                result.stats.unparseable_timestamps += 1;
                if result.stats.unparseable_timestamps <= MAX_ITEMIZED {
                    result.add_error(format!(
                        "unparseable timestamp at row {row}: {:?}",
                        value.unwrap_or("<null>")
                    ));
                }
            }
        }
        if result.stats.unparseable_timestamps > MAX_ITEMIZED {
            result.add_error(format!(
                "total unparseable timestamps: {} (showing first {MAX_ITEMIZED})",
                result.stats.unparseable_timestamps
            ));
        }
    }

    fn check_coordinates(df: &DataFrame, result: &mut ValidationResult) {
        for name in [COL_LNG, COL_LAT] {
            if let Ok(col) = df.column(name) {
                result.stats.null_coordinates += col.null_count();
            }
        }
        if result.stats.null_coordinates > 0 {
            result.add_warning(format!(
                "{} missing coordinate values",
                result.stats.null_coordinates
            ));
        }
    }

    fn check_metadata_constancy(df: &DataFrame, result: &mut ValidationResult) {
        let Ok(groups) = grouping::group_indices(df) else {
            return;
        };
        result.stats.total_tracks = groups.len();

        let metadata: Vec<&Column> = df
            .get_columns()
            .iter()
            .filter(|col| {
                let name = col.name().as_str();
                (name.starts_with("track.") || name.starts_with("sensor."))
                    && name != COL_TRACK_ID
            })
            .collect();

        for column in metadata {
            for (track_id, rows) in &groups {
                let Ok(first) = column.get(rows[0] as usize) else {
                    continue;
                };
                let varies = rows.iter().skip(1).any(|&row| {
                    column
                        .get(row as usize)
                        .map(|value| match (&value, &first) {
                            (AnyValue::Null, AnyValue::Null) => false,
                            _ => value != first,
                        })
                        .unwrap_or(false)
                });
                if varies {
                    result.stats.inconsistent_metadata += 1;
                    if result.stats.inconsistent_metadata <= MAX_ITEMIZED {
                        result.add_warning(format!(
                            "metadata column '{}' varies within track '{}'; the first value is canonical",
                            column.name(),
                            track_id
                        ));
                    }
                }
            }
        }
        if result.stats.inconsistent_metadata > MAX_ITEMIZED {
            result.add_warning(format!(
                "total inconsistent metadata columns: {} (showing first {MAX_ITEMIZED})",
                result.stats.inconsistent_metadata
            ));
        }
    }
}
