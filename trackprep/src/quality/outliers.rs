//! Distribution-based outlier detection.
//!
//! One fence algorithm, two populations: the whole sample, or each track's
//! own distribution. Comparisons are strictly outside the fences, so values
//! exactly at a quantile or fence are never flagged, and a collapsed
//! (zero-IQR) fence flags nothing.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::error::PrepResult;
use crate::core::schema;
use crate::stats;
use crate::trajectories::grouping;

/// Aggregate flag for sample-population outliers.
pub const OUTLIER_IN_SAMPLE_FLAG: &str = "outlier_in_sample";
/// Aggregate flag for track-population outliers.
pub const OUTLIER_IN_TRACK_FLAG: &str = "outlier_in_track_all";
/// Fixed removal fence for acceleration, keeping legitimate hard braking.
pub const ACCELERATION_FENCE: (f64, f64) = (-20.0, 20.0);

pub use crate::trajectories::kinematics::ACCELERATION_COLUMN;

/// Options for the outlier flagging modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierOptions {
    /// Replace flagged values with missing in place.
    pub set_to_null: bool,
    /// Keep the per-variable diagnostic columns.
    pub keep_variable_flags: bool,
    /// Keep the aggregate flag column.
    pub keep_flag: bool,
    /// Track mode only: keep the broadcast fence columns.
    pub keep_limits: bool,
}

impl Default for OutlierOptions {
    fn default() -> Self {
        Self {
            set_to_null: false,
            keep_variable_flags: true,
            keep_flag: true,
            keep_limits: false,
        }
    }
}

/// Per-variable and aggregate counts from one flagging pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierFlagReport {
    pub per_variable: Vec<(String, usize)>,
    pub rows_flagged: usize,
}

/// Diagnostics for bulk outlier removal on one variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierRemovalReport {
    pub column: String,
    pub rows_before: usize,
    pub rows_after: usize,
    pub removed: usize,
}

/// Flags values outside the whole-sample fences of each continuous field.
pub fn flag_outliers_in_sample(
    df: &DataFrame,
    options: &OutlierOptions,
) -> PrepResult<(DataFrame, OutlierFlagReport)> {
    let variables = schema::continuous_columns(df);
    let mut out = df.clone();
    let mut aggregate = vec![0i32; df.height()];
    let mut per_variable = Vec::with_capacity(variables.len());

    for variable in &variables {
        let (flags, nulled) = {
            let values = schema::float_column(&out, variable)?;
            let sample: Vec<f64> = values.into_iter().flatten().collect();
            let fences = stats::iqr_fences(&sample).map(|f| (f.low, f.high));
            flag_against_fences(values, |_| fences)
        };
        apply_variable(
            &mut out,
            &mut aggregate,
            &mut per_variable,
            variable,
            OUTLIER_IN_SAMPLE_FLAG,
            flags,
            nulled,
            options,
        )?;
    }

    finish(out, aggregate, per_variable, OUTLIER_IN_SAMPLE_FLAG, options)
}

/// Flags values outside their own track's fences.
///
/// Fences are computed per track group and broadcast back onto the group's
/// rows before comparison; with a single-track input the flags are identical
/// to sample mode.
pub fn flag_outliers_in_track(
    df: &DataFrame,
    options: &OutlierOptions,
) -> PrepResult<(DataFrame, OutlierFlagReport)> {
    let variables = schema::continuous_columns(df);
    let groups = grouping::group_indices(df)?;
    let mut out = df.clone();
    let mut aggregate = vec![0i32; df.height()];
    let mut per_variable = Vec::with_capacity(variables.len());

    for variable in &variables {
        let (flags, nulled, lower, upper) = {
            let values = schema::float_column(&out, variable)?;

            let mut lower: Vec<Option<f64>> = vec![None; values.len()];
            let mut upper: Vec<Option<f64>> = vec![None; values.len()];
            for rows in groups.values() {
                let sample: Vec<f64> = rows
                    .iter()
                    .filter_map(|&row| values.get(row as usize))
                    .collect();
                if let Some(fences) = stats::iqr_fences(&sample) {
                    for &row in rows {
                        lower[row as usize] = Some(fences.low);
                        upper[row as usize] = Some(fences.high);
                    }
                }
            }

            let (flags, nulled) = flag_against_fences(values, |row| {
                match (lower[row], upper[row]) {
                    (Some(low), Some(high)) => Some((low, high)),
                    _ => None,
                }
            });
            (flags, nulled, lower, upper)
        };

        if options.keep_limits {
            out.with_column(Series::new(
                format!("track_lowerLimit_{variable}").into(),
                lower,
            ))?;
            out.with_column(Series::new(
                format!("track_upperLimit_{variable}").into(),
                upper,
            ))?;
        }
        apply_variable(
            &mut out,
            &mut aggregate,
            &mut per_variable,
            variable,
            "outlier_in_track",
            flags,
            nulled,
            options,
        )?;
    }

    finish(out, aggregate, per_variable, OUTLIER_IN_TRACK_FLAG, options)
}

/// Physically removes rows outside the fences of one named variable.
///
/// `Acceleration.value` uses the fixed fence (−20, 20) instead of quantile
/// fences. Rows whose value is missing fail both strict comparisons and are
/// removed along with the outliers.
pub fn remove_outliers(
    df: &DataFrame,
    column: &str,
) -> PrepResult<(DataFrame, OutlierRemovalReport)> {
    let rows_before = df.height();
    let keep: Vec<bool> = {
        let values = schema::float_column(df, column)?;
        let (low, high) = if column == ACCELERATION_COLUMN {
            ACCELERATION_FENCE
        } else {
            let sample: Vec<f64> = values.into_iter().flatten().collect();
            match stats::iqr_fences(&sample) {
                Some(fences) => (fences.low, fences.high),
                // no usable values: every row fails the strict comparisons
                None => (f64::NAN, f64::NAN),
            }
        };
        values
            .into_iter()
            .map(|value| matches!(value, Some(v) if v > low && v < high))
            .collect()
    };

    let filtered = df.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
    let report = OutlierRemovalReport {
        column: column.to_string(),
        rows_before,
        rows_after: filtered.height(),
        removed: rows_before - filtered.height(),
    };
    log::info!("removed {} outliers from {}", report.removed, report.column);
    Ok((filtered, report))
}

fn flag_against_fences(
    values: &Float64Chunked,
    fences_for_row: impl Fn(usize) -> Option<(f64, f64)>,
) -> (Vec<i32>, Vec<Option<f64>>) {
    let mut flags = Vec::with_capacity(values.len());
    for (row, value) in values.into_iter().enumerate() {
        let flagged = match (value, fences_for_row(row)) {
            (Some(v), Some((low, high))) => v < low || v > high,
            _ => false,
        };
        flags.push(if flagged { 1 } else { 0 });
    }
    let nulled: Vec<Option<f64>> = values
        .into_iter()
        .zip(&flags)
        .map(|(value, &flag)| if flag == 1 { None } else { value })
        .collect();
    (flags, nulled)
}

#[allow(clippy::too_many_arguments)]
fn apply_variable(
    out: &mut DataFrame,
    aggregate: &mut [i32],
    per_variable: &mut Vec<(String, usize)>,
    variable: &str,
    flag_prefix: &str,
    flags: Vec<i32>,
    nulled: Vec<Option<f64>>,
    options: &OutlierOptions,
) -> PrepResult<()> {
    let count = flags.iter().filter(|&&f| f == 1).count();
    log::info!("{flag_prefix}_{variable}: {count} values flagged");
    per_variable.push((variable.to_string(), count));
    for (slot, &flag) in aggregate.iter_mut().zip(&flags) {
        if flag == 1 {
            *slot = 1;
        }
    }

    if options.set_to_null {
        out.with_column(Series::new(variable.into(), nulled))?;
    }
    if options.keep_variable_flags {
        out.with_column(Series::new(format!("{flag_prefix}_{variable}").into(), flags))?;
    }
    Ok(())
}

fn finish(
    mut out: DataFrame,
    aggregate: Vec<i32>,
    per_variable: Vec<(String, usize)>,
    flag_name: &str,
    options: &OutlierOptions,
) -> PrepResult<(DataFrame, OutlierFlagReport)> {
    let rows_flagged = aggregate.iter().filter(|&&f| f == 1).count();
    log::info!("{flag_name}: {rows_flagged} rows flagged");
    if options.keep_flag {
        out.with_column(Series::new(flag_name.into(), aggregate))?;
    }
    Ok((
        out,
        OutlierFlagReport {
            per_variable,
            rows_flagged,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 11 ordinary values plus one far outlier.
    fn spiked_df() -> DataFrame {
        let mut speeds: Vec<f64> = (0..11).map(|v| v as f64).collect();
        speeds.push(1000.0);
        df!(
            "track.id" => vec!["t1"; 12],
            "Speed.value" => speeds,
        )
        .unwrap()
    }

    #[test]
    fn test_sample_mode_flags_spike() {
        let (out, report) = flag_outliers_in_sample(&spiked_df(), &OutlierOptions::default()).unwrap();
        assert_eq!(report.rows_flagged, 1);
        let flags = out.column(OUTLIER_IN_SAMPLE_FLAG).unwrap().i32().unwrap();
        assert_eq!(flags.get(11), Some(1));
        assert_eq!(flags.get(0), Some(0));
        // per-variable column kept by default in sample mode
        assert!(out.column("outlier_in_sample_Speed.value").is_ok());
    }

    #[test]
    fn test_values_at_fences_are_not_flagged() {
        // constant sample: fences collapse onto the value itself
        let df = df!(
            "track.id" => vec!["t1"; 5],
            "Speed.value" => vec![5.0; 5],
        )
        .unwrap();
        let (_, report) = flag_outliers_in_sample(&df, &OutlierOptions::default()).unwrap();
        assert_eq!(report.rows_flagged, 0);
    }

    #[test]
    fn test_zero_iqr_small_group_flags_nothing() {
        let df = df!(
            "track.id" => ["t1", "t1", "t1"],
            "Speed.value" => [4.0, 4.0, 4.0],
        )
        .unwrap();
        let (_, report) = flag_outliers_in_track(&df, &OutlierOptions::default()).unwrap();
        assert_eq!(report.rows_flagged, 0);
    }

    #[test]
    fn test_track_mode_single_track_matches_sample_mode() {
        let options = OutlierOptions {
            keep_variable_flags: true,
            ..Default::default()
        };
        let (sample_out, sample_report) =
            flag_outliers_in_sample(&spiked_df(), &options).unwrap();
        let (track_out, track_report) = flag_outliers_in_track(&spiked_df(), &options).unwrap();

        assert_eq!(sample_report.per_variable, track_report.per_variable);
        let sample_flags: Vec<Option<i32>> = sample_out
            .column("outlier_in_sample_Speed.value")
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        let track_flags: Vec<Option<i32>> = track_out
            .column("outlier_in_track_Speed.value")
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(sample_flags, track_flags);
    }

    #[test]
    fn test_track_mode_uses_per_track_population() {
        // the spike is normal for its own track, outlying for the other
        let mut track_a: Vec<f64> = (0..11).map(|v| v as f64).collect();
        track_a.push(1000.0);
        let track_b = vec![990.0, 995.0, 1000.0, 1005.0, 1010.0, 990.0, 995.0, 1000.0, 1005.0, 1010.0, 1000.0];
        let mut ids = vec!["a"; 12];
        ids.extend(vec!["b"; 11]);
        let mut speeds = track_a;
        speeds.extend(track_b);
        let df = df!(
            "track.id" => ids,
            "Speed.value" => speeds,
        )
        .unwrap();

        let (out, report) = flag_outliers_in_track(&df, &OutlierOptions::default()).unwrap();
        assert_eq!(report.rows_flagged, 1);
        let flags = out.column(OUTLIER_IN_TRACK_FLAG).unwrap().i32().unwrap();
        assert_eq!(flags.get(11), Some(1)); // 1000.0 within track "a"
        for row in 12..23 {
            assert_eq!(flags.get(row), Some(0)); // 1000.0-ish within track "b"
        }
    }

    #[test]
    fn test_track_mode_limit_columns_toggle() {
        let options = OutlierOptions {
            keep_limits: true,
            ..Default::default()
        };
        let (out, _) = flag_outliers_in_track(&spiked_df(), &options).unwrap();
        assert!(out.column("track_lowerLimit_Speed.value").is_ok());
        assert!(out.column("track_upperLimit_Speed.value").is_ok());

        let (out, _) = flag_outliers_in_track(&spiked_df(), &OutlierOptions::default()).unwrap();
        assert!(out.column("track_lowerLimit_Speed.value").is_err());
    }

    #[test]
    fn test_nulling_flagged_values() {
        let options = OutlierOptions {
            set_to_null: true,
            ..Default::default()
        };
        let (out, _) = flag_outliers_in_sample(&spiked_df(), &options).unwrap();
        let speeds = out.column("Speed.value").unwrap().f64().unwrap();
        assert_eq!(speeds.get(11), None);
        assert_eq!(speeds.get(0), Some(0.0));
    }

    #[test]
    fn test_remove_outliers_quantile_fences() {
        let (out, report) = remove_outliers(&spiked_df(), "Speed.value").unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(out.height(), 11);
    }

    #[test]
    fn test_remove_outliers_acceleration_fixed_fence() {
        let df = df!(
            "track.id" => vec!["t1"; 5],
            "Acceleration.value" => [-25.0, -19.9, 0.0, 19.9, 25.0],
        )
        .unwrap();
        let (out, report) = remove_outliers(&df, ACCELERATION_COLUMN).unwrap();
        assert_eq!(report.removed, 2);
        let values: Vec<Option<f64>> = out
            .column(ACCELERATION_COLUMN)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(-19.9), Some(0.0), Some(19.9)]);
    }

    #[test]
    fn test_remove_outliers_drops_missing_values() {
        let df = df!(
            "track.id" => vec!["t1"; 13],
            "Speed.value" => vec![
                Some(0.0), Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0),
                Some(6.0), Some(7.0), Some(8.0), Some(9.0), Some(10.0), None,
                Some(1000.0),
            ],
        )
        .unwrap();
        let (out, report) = remove_outliers(&df, "Speed.value").unwrap();
        assert_eq!(report.removed, 2);
        assert_eq!(out.height(), 11);
    }
}
