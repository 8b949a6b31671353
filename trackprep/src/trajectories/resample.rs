//! Trajectory resampling: regenerate each track at fixed steps along a
//! monotonic parameter.
//!
//! The parameter is either cumulative traveled distance (integrated from
//! speed and elapsed time, in 1 m or 10 m step units) or elapsed wall-clock
//! seconds. Continuous attributes are interpolated against the parameter,
//! track-level attributes are replicated from the first observed value, and
//! every generated point gets fresh geometry and a fresh random identifier.
//! A track that cannot be interpolated is skipped with a diagnostic instead
//! of failing the batch.

use std::collections::{HashMap, HashSet};

use polars::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{PrepError, PrepResult};
use crate::core::schema::{self, TrackSchema, COL_ID, COL_LAT, COL_LNG, COL_TIME};
use crate::time;
use crate::trajectories::grouping;
use crate::trajectories::interpolate::{interp1d, CoordCurve};
use crate::trajectories::kinematics::SPEED_COLUMN;

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ID_LENGTH: usize = 24;

/// The monotonic parameter the step grid runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// Cumulative traveled distance, in `step_precision`-meter units.
    Meters,
    /// Elapsed wall-clock time in seconds.
    Seconds,
}

/// Resampling options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleOptions {
    pub mode: StepMode,
    /// Distance step precision in meters; anything other than 1 normalizes
    /// to 10. Ignored in seconds mode.
    pub step_precision: u32,
    /// Whether distance-mode output carries a `time` column rebuilt from
    /// time-vs-distance interpolation. Seconds mode always reconstructs the
    /// timestamp from the parameter itself.
    pub reconstruct_time: bool,
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self {
            mode: StepMode::Meters,
            step_precision: 10,
            reconstruct_time: true,
        }
    }
}

/// One track left out of the resampled output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSkip {
    pub track_id: String,
    pub reason: String,
}

/// Diagnostics for the resampling stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResampleReport {
    pub points_before: usize,
    pub points_after: usize,
    pub tracks_resampled: usize,
    pub skipped: Vec<TrackSkip>,
}

/// Resamples every track onto a uniform step grid.
///
/// Column roles: `lng`, `lat` and every `.value` measurement column are
/// interpolated; the columns in `schema.excluded_columns` (`id`, `time` by
/// default) are regenerated; everything else is replicated from the track's
/// first observed value. Tracks concatenate in track-identifier-sorted order.
pub fn resample(
    df: &DataFrame,
    schema: &TrackSchema,
    options: &ResampleOptions,
) -> PrepResult<(DataFrame, ResampleReport)> {
    let points_before = df.height();
    log::info!("{points_before} points before resampling");

    let value_cols = schema::value_columns(df);
    let excluded: HashSet<&str> = schema
        .excluded_columns
        .iter()
        .map(|name| name.as_str())
        .collect();
    let replicated: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str())
        .filter(|name| {
            // id and time are always regenerated
            *name != COL_ID
                && *name != COL_TIME
                && *name != COL_LNG
                && *name != COL_LAT
                && !value_cols.iter().any(|v| v == name)
                && !excluded.contains(name)
        })
        .map(|name| name.to_string())
        .collect();

    let groups = grouping::group_by_track(df)?;

    #[cfg(feature = "parallel")]
    let results: Vec<PrepResult<DataFrame>> = {
        use rayon::prelude::*;
        groups
            .par_iter()
            .map(|(track_id, group)| {
                resample_track(track_id, group, &value_cols, &replicated, options)
            })
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let results: Vec<PrepResult<DataFrame>> = groups
        .iter()
        .map(|(track_id, group)| {
            resample_track(track_id, group, &value_cols, &replicated, options)
        })
        .collect();

    let mut frames = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for result in results {
        match result {
            Ok(frame) => frames.push(frame),
            Err(PrepError::DegenerateTrack { track_id, reason }) => {
                log::warn!("skipping track '{track_id}': {reason}");
                skipped.push(TrackSkip { track_id, reason });
            }
            Err(err) => return Err(err),
        }
    }

    let tracks_resampled = frames.len();
    let combined = grouping::concat_tracks(frames)?;
    log::info!("{} points after resampling", combined.height());

    let report = ResampleReport {
        points_before,
        points_after: combined.height(),
        tracks_resampled,
        skipped,
    };
    Ok((combined, report))
}

fn resample_track(
    track_id: &str,
    group: &DataFrame,
    value_cols: &[String],
    replicated: &[String],
    options: &ResampleOptions,
) -> PrepResult<DataFrame> {
    let sorted = grouping::sort_by_time(group)?;

    // Interpolation needs a strictly monotonic parameter; identical
    // coordinate pairs keep only their last observation.
    let deduped = dedup_coordinates(&sorted)?;
    let times = time::parse_time_column(&deduped)?;

    let param = match options.mode {
        StepMode::Seconds => times.clone(),
        StepMode::Meters => cumulative_distance(track_id, &deduped, &times, options)?,
    };

    // Repeated step units cannot be interpolated over; the first wins.
    let mut seen = HashSet::new();
    let keep: Vec<bool> = param.iter().map(|p| seen.insert(*p)).collect();
    let frame = deduped.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
    let kept: Vec<usize> = keep
        .iter()
        .enumerate()
        .filter_map(|(i, k)| k.then_some(i))
        .collect();

    if kept.len() < 2 {
        return Err(PrepError::DegenerateTrack {
            track_id: track_id.to_string(),
            reason: format!("only {} usable points after deduplication", kept.len()),
        });
    }

    let xs: Vec<f64> = kept.iter().map(|&i| param[i] as f64).collect();
    for i in 1..xs.len() {
        if xs[i] <= xs[i - 1] {
            return Err(PrepError::DegenerateTrack {
                track_id: track_id.to_string(),
                reason: "interpolation parameter is not strictly increasing".to_string(),
            });
        }
    }

    let steps = (xs[xs.len() - 1] - xs[0]) as usize;
    let mut grid = linspace(xs[0], xs[xs.len() - 1], steps);
    if options.mode == StepMode::Meters {
        for value in &mut grid {
            *value = value.trunc();
        }
    }
    let generated = grid.len();

    let source_seconds: Vec<f64> = kept.iter().map(|&i| times[i] as f64).collect();
    let grid_seconds = interp1d(&xs, &source_seconds, &grid)?;

    let lngs = float_values(&frame, COL_LNG)?;
    let lats = float_values(&frame, COL_LAT)?;
    let (new_lngs, new_lats) = CoordCurve::new(&xs, &lngs, &lats)?.sample(&grid)?;

    let reconstruct_time = options.mode == StepMode::Seconds || options.reconstruct_time;

    let mut rng = rand::rng();
    let ids: Vec<String> = (0..generated).map(|_| random_point_id(&mut rng)).collect();

    let mut columns: Vec<Column> = Vec::with_capacity(4 + value_cols.len() + replicated.len());
    columns.push(Series::new(COL_ID.into(), ids).into_column());
    if reconstruct_time {
        let stamps = grid_seconds
            .iter()
            .map(|&secs| time::epoch_seconds_to_timestamp(secs))
            .collect::<PrepResult<Vec<String>>>()?;
        columns.push(Series::new(COL_TIME.into(), stamps).into_column());
    }
    columns.push(to_series(COL_LNG, new_lngs).into_column());
    columns.push(to_series(COL_LAT, new_lats).into_column());

    for name in value_cols {
        let values = float_values(&frame, name)?;
        let interpolated = interp1d(&xs, &values, &grid)?;
        columns.push(to_series(name, interpolated).into_column());
    }
    for name in replicated {
        let column = schema::column(&frame, name)?;
        columns.push(broadcast_column(column, generated)?.into_column());
    }

    Ok(DataFrame::new(columns)?)
}

/// Removes rows repeating an earlier `(lng, lat)` pair, keeping the last
/// occurrence. Rows with a missing coordinate are never considered equal.
fn dedup_coordinates(df: &DataFrame) -> PrepResult<DataFrame> {
    let lngs = schema::float_column(df, COL_LNG)?;
    let lats = schema::float_column(df, COL_LAT)?;

    let mut last_seen: HashMap<(u64, u64), usize> = HashMap::new();
    for i in 0..df.height() {
        if let (Some(lng), Some(lat)) = (lngs.get(i), lats.get(i)) {
            last_seen.insert((lng.to_bits(), lat.to_bits()), i);
        }
    }

    let keep: Vec<bool> = (0..df.height())
        .map(|i| match (lngs.get(i), lats.get(i)) {
            (Some(lng), Some(lat)) => last_seen[&(lng.to_bits(), lat.to_bits())] == i,
            _ => true,
        })
        .collect();
    Ok(df.filter(&BooleanChunked::from_slice("keep".into(), &keep))?)
}

/// Cumulative traveled distance in step units, truncated to integers:
/// `speed/3.6 * elapsed_seconds / step_precision`, summed over the track.
fn cumulative_distance(
    track_id: &str,
    df: &DataFrame,
    times: &[i64],
    options: &ResampleOptions,
) -> PrepResult<Vec<i64>> {
    let speeds = schema::float_column(df, SPEED_COLUMN)?;
    let step = if options.step_precision == 1 { 1.0 } else { 10.0 };

    let mut cumulative = 0.0;
    let mut param = Vec::with_capacity(times.len());
    for i in 0..times.len() {
        let elapsed = if i == 0 {
            0.0
        } else {
            (times[i] - times[i - 1]) as f64
        };
        let speed = speeds.get(i).ok_or_else(|| PrepError::DegenerateTrack {
            track_id: track_id.to_string(),
            reason: format!("missing {SPEED_COLUMN} at point {i}"),
        })?;
        cumulative += speed / 3.6 * elapsed / step;
        param.push(cumulative.trunc() as i64);
    }
    Ok(param)
}

/// Evenly spaced values from `start` to `stop` inclusive, numpy-linspace
/// semantics: one point yields `start`.
fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut out: Vec<f64> = (0..num).map(|i| start + step * i as f64).collect();
            out[num - 1] = stop;
            out
        }
    }
}

fn float_values(df: &DataFrame, name: &str) -> PrepResult<Vec<f64>> {
    Ok(schema::float_column(df, name)?
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect())
}

fn to_series(name: &str, values: Vec<f64>) -> Series {
    let nullable: Vec<Option<f64>> = values
        .into_iter()
        .map(|v| if v.is_nan() { None } else { Some(v) })
        .collect();
    Series::new(name.into(), nullable)
}

/// Broadcasts a column's first observed value across `len` generated rows.
fn broadcast_column(column: &Column, len: usize) -> PrepResult<Series> {
    let value = column.get(0)?;
    let name = column.name().clone();
    let series = match value {
        AnyValue::Null => Series::full_null(name, len, column.dtype()),
        AnyValue::String(v) => Series::new(name, vec![v.to_string(); len]),
        AnyValue::StringOwned(v) => Series::new(name, vec![v.to_string(); len]),
        AnyValue::Float64(v) => Series::new(name, vec![v; len]),
        AnyValue::Float32(v) => Series::new(name, vec![v; len]),
        AnyValue::Int64(v) => Series::new(name, vec![v; len]),
        AnyValue::Int32(v) => Series::new(name, vec![v; len]),
        AnyValue::Boolean(v) => Series::new(name, vec![v; len]),
        other => {
            return Err(PrepError::ColumnType {
                column: column.name().to_string(),
                expected: "replicable scalar".to_string(),
                actual: format!("{other:?}"),
            })
        }
    };
    Ok(series)
}

fn random_point_id(rng: &mut impl Rng) -> String {
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_matches_numpy() {
        assert_eq!(linspace(0.0, 10.0, 1), vec![0.0]);
        let grid = linspace(0.0, 10.0, 10);
        assert_eq!(grid.len(), 10);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[9], 10.0);
        assert!((grid[1] - 10.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_random_point_id_shape() {
        let mut rng = rand::rng();
        let id = random_point_id(&mut rng);
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_dedup_coordinates_keeps_last() {
        let df = df!(
            "lng" => [1.0, 1.0, 2.0],
            "lat" => [5.0, 5.0, 6.0],
            "Speed.value" => [10.0, 20.0, 30.0],
        )
        .unwrap();
        let out = dedup_coordinates(&df).unwrap();
        assert_eq!(out.height(), 2);
        let speeds = out.column("Speed.value").unwrap().f64().unwrap();
        assert_eq!(speeds.get(0), Some(20.0));
        assert_eq!(speeds.get(1), Some(30.0));
    }

    #[test]
    fn test_dedup_keeps_rows_with_missing_coordinates() {
        let df = df!(
            "lng" => [Some(1.0), None, None],
            "lat" => [Some(5.0), Some(5.0), Some(5.0)],
        )
        .unwrap();
        let out = dedup_coordinates(&df).unwrap();
        assert_eq!(out.height(), 3);
    }
}
