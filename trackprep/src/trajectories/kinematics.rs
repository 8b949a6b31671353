//! Acceleration derived from consecutive speed/time samples.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::error::PrepResult;
use crate::core::schema;
use crate::time;
use crate::trajectories::grouping;

/// Speed column the derivation reads from.
pub const SPEED_COLUMN: &str = "Speed.value";
/// Acceleration column the derivation writes.
pub const ACCELERATION_COLUMN: &str = "Acceleration.value";

/// Diagnostics for the acceleration stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccelerationReport {
    pub tracks: usize,
    pub points: usize,
}

/// Adds an `Acceleration.value` column derived per track.
///
/// Each track is sorted by timestamp; element 0 is 0 (no prior sample) and
/// element i is `(speed[i] - speed[i-1]) / elapsed_seconds`. A zero elapsed
/// time yields 0 rather than a division fault; a missing speed on either side
/// yields a missing acceleration. The output table is the concatenation of
/// the per-track groups in track-identifier-sorted order.
pub fn derive_acceleration(df: &DataFrame) -> PrepResult<(DataFrame, AccelerationReport)> {
    schema::column(df, SPEED_COLUMN)?;

    let groups = grouping::group_by_track(df)?;
    let tracks = groups.len();
    let mut frames = Vec::with_capacity(tracks);

    for (_, group) in groups {
        let mut sorted = grouping::sort_by_time(&group)?;
        let seconds = time::parse_time_column(&sorted)?;
        let speeds = schema::float_column(&sorted, SPEED_COLUMN)?;

        let mut acceleration: Vec<Option<f64>> = Vec::with_capacity(sorted.height());
        for i in 0..sorted.height() {
            if i == 0 {
                acceleration.push(Some(0.0));
                continue;
            }
            let value = match (speeds.get(i), speeds.get(i - 1)) {
                (Some(current), Some(previous)) => {
                    let elapsed = (seconds[i] - seconds[i - 1]) as f64;
                    if elapsed == 0.0 {
                        Some(0.0)
                    } else {
                        Some((current - previous) / elapsed)
                    }
                }
                _ => None,
            };
            acceleration.push(value);
        }

        sorted.with_column(Series::new(ACCELERATION_COLUMN.into(), acceleration))?;
        frames.push(sorted);
    }

    let combined = grouping::concat_tracks(frames)?;
    let report = AccelerationReport {
        tracks,
        points: combined.height(),
    };
    log::info!(
        "derived acceleration for {} points across {} tracks",
        report.points,
        report.tracks
    );
    Ok((combined, report))
}
