//! Slicing tracks by elapsed time.

use polars::prelude::*;

use crate::core::error::PrepResult;
use crate::time;
use crate::trajectories::grouping;

/// Elapsed seconds relative to the track's first point, emitted by
/// [`split_by_time`].
pub const SECONDS_SINCE_START_COLUMN: &str = "Seconds since start";

/// Keeps the part of every track strictly between `start_secs` and
/// `end_secs`, measured from the track's first timestamp.
///
/// The output carries a `Seconds since start` column and concatenates tracks
/// in track-identifier-sorted order.
pub fn split_by_time(df: &DataFrame, start_secs: i64, end_secs: i64) -> PrepResult<DataFrame> {
    let mut frames = Vec::new();
    for (_, group) in grouping::group_by_track(df)? {
        let sorted = grouping::sort_by_time(&group)?;
        let seconds = time::parse_time_column(&sorted)?;
        let start = seconds[0];
        let relative: Vec<i64> = seconds.iter().map(|s| s - start).collect();
        let keep: Vec<bool> = relative
            .iter()
            .map(|&r| r > start_secs && r < end_secs)
            .collect();

        let mut filtered = sorted.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
        let kept_relative: Vec<i64> = relative
            .iter()
            .zip(&keep)
            .filter_map(|(&r, &k)| k.then_some(r))
            .collect();
        filtered.with_column(Series::new(SECONDS_SINCE_START_COLUMN.into(), kept_relative))?;
        frames.push(filtered);
    }
    grouping::concat_tracks(frames)
}
