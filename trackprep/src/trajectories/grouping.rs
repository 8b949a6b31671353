//! Track grouping: partitioning the point table by track identifier.
//!
//! Every grouped computation (fences per track, kinematic derivation,
//! resampling, scaling) goes through this module so that group order is
//! deterministic: groups come out sorted by track identifier, and rows within
//! a group keep their original order. Order-sensitive work sorts each group by
//! timestamp first via [`sort_by_time`].

use std::collections::BTreeMap;

use polars::prelude::*;

use crate::core::error::{PrepError, PrepResult};
use crate::core::schema::{self, COL_TRACK_ID};
use crate::time;

/// Row indices per track, sorted by track identifier.
///
/// Rows with a null track identifier belong to no group and are skipped, like
/// a grouped operation would drop them upstream.
pub fn group_indices(df: &DataFrame) -> PrepResult<BTreeMap<String, Vec<IdxSize>>> {
    let ids = schema::str_column(df, COL_TRACK_ID)?;
    let mut groups: BTreeMap<String, Vec<IdxSize>> = BTreeMap::new();
    let mut dropped = 0usize;
    for (row, id) in ids.into_iter().enumerate() {
        match id {
            Some(id) => groups
                .entry(id.to_string())
                .or_default()
                .push(row as IdxSize),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        log::warn!("{dropped} points without a track identifier left out of grouping");
    }
    Ok(groups)
}

/// Partitions the table into per-track frames, sorted by track identifier.
pub fn group_by_track(df: &DataFrame) -> PrepResult<Vec<(String, DataFrame)>> {
    let mut tracks = Vec::new();
    for (track_id, rows) in group_indices(df)? {
        let idx = IdxCa::from_vec("idx".into(), rows);
        tracks.push((track_id, df.take(&idx)?));
    }
    Ok(tracks)
}

/// The sorted list of distinct track identifiers.
pub fn track_ids(df: &DataFrame) -> PrepResult<Vec<String>> {
    Ok(group_indices(df)?.into_keys().collect())
}

/// Number of distinct tracks in the table.
pub fn count_tracks(df: &DataFrame) -> PrepResult<usize> {
    Ok(group_indices(df)?.len())
}

/// The subsequence of points belonging to one track.
pub fn get_single_track(df: &DataFrame, track_id: &str) -> PrepResult<DataFrame> {
    let mut groups = group_indices(df)?;
    let rows = groups
        .remove(track_id)
        .ok_or_else(|| PrepError::TrackNotFound(track_id.to_string()))?;
    let idx = IdxCa::from_vec("idx".into(), rows);
    Ok(df.take(&idx)?)
}

/// Stable sort of a frame by parsed timestamp.
pub fn sort_by_time(df: &DataFrame) -> PrepResult<DataFrame> {
    let seconds = time::parse_time_column(df)?;
    let mut order: Vec<IdxSize> = (0..df.height() as IdxSize).collect();
    order.sort_by_key(|&i| (seconds[i as usize], i));
    let idx = IdxCa::from_vec("idx".into(), order);
    Ok(df.take(&idx)?)
}

/// Concatenates per-track frames back into one table.
///
/// An empty input yields an empty frame (every track skipped).
pub fn concat_tracks(frames: Vec<DataFrame>) -> PrepResult<DataFrame> {
    let mut iter = frames.into_iter();
    let Some(mut combined) = iter.next() else {
        return Ok(DataFrame::empty());
    };
    for frame in iter {
        combined = combined.vstack(&frame)?;
    }
    Ok(combined)
}
