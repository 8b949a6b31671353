//! Missing-value inspection and filling.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::error::PrepResult;
use crate::core::schema;
use crate::trajectories::grouping;

/// Missing-value counts for one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMissing {
    pub column: String,
    pub missing: usize,
    pub missing_pct: f64,
}

/// Missing-value counts per continuous column within one track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMissing {
    pub track_id: String,
    pub columns: Vec<ColumnMissing>,
}

/// Per-column missing counts and percentages over the whole table.
///
/// Columns more than 80% missing are left out (they carry no usable signal
/// and would swamp the listing); the rest sort descending by missing count.
pub fn missing_value_summary(df: &DataFrame) -> Vec<ColumnMissing> {
    let rows = df.height();
    if rows == 0 {
        return Vec::new();
    }
    let mut summary: Vec<ColumnMissing> = df
        .get_columns()
        .iter()
        .filter_map(|column| {
            let missing = column.null_count();
            let missing_pct = missing as f64 / rows as f64 * 100.0;
            (missing_pct <= 80.0).then(|| ColumnMissing {
                column: column.name().to_string(),
                missing,
                missing_pct,
            })
        })
        .collect();
    summary.sort_by(|a, b| b.missing.cmp(&a.missing));
    summary
}

/// Missing counts and proportions of every continuous field, per track.
pub fn missing_values_per_track(df: &DataFrame) -> PrepResult<Vec<TrackMissing>> {
    let variables = schema::continuous_columns(df);
    let mut tracks = Vec::new();
    for (track_id, rows) in grouping::group_indices(df)? {
        let mut columns = Vec::with_capacity(variables.len());
        for variable in &variables {
            let values = schema::float_column(df, variable)?;
            let missing = rows
                .iter()
                .filter(|&&row| values.get(row as usize).is_none())
                .count();
            columns.push(ColumnMissing {
                column: variable.clone(),
                missing,
                missing_pct: missing as f64 / rows.len() as f64 * 100.0,
            });
        }
        tracks.push(TrackMissing { track_id, columns });
    }
    Ok(tracks)
}

/// Fills missing continuous values from the nearest observed value by row
/// index, covering leading and trailing gaps; ties prefer the earlier
/// neighbor. All-missing columns are left unchanged.
pub fn fill_missing_nearest(df: &DataFrame) -> PrepResult<DataFrame> {
    let variables = schema::continuous_columns(df);
    let mut out = df.clone();
    for variable in &variables {
        let filled: Vec<Option<f64>> = {
            let values = schema::float_column(&out, variable)?;
            let present: Vec<(usize, f64)> = values
                .into_iter()
                .enumerate()
                .filter_map(|(row, value)| value.map(|v| (row, v)))
                .collect();
            if present.is_empty() {
                continue;
            }
            (0..values.len())
                .map(|row| match values.get(row) {
                    Some(v) => Some(v),
                    None => Some(nearest_value(&present, row)),
                })
                .collect()
        };
        out.with_column(Series::new(variable.into(), filled))?;
    }
    Ok(out)
}

fn nearest_value(present: &[(usize, f64)], row: usize) -> f64 {
    let insertion = present.partition_point(|&(p, _)| p < row);
    let before = insertion.checked_sub(1).map(|i| present[i]);
    let after = present.get(insertion).copied();
    match (before, after) {
        (Some((before_row, before_value)), Some((after_row, after_value))) => {
            if row - before_row <= after_row - row {
                before_value
            } else {
                after_value
            }
        }
        (Some((_, before_value)), None) => before_value,
        (None, Some((_, after_value))) => after_value,
        // caller guarantees at least one observed value
        (None, None) => f64::NAN,
    }
}

/// Drops every `.unit` column, reporting which were removed.
pub fn drop_unit_columns(df: &DataFrame) -> PrepResult<(DataFrame, Vec<String>)> {
    let units = schema::unit_columns(df);
    let mut out = df.clone();
    for name in &units {
        out = out.drop(name)?;
    }
    log::info!("dropped unit columns: {units:?}");
    Ok((out, units))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_sorted_and_capped() {
        let df = df!(
            "mostly_missing" => [None::<f64>, None, None, None, Some(1.0)],
            "some_missing" => [Some(1.0), None, Some(3.0), None, Some(5.0)],
            "complete" => [1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();
        let summary = missing_value_summary(&df);
        // 80% missing is still listed, sorted descending
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].column, "mostly_missing");
        assert_eq!(summary[0].missing, 4);
        assert_eq!(summary[1].column, "some_missing");
        assert_eq!(summary[2].missing, 0);

        let df = df!(
            "gone" => [None::<f64>, None, None, None, None],
            "kept" => [Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)],
        )
        .unwrap();
        let summary = missing_value_summary(&df);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].column, "kept");
    }

    #[test]
    fn test_missing_per_track() {
        let df = df!(
            "track.id" => ["a", "a", "b", "b"],
            "Speed.value" => [Some(1.0), None, Some(3.0), Some(4.0)],
        )
        .unwrap();
        let tracks = missing_values_per_track(&df).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].track_id, "a");
        assert_eq!(tracks[0].columns[0].missing, 1);
        assert_eq!(tracks[0].columns[0].missing_pct, 50.0);
        assert_eq!(tracks[1].columns[0].missing, 0);
    }

    #[test]
    fn test_fill_nearest_with_edges_and_ties() {
        let df = df!(
            "track.id" => vec!["t"; 6],
            "Speed.value" => [None, Some(2.0), None, Some(4.0), None, None],
        )
        .unwrap();
        let out = fill_missing_nearest(&df).unwrap();
        let filled: Vec<Option<f64>> = out
            .column("Speed.value")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        // row 2 is equidistant from rows 1 and 3: the earlier neighbor wins
        assert_eq!(
            filled,
            vec![
                Some(2.0),
                Some(2.0),
                Some(2.0),
                Some(4.0),
                Some(4.0),
                Some(4.0)
            ]
        );
    }

    #[test]
    fn test_fill_leaves_all_missing_column_alone() {
        let df = df!(
            "track.id" => ["t", "t"],
            "Speed.value" => [None::<f64>, None],
        )
        .unwrap();
        let out = fill_missing_nearest(&df).unwrap();
        assert_eq!(out.column("Speed.value").unwrap().null_count(), 2);
    }

    #[test]
    fn test_drop_unit_columns() {
        let df = df!(
            "Speed.value" => [1.0],
            "Speed.unit" => ["km/h"],
            "CO2.unit" => ["kg/h"],
        )
        .unwrap();
        let (out, dropped) = drop_unit_columns(&df).unwrap();
        assert_eq!(dropped, vec!["Speed.unit".to_string(), "CO2.unit".to_string()]);
        assert!(out.column("Speed.unit").is_err());
        assert!(out.column("Speed.value").is_ok());
    }
}
