//! Per-track scaling of continuous measurement fields.

use polars::prelude::*;

use crate::core::error::PrepResult;
use crate::core::schema;
use crate::trajectories::grouping;

/// Min-max scales every continuous field within its track: `(x - min) / (max - min)`.
///
/// A group with zero range (or no usable values) scales to missing.
pub fn normalize(df: &DataFrame) -> PrepResult<DataFrame> {
    scale_columns(df, |sample| {
        if sample.is_empty() {
            return None;
        }
        let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
        let max = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some((min, max - min))
    })
}

/// Z-scores every continuous field within its track: `(x - mean) / std`,
/// using the sample standard deviation.
///
/// Groups with fewer than 2 usable values, or zero variance, scale to missing.
pub fn standardize(df: &DataFrame) -> PrepResult<DataFrame> {
    scale_columns(df, |sample| {
        if sample.len() < 2 {
            return None;
        }
        let n = sample.len() as f64;
        let mean = sample.iter().sum::<f64>() / n;
        let variance = sample.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
        Some((mean, variance.sqrt()))
    })
}

fn scale_columns(
    df: &DataFrame,
    stat: impl Fn(&[f64]) -> Option<(f64, f64)>,
) -> PrepResult<DataFrame> {
    let variables = schema::continuous_columns(df);
    let groups = grouping::group_indices(df)?;
    let mut out = df.clone();

    for variable in &variables {
        let scaled: Vec<Option<f64>> = {
            let values = schema::float_column(&out, variable)?;
            // rows outside every group (null track id) keep their value
            let mut scaled: Vec<Option<f64>> = values.into_iter().collect();
            for rows in groups.values() {
                let sample: Vec<f64> = rows
                    .iter()
                    .filter_map(|&row| values.get(row as usize))
                    .collect();
                let params = stat(&sample);
                for &row in rows {
                    let row = row as usize;
                    scaled[row] = match (params, values.get(row)) {
                        (Some((offset, denom)), Some(v)) if denom != 0.0 => {
                            Some((v - offset) / denom)
                        }
                        _ => None,
                    };
                }
            }
            scaled
        };
        out.with_column(Series::new(variable.into(), scaled))?;
    }
    Ok(out)
}
