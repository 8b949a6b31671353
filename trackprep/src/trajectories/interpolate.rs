//! Piecewise-linear interpolation primitives for the resampler.
//!
//! The interpolation parameter (cumulative distance or elapsed seconds) must
//! be strictly increasing; the resampler guarantees that by deduplicating
//! repeated parameter values before calling in here. NaN measurement values
//! propagate through the segment they touch, the way a nulled-out reading
//! should: the surrounding steps come out NaN and are re-nulled downstream.

use crate::core::error::{PrepError, PrepResult};

fn check_monotonic(xs: &[f64]) -> PrepResult<()> {
    if xs.len() < 2 {
        return Err(PrepError::TooFewPoints(xs.len()));
    }
    for i in 1..xs.len() {
        if xs[i] <= xs[i - 1] {
            return Err(PrepError::NonMonotonicParameter(i));
        }
    }
    Ok(())
}

/// 1-D piecewise-linear interpolation of `ys` over `xs`, sampled at `grid`.
///
/// `xs` must be strictly increasing and `grid` values must lie inside
/// `[xs[0], xs[last]]` (the resampler's step grid always does).
pub fn interp1d(xs: &[f64], ys: &[f64], grid: &[f64]) -> PrepResult<Vec<f64>> {
    check_monotonic(xs)?;
    if xs.len() != ys.len() {
        return Err(PrepError::LengthMismatch {
            xs: xs.len(),
            ys: ys.len(),
        });
    }

    let last_segment = xs.len() - 2;
    let mut out = Vec::with_capacity(grid.len());
    for &x in grid {
        let segment = match xs.partition_point(|&v| v <= x) {
            0 => 0,
            p => (p - 1).min(last_segment),
        };
        let (x0, x1) = (xs[segment], xs[segment + 1]);
        let (y0, y1) = (ys[segment], ys[segment + 1]);
        let t = (x - x0) / (x1 - x0);
        out.push(y0 + (y1 - y0) * t);
    }
    Ok(out)
}

/// A coordinate curve parameterized jointly over one monotonic parameter.
///
/// Longitude and latitude are sampled against the same breakpoints, so the
/// generated path follows the original polyline segment by segment instead of
/// two independently re-gridded axes drifting apart.
pub struct CoordCurve<'a> {
    param: &'a [f64],
    lng: &'a [f64],
    lat: &'a [f64],
}

impl<'a> CoordCurve<'a> {
    pub fn new(param: &'a [f64], lng: &'a [f64], lat: &'a [f64]) -> PrepResult<Self> {
        check_monotonic(param)?;
        if param.len() != lng.len() {
            return Err(PrepError::LengthMismatch {
                xs: param.len(),
                ys: lng.len(),
            });
        }
        if param.len() != lat.len() {
            return Err(PrepError::LengthMismatch {
                xs: param.len(),
                ys: lat.len(),
            });
        }
        Ok(Self { param, lng, lat })
    }

    /// Samples the curve at the given parameter grid.
    pub fn sample(&self, grid: &[f64]) -> PrepResult<(Vec<f64>, Vec<f64>)> {
        let lng = interp1d(self.param, self.lng, grid)?;
        let lat = interp1d(self.param, self.lat, grid)?;
        Ok((lng, lat))
    }
}
