//! Sample statistics and robust dispersion fences.
//!
//! Quantiles use linear interpolation between order statistics (the standard
//! percentile definition) over the non-missing values only. The outlier
//! detector builds its fences from the 10th/90th percentiles with a 1.5 IQR
//! margin, per <https://www.itl.nist.gov/div898/handbook/prc/section1/prc16.htm>.

use serde::{Deserialize, Serialize};

/// Quantile used as the lower fence anchor (Q1).
pub const FENCE_Q1: f64 = 0.10;
/// Quantile used as the upper fence anchor (Q3).
pub const FENCE_Q3: f64 = 0.90;
/// IQR multiplier for both fences.
pub const FENCE_MARGIN: f64 = 1.5;

/// Summary statistics for a set of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
}

/// Compute count, mean, median, population std dev, min, max and sum.
pub fn compute_stats(values: &[f64]) -> SampleStats {
    if values.is_empty() {
        return SampleStats {
            count: 0,
            mean: 0.0,
            median: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
            sum: 0.0,
        };
    }

    let count = values.len();
    let sum: f64 = values.iter().sum();
    let mean = sum / count as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };

    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / count as f64;
    let std_dev = variance.sqrt();

    let min = sorted.first().copied().unwrap_or(0.0);
    let max = sorted.last().copied().unwrap_or(0.0);

    SampleStats {
        count,
        mean,
        median,
        std_dev,
        min,
        max,
        sum,
    }
}

/// Quantile with linear interpolation between order statistics.
///
/// Non-finite values are skipped; returns `None` for an empty sample.
///
/// # Examples
///
/// ```
/// use trackprep::stats::quantile;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(quantile(&values, 0.5), Some(3.0));
/// assert_eq!(quantile(&values, 0.25), Some(2.0));
/// assert_eq!(quantile(&[], 0.5), None);
/// ```
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    if n == 1 {
        return Some(sorted[0]);
    }
    let position = (n - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// IQR fence interval for outlier detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fences {
    pub q1: f64,
    pub q3: f64,
    pub low: f64,
    pub high: f64,
}

/// Fences from the 10th/90th percentiles with a 1.5 IQR margin.
///
/// Returns `None` when the sample has no usable values. With a constant
/// sample the fence collapses to a single value; strict comparisons against
/// it flag nothing.
pub fn iqr_fences(values: &[f64]) -> Option<Fences> {
    let q1 = quantile(values, FENCE_Q1)?;
    let q3 = quantile(values, FENCE_Q3)?;
    let iqr = q3 - q1;
    Some(Fences {
        q1,
        q3,
        low: q1 - FENCE_MARGIN * iqr,
        high: q3 + FENCE_MARGIN * iqr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_stats() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = compute_stats(&values);

        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.sum, 15.0);
        assert!((stats.std_dev - std::f64::consts::SQRT_2).abs() < 0.001);
    }

    #[test]
    fn test_compute_stats_empty() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean, 0.0);
    }

    #[test]
    fn test_quantile_interpolates() {
        // position = 9 * 0.1 = 0.9 -> between 1.0 and 2.0
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let q = quantile(&values, 0.10).unwrap();
        assert!((q - 1.9).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_single_value() {
        assert_eq!(quantile(&[7.5], 0.10), Some(7.5));
        assert_eq!(quantile(&[7.5], 0.90), Some(7.5));
    }

    #[test]
    fn test_quantile_skips_nan() {
        let values = [f64::NAN, 1.0, 2.0, 3.0];
        assert_eq!(quantile(&values, 0.5), Some(2.0));
    }

    #[test]
    fn test_fences_constant_sample_collapse() {
        let fences = iqr_fences(&[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(fences.low, 4.0);
        assert_eq!(fences.high, 4.0);
    }

    #[test]
    fn test_fences_empty() {
        assert!(iqr_fences(&[]).is_none());
    }
}
