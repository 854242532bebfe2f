//! Descriptive statistics over numeric collections.
//!
//! ## Conventions
//! - `std` and `variance` are *population* statistics (divide by `count`).
//!   Multiply the variance by `count / (count - 1)` for the sample estimate.
//! - The mode is the most frequent value; when several values share the top
//!   frequency the smallest one is reported and `mode_is_unique` is false.
//! - Values are compared exactly, so `3.0` and `3.0000001` are different values.

use crate::error::{Result, StatsError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Summary of one snapshot of values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatSummary {
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    /// False when `mode` was picked by the smallest-value tie-break
    pub mode_is_unique: bool,
    /// Population standard deviation
    pub std: f64,
    /// Population variance
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Compute a `StatSummary`.
///
/// Fails with `EmptyInput` for an empty slice and `NonFiniteValue` for NaN or
/// infinite entries.
pub fn summarize(values: &[f64]) -> Result<StatSummary> {
    let sorted = sorted_finite(values)?;
    let count = sorted.len();
    let n = count as f64;

    let min = sorted[0];
    let max = sorted[count - 1];
    // Clamp keeps rounding from pushing the mean of identical values past them
    let mean = (sorted.iter().sum::<f64>() / n).clamp(min, max);

    let median = if count % 2 == 1 {
        sorted[count / 2]
    } else {
        let (lo, hi) = (sorted[count / 2 - 1], sorted[count / 2]);
        lo + (hi - lo) / 2.0
    };

    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let (mode, mode_is_unique) = mode_of_sorted(&sorted);

    Ok(StatSummary {
        mean,
        median,
        mode,
        mode_is_unique,
        std: variance.sqrt(),
        variance,
        min,
        max,
        count,
    })
}

/// Copy, validate and sort ascending
fn sorted_finite(values: &[f64]) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    ensure_finite(values)?;
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}

/// First NaN or infinity, reported with its position
fn ensure_finite(values: &[f64]) -> Result<()> {
    match values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(StatsError::NonFiniteValue { index, value }),
        None => Ok(()),
    }
}

/// Most frequent value of a sorted, non-empty slice, smallest first on ties
fn mode_of_sorted(sorted: &[f64]) -> (f64, bool) {
    let mut best = sorted[0];
    let mut best_count = 0usize;
    let mut tied = false;

    for run in sorted.chunk_by(|a, b| a == b) {
        match run.len().cmp(&best_count) {
            Ordering::Greater => {
                best = run[0];
                best_count = run.len();
                tied = false;
            }
            Ordering::Equal => tied = true,
            Ordering::Less => {}
        }
    }
    (best, !tied)
}

// =============================================================================
// Buckets
// =============================================================================

/// Count of values falling in `[lower, upper)` (the last bucket also includes `upper`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketCount {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Count values into the buckets described by `boundaries`.
///
/// `n` boundaries describe `n - 1` buckets, returned in boundary order and
/// labelled `"lower-upper"`. Values below the first or above the last boundary
/// are not counted. Fails with `InvalidBoundary` unless there are at least two
/// finite, strictly increasing boundaries, and with `NonFiniteValue` for NaN or
/// infinite values.
pub fn bucket(values: &[f64], boundaries: &[f64]) -> Result<Vec<BucketCount>> {
    if boundaries.len() < 2 {
        return Err(StatsError::InvalidBoundary {
            reason: format!("need at least 2 boundaries, got {}", boundaries.len()),
        });
    }
    if let Some(b) = boundaries.iter().find(|b| !b.is_finite()) {
        return Err(StatsError::InvalidBoundary {
            reason: format!("non-finite boundary {}", b),
        });
    }
    if let Some(pair) = boundaries.windows(2).find(|w| w[0] >= w[1]) {
        return Err(StatsError::InvalidBoundary {
            reason: format!("{} is not below {}", pair[0], pair[1]),
        });
    }

    ensure_finite(values)?;

    let mut buckets: Vec<BucketCount> = boundaries
        .windows(2)
        .map(|w| BucketCount {
            label: format!("{}-{}", w[0], w[1]),
            lower: w[0],
            upper: w[1],
            count: 0,
        })
        .collect();

    let last = buckets.len() - 1;
    for &v in values {
        // First boundary strictly greater than v
        let idx = boundaries.partition_point(|&b| b <= v);
        let slot = match idx {
            0 => None,
            i if i < boundaries.len() => Some(i - 1),
            // v >= final boundary: only the exact upper edge is counted
            _ if v == boundaries[last + 1] => Some(last),
            _ => None,
        };
        if let Some(slot) = slot {
            buckets[slot].count += 1;
        }
    }

    let counted: usize = buckets.iter().map(|b| b.count).sum();
    debug!(
        "Bucketed {} values into {} buckets, {} outside the boundaries",
        counted,
        buckets.len(),
        values.len() - counted
    );
    Ok(buckets)
}

/// Whole-star rating buckets used for distribution displays
pub const RATING_BOUNDARIES: [f64; 6] = [0.5, 1.5, 2.5, 3.5, 4.5, 5.0];

/// Distribution of star ratings over `RATING_BOUNDARIES`
pub fn rating_distribution(stars: &[f64]) -> Result<Vec<BucketCount>> {
    bucket(stars, &RATING_BOUNDARIES)
}

// =============================================================================
// Other helpers
// =============================================================================

/// Percentile rank of `score` within `values`, in [0, 100].
///
/// Ties count half: the result averages the share strictly below and the share
/// at or below `score`. A NaN or infinite `score` fails with `NonFiniteScore`.
pub fn percentile_of_score(values: &[f64], score: f64) -> Result<f64> {
    if !score.is_finite() {
        return Err(StatsError::NonFiniteScore(score));
    }
    let sorted = sorted_finite(values)?;
    let n = sorted.len() as f64;
    let below = sorted.partition_point(|&v| v < score) as f64;
    let at_or_below = sorted.partition_point(|&v| v <= score) as f64;
    let extra = if at_or_below > below { 1.0 } else { 0.0 };
    Ok((below + at_or_below + extra) * 50.0 / n)
}

/// Weighted rating: `v/(v+m) * R + m/(v+m) * C`.
///
/// Pulls the average of thinly-voted items toward the global mean `C`. Returns
/// 0.0 when both `vote_count` and `min_votes` are zero.
pub fn weighted_rating(
    vote_count: u64,
    vote_average: f64,
    min_votes: u64,
    mean_rating: f64,
) -> f64 {
    let v = vote_count as f64;
    let m = min_votes as f64;
    if v + m == 0.0 {
        return 0.0;
    }
    (v / (v + m)) * vote_average + (m / (v + m)) * mean_rating
}

/// Root mean square error between paired slices
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_pairs(actual, predicted)?;
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    Ok(mse.sqrt())
}

/// Pearson correlation coefficient of paired samples, in [-1, 1].
///
/// Needs at least two pairs and fails with `ZeroVariance` when either side is
/// constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    check_pairs(x, y)?;
    if x.len() < 2 {
        return Err(StatsError::TooFewValues {
            required: 2,
            actual: x.len(),
        });
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mean_x, b - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return Err(StatsError::ZeroVariance);
    }
    Ok((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Equal length, non-empty and finite on both sides
fn check_pairs(left: &[f64], right: &[f64]) -> Result<()> {
    if left.len() != right.len() {
        return Err(StatsError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    if left.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    ensure_finite(left)?;
    ensure_finite(right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_summarize_reference_values() {
        let s = summarize(&[3.0, 3.0, 3.0, 5.0, 5.0]).unwrap();
        assert!(approx(s.mean, 3.8));
        assert_eq!(s.median, 3.0);
        assert_eq!(s.mode, 3.0);
        assert!(s.mode_is_unique);
        assert_eq!(s.count, 5);
        assert_eq!(s.min, 3.0);
        assert_eq!(s.max, 5.0);
    }

    #[test]
    fn test_mode_tie_breaks_to_smallest() {
        let s = summarize(&[2.0, 1.0, 2.0, 1.0]).unwrap();
        assert_eq!(s.mode, 1.0);
        assert!(!s.mode_is_unique);

        let all_distinct = summarize(&[4.0, 2.0, 3.0]).unwrap();
        assert_eq!(all_distinct.mode, 2.0);
        assert!(!all_distinct.mode_is_unique);
    }

    #[test]
    fn test_even_median_is_midpoint() {
        let s = summarize(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.median, 2.5);
    }

    #[test]
    fn test_std_is_population() {
        // Population variance of [2,4,4,4,5,5,7,9] is exactly 4; sample would be 32/7
        let s = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(approx(s.mean, 5.0));
        assert!(approx(s.variance, 4.0));
        assert!(approx(s.std, 2.0));
        assert!(!approx(s.variance, 32.0 / 7.0));
    }

    #[test]
    fn test_single_value() {
        let s = summarize(&[4.5]).unwrap();
        assert_eq!((s.mean, s.median, s.mode, s.std), (4.5, 4.5, 4.5, 0.0));
        assert!(s.mode_is_unique);
    }

    #[test]
    fn test_empty_and_non_finite_inputs_fail() {
        assert_eq!(summarize(&[]), Err(StatsError::EmptyInput));
        assert!(matches!(
            summarize(&[1.0, f64::NAN]),
            Err(StatsError::NonFiniteValue { index: 1, .. })
        ));
    }

    #[test]
    fn test_order_statistics_bound_mean_and_median() {
        let inputs: [&[f64]; 5] = [
            &[0.1, 0.1, 0.1],
            &[5.0, 0.5, 2.5, 2.5],
            &[1e-9, 1e9],
            &[-3.0, -2.0, 10.0, 0.0, 0.0],
            &[0.7; 11],
        ];
        for values in inputs {
            let s = summarize(values).unwrap();
            assert!(s.min <= s.mean && s.mean <= s.max, "{:?}", values);
            assert!(s.min <= s.median && s.median <= s.max, "{:?}", values);
        }
    }

    #[test]
    fn test_bucket_counts() {
        let buckets = bucket(&[0.0, 1.0, 1.5, 2.0, 3.0, 3.5], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].label, "1-2");
        assert_eq!(buckets[0].count, 2); // 1.0, 1.5
        assert_eq!(buckets[1].label, "2-3");
        assert_eq!(buckets[1].count, 2); // 2.0, 3.0 (closed upper edge)
    }

    #[test]
    fn test_bucket_rejects_bad_boundaries() {
        assert!(matches!(bucket(&[1.0], &[1.0, 1.0]), Err(StatsError::InvalidBoundary { .. })));
        assert!(matches!(bucket(&[1.0], &[2.0, 1.0]), Err(StatsError::InvalidBoundary { .. })));
        assert!(matches!(bucket(&[1.0], &[1.0]), Err(StatsError::InvalidBoundary { .. })));
        assert!(matches!(
            bucket(&[1.0], &[0.0, f64::INFINITY]),
            Err(StatsError::InvalidBoundary { .. })
        ));
    }

    #[test]
    fn test_rating_distribution() {
        let dist = rating_distribution(&[0.5, 1.0, 4.5, 5.0, 5.0, 3.0]).unwrap();
        let counts: Vec<usize> = dist.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 0, 1, 0, 3]);
        assert_eq!(dist[4].label, "4.5-5");
    }

    #[test]
    fn test_percentile_of_score() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(percentile_of_score(&values, 3.0).unwrap(), 75.0));
        assert!(approx(percentile_of_score(&values, 0.0).unwrap(), 0.0));
        assert!(approx(percentile_of_score(&values, 10.0).unwrap(), 100.0));
        assert_eq!(percentile_of_score(&[], 1.0), Err(StatsError::EmptyInput));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        assert!(matches!(
            bucket(&[1.0, f64::NAN, f64::INFINITY], &[0.0, 2.0]),
            Err(StatsError::NonFiniteValue { index: 1, .. })
        ));
        assert!(matches!(
            rmse(&[1.0, f64::NAN], &[1.0, 2.0]),
            Err(StatsError::NonFiniteValue { index: 1, .. })
        ));
        assert!(matches!(
            rmse(&[1.0, 2.0], &[f64::NEG_INFINITY, 2.0]),
            Err(StatsError::NonFiniteValue { index: 0, .. })
        ));
        assert!(matches!(
            percentile_of_score(&[1.0, 2.0], f64::NAN),
            Err(StatsError::NonFiniteScore(_))
        ));
        assert!(matches!(
            pearson(&[1.0, 2.0, 3.0], &[1.0, f64::NAN, 3.0]),
            Err(StatsError::NonFiniteValue { index: 1, .. })
        ));
    }

    #[test]
    fn test_weighted_rating() {
        assert_eq!(weighted_rating(0, 4.0, 0, 3.0), 0.0);
        assert!(approx(weighted_rating(10, 4.0, 10, 3.0), 3.5));
        assert!(approx(weighted_rating(90, 5.0, 10, 3.0), 4.8));
    }

    #[test]
    fn test_rmse() {
        assert!(approx(rmse(&[1.0, 2.0], &[1.0, 4.0]).unwrap(), 2.0_f64.sqrt()));
        assert_eq!(rmse(&[1.0], &[]), Err(StatsError::LengthMismatch { left: 1, right: 0 }));
        assert_eq!(rmse(&[], &[]), Err(StatsError::EmptyInput));
    }

    #[test]
    fn test_pearson() {
        assert!(approx(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap(), 1.0));
        assert!(approx(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap(), -1.0));
        // x = [1,2,3,4], y = [1,3,2,4]: cov 4, var_x 5, var_y 5
        assert!(approx(pearson(&[1.0, 2.0, 3.0, 4.0], &[1.0, 3.0, 2.0, 4.0]).unwrap(), 0.8));
    }

    #[test]
    fn test_pearson_rejects_degenerate_input() {
        assert_eq!(
            pearson(&[1.0, 2.0], &[1.0]),
            Err(StatsError::LengthMismatch { left: 2, right: 1 })
        );
        assert_eq!(pearson(&[], &[]), Err(StatsError::EmptyInput));
        assert_eq!(
            pearson(&[1.0], &[2.0]),
            Err(StatsError::TooFewValues { required: 2, actual: 1 })
        );
        assert_eq!(pearson(&[1.0, 2.0], &[5.0, 5.0]), Err(StatsError::ZeroVariance));
    }
}
