//! Chart-ready series for external rendering.
//!
//! Every builder is a pure function returning `(label, value)` points in the
//! order they should be drawn.

use crate::stats::{BucketCount, StatSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One bar / slice / point of a chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint<V> {
    pub label: String,
    pub value: V,
}

impl<V> SeriesPoint<V> {
    pub fn new(label: impl Into<String>, value: V) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Top `top_k` labels by count, descending, ties broken by label ascending.
///
/// Repeated labels in the input are summed.
pub fn build_series<I, S>(labeled_counts: I, top_k: usize) -> Vec<SeriesPoint<usize>>
where
    I: IntoIterator<Item = (S, usize)>,
    S: Into<String>,
{
    let mut merged: BTreeMap<String, usize> = BTreeMap::new();
    for (label, count) in labeled_counts {
        *merged.entry(label.into()).or_insert(0) += count;
    }

    // BTreeMap iteration is label-ascending; a stable sort on value keeps that
    // order among equal counts
    let mut points: Vec<SeriesPoint<usize>> = merged
        .into_iter()
        .map(|(label, value)| SeriesPoint { label, value })
        .collect();
    points.sort_by(|a, b| b.value.cmp(&a.value));
    points.truncate(top_k);
    points
}

/// Which `StatSummary` field a metric series plots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Mean,
    Median,
    Std,
    Count,
}

impl Metric {
    pub fn of(&self, summary: &StatSummary) -> f64 {
        match self {
            Metric::Mean => summary.mean,
            Metric::Median => summary.median,
            Metric::Std => summary.std,
            Metric::Count => summary.count as f64,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Mean => "mean",
            Metric::Median => "median",
            Metric::Std => "std",
            Metric::Count => "count",
        };
        f.write_str(name)
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(Metric::Mean),
            "median" => Ok(Metric::Median),
            "std" => Ok(Metric::Std),
            "count" => Ok(Metric::Count),
            other => Err(format!("unknown metric '{}'", other)),
        }
    }
}

/// Genres ordered by one summary metric, descending, ties by label, at most `top_k`
pub fn metric_series(
    genre_stats: &BTreeMap<String, StatSummary>,
    metric: Metric,
    top_k: usize,
) -> Vec<SeriesPoint<f64>> {
    let mut points: Vec<SeriesPoint<f64>> = genre_stats
        .iter()
        .map(|(genre, summary)| SeriesPoint::new(genre.clone(), metric.of(summary)))
        .collect();
    points.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    points.truncate(top_k);
    points
}

/// Histogram bars in boundary order
pub fn histogram_series(buckets: &[BucketCount]) -> Vec<SeriesPoint<usize>> {
    buckets
        .iter()
        .map(|b| SeriesPoint::new(b.label.clone(), b.count))
        .collect()
}
