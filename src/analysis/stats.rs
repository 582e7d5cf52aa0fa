//! descriptive statistics over a numeric series

use serde::Serialize;
use std::collections::BTreeMap;

use super::round_to;
use crate::domain::{Metric, Reading};

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize)]
pub struct StatsResult {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub median: f64,
    pub std_dev: f64,
    pub count: usize,
}

/// min / max / mean / median / population standard deviation, each rounded
/// to 2 decimals. an empty series yields all zeros.
pub fn describe(values: &[f64]) -> StatsResult {
    if values.is_empty() {
        return StatsResult::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let min = sorted[0];
    let max = sorted[n - 1];
    let avg = values.iter().sum::<f64>() / n as f64;

    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };

    // population variance: divide by n, not n - 1
    let variance = values.iter().map(|v| (v - avg) * (v - avg)).sum::<f64>() / n as f64;

    StatsResult {
        min: round_to(min, 2),
        max: round_to(max, 2),
        avg: round_to(avg, 2),
        median: round_to(median, 2),
        std_dev: round_to(variance.sqrt(), 2),
        count: n,
    }
}

/// one StatsResult per metric channel
pub fn describe_metrics(readings: &[Reading]) -> BTreeMap<Metric, StatsResult> {
    Metric::ALL
        .into_iter()
        .map(|metric| (metric, describe(&metric.series(readings))))
        .collect()
}
