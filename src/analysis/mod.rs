//! ==============================================================================
//! analysis - statistics and analytics engine
//! ==============================================================================
//!
//! purpose:
//!     pure functions over a time-ordered series of readings. nothing in here
//!     touches storage, the clock, or shared state, so every piece can be
//!     tested with hand-built readings.
//!
//! pipeline:
//!
//!     readings (oldest first)
//!        │
//!        ├── stats.rs        min / max / avg / median / std dev per metric
//!        ├── correlation.rs  pearson r for the named metric pairs
//!        ├── hourly.rs       hour-of-day buckets + peak hours
//!        │
//!        └── latest reading
//!               ├── aqi.rs     PM2.5 sub-index, levels, overall score
//!               └── advice.rs  suggestions + threshold anomalies
//!
//! empty series produce defined zero results, never errors.
//!
//! ==============================================================================

pub mod advice;
pub mod aqi;
pub mod correlation;
pub mod hourly;
pub mod stats;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{Metric, Reading};
use advice::{Anomaly, Suggestion};
use aqi::AqiResult;
use correlation::Correlations;
use hourly::{HourlyBucket, PeakHours};
use stats::StatsResult;

/// round half away from zero to `places` decimals
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// per-metric statistics plus the anomalies of the latest reading
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub stats: BTreeMap<Metric, StatsResult>,
    pub anomalies: Vec<Anomaly>,
}

/// everything the dashboard's analysis panel shows
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub correlations: Correlations,
    pub hourly_trend: Vec<HourlyBucket>,
    pub peak_hours: PeakHours,
    pub aqi: AqiResult,
    pub suggestions: Vec<Suggestion>,
    pub latest: Reading,
}

/// describe a series; `None` when there is no latest reading to judge
pub fn summarize(readings: &[Reading]) -> Option<Summary> {
    let latest = readings.last()?;
    Some(Summary {
        count: readings.len(),
        stats: stats::describe_metrics(readings),
        anomalies: advice::detect_anomalies(latest),
    })
}

/// full analysis of a series; `None` when the series is empty
pub fn analyze(readings: &[Reading]) -> Option<AnalysisResult> {
    let latest = readings.last()?;
    let hourly_trend = hourly::aggregate_by_hour(readings);
    let peak_hours = PeakHours::from_buckets(&hourly_trend);

    Some(AnalysisResult {
        correlations: Correlations::from_readings(readings),
        hourly_trend,
        peak_hours,
        aqi: aqi::score(latest.pm25, latest.co2, latest.voc),
        suggestions: advice::suggest(latest),
        latest: latest.clone(),
    })
}
