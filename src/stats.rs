//! Descriptive statistics
//!
//! This module holds the numeric primitives the slimmers share:
//! - Linear-interpolation percentile
//! - Series summary (count, missing, avg, p95, min, max, first peak)
//! - Level summary for body battery style series

use crate::types::{LevelSummary, Peak, SeriesPoint, SeriesSummary};

/// Percentile used for series summaries
pub const SUMMARY_PERCENTILE: f64 = 0.95;

/// Compute the `p`-th percentile (0.0 - 1.0) by linear interpolation between
/// order statistics.
///
/// With `k = (n - 1) * p`, the result interpolates between the `floor(k)`-th
/// and the next sorted element; when there is no next element the maximum is
/// returned. Returns `None` for an empty sample.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let p = p.clamp(0.0, 1.0);
    let k = (sorted.len() - 1) as f64 * p;
    let f = k.floor() as usize;
    let c = f + 1;
    if c >= sorted.len() {
        return sorted.last().copied();
    }
    Some(sorted[f] + (k - f as f64) * (sorted[c] - sorted[f]))
}

/// Round to two decimals, half away from zero
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean, `None` when empty
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Summarize a series.
///
/// Null samples count towards `missing_count` and nothing else. The peak is
/// the first sample, in series order, whose value equals the maximum.
pub fn summarize_series(points: &[SeriesPoint]) -> SeriesSummary {
    let valid: Vec<(Option<i64>, f64)> = points
        .iter()
        .filter_map(|p| p.value.map(|v| (p.ts, v)))
        .collect();

    let samples_count = points.len();
    let missing_count = samples_count - valid.len();

    if valid.is_empty() {
        return SeriesSummary {
            samples_count,
            missing_count,
            ..Default::default()
        };
    }

    let values: Vec<f64> = valid.iter().map(|(_, v)| *v).collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let peak = valid
        .iter()
        .find(|(_, v)| *v == max)
        .map(|(ts, value)| Peak { ts: *ts, value: *value });

    SeriesSummary {
        samples_count,
        missing_count,
        avg: mean(&values).map(round2),
        p95: percentile(&values, SUMMARY_PERCENTILE).map(round2),
        min: Some(min),
        max: Some(max),
        peak,
    }
}

/// Summarize a level series: range, first and last reading, drift, and the
/// first occurrences of the highest and lowest level.
pub fn summarize_levels(points: &[SeriesPoint]) -> LevelSummary {
    let valid: Vec<(Option<i64>, f64)> = points
        .iter()
        .filter_map(|p| p.value.map(|v| (p.ts, v)))
        .collect();

    let samples_count = points.len();
    let (Some(first), Some(last)) = (valid.first(), valid.last()) else {
        return LevelSummary {
            samples_count,
            ..Default::default()
        };
    };

    let min = valid.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max = valid.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
    let first_with = |target: f64| {
        valid
            .iter()
            .find(|(_, v)| *v == target)
            .map(|(ts, value)| Peak { ts: *ts, value: *value })
    };

    LevelSummary {
        samples_count,
        min: Some(min),
        max: Some(max),
        start_value: Some(first.1),
        end_value: Some(last.1),
        delta: Some(last.1 - first.1),
        peak: first_with(max),
        lowest: first_with(min),
    }
}
