//! Core types for the Synheart Digest engine
//!
//! This module defines the data structures shared by the slimmers: series
//! samples, series summaries, timeline entries and the small enums that
//! configure selection and timeline resolution.

use crate::encoder::{compact_f64, compact_opt_f64, Compact};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Metric types with a dedicated slimmer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    DailyHeartRate,
    DailyStress,
    BodyBatteryData,
    TrainingReadinessData,
    DailyHrv,
    DailySleepData,
    Activity,
}

impl MetricKind {
    pub const ALL: [MetricKind; 7] = [
        MetricKind::DailyHeartRate,
        MetricKind::DailyStress,
        MetricKind::BodyBatteryData,
        MetricKind::TrainingReadinessData,
        MetricKind::DailyHrv,
        MetricKind::DailySleepData,
        MetricKind::Activity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::DailyHeartRate => "daily_heart_rate",
            MetricKind::DailyStress => "daily_stress",
            MetricKind::BodyBatteryData => "body_battery_data",
            MetricKind::TrainingReadinessData => "training_readiness_data",
            MetricKind::DailyHrv => "daily_hrv",
            MetricKind::DailySleepData => "daily_sleep_data",
            MetricKind::Activity => "activity",
        }
    }

    /// Look up a metric by its document key
    pub fn from_name(name: &str) -> Option<Self> {
        MetricKind::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which record to keep when several share a calendar date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickPolicy {
    /// Keep the record with the greatest local timestamp
    #[default]
    Latest,
    /// Keep the record with the smallest local timestamp
    Earliest,
}

impl PickPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickPolicy::Latest => "latest",
            PickPolicy::Earliest => "earliest",
        }
    }
}

impl FromStr for PickPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(PickPolicy::Latest),
            "earliest" => Ok(PickPolicy::Earliest),
            other => Err(format!("unknown pick policy '{other}' (expected latest or earliest)")),
        }
    }
}

/// Sleep stage classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStage {
    Awake,
    Light,
    Deep,
    Rem,
    Unknown,
}

impl SleepStage {
    /// Map a provider activity level (0 deep, 1 light, 2 rem, 3 awake)
    pub fn from_activity_level(level: Option<f64>) -> Self {
        match level {
            Some(l) if l == 0.0 => SleepStage::Deep,
            Some(l) if l == 1.0 => SleepStage::Light,
            Some(l) if l == 2.0 => SleepStage::Rem,
            Some(l) if l == 3.0 => SleepStage::Awake,
            _ => SleepStage::Unknown,
        }
    }
}

/// One sample of a time series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    /// Epoch milliseconds; `None` when the source timestamp was unreadable
    pub ts: Option<i64>,
    /// Sample value; `None` marks a sensor gap or a malformed value
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn new(ts: i64, value: Option<f64>) -> Self {
        Self { ts: Some(ts), value }
    }
}

/// A reported extreme of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
    #[serde(serialize_with = "compact_f64")]
    pub value: f64,
}

/// Descriptive statistics over a numeric series
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub samples_count: usize,
    pub missing_count: usize,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "compact_opt_f64")]
    pub avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "compact_opt_f64")]
    pub p95: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "compact_opt_f64")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "compact_opt_f64")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak: Option<Peak>,
}

impl SeriesSummary {
    /// Number of samples that contributed to the statistics
    pub fn valid_count(&self) -> usize {
        self.samples_count - self.missing_count
    }
}

impl Compact for SeriesSummary {
    fn is_compact_empty(&self) -> bool {
        self.samples_count == 0
    }
}

/// Summary of a level series (body battery): range, drift and extremes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelSummary {
    pub samples_count: usize,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "compact_opt_f64")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "compact_opt_f64")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "compact_opt_f64")]
    pub start_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "compact_opt_f64")]
    pub end_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "compact_opt_f64")]
    pub delta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak: Option<Peak>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest: Option<Peak>,
}

impl Compact for LevelSummary {
    fn is_compact_empty(&self) -> bool {
        self.samples_count == 0
    }
}

/// `[offset_minutes, label]` relative to an anchor
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry<L> {
    pub offset_min: i64,
    pub label: L,
}

impl<L> TimelineEntry<L> {
    pub fn new(offset_min: i64, label: L) -> Self {
        Self { offset_min, label }
    }
}

impl<L: Serialize> Serialize for TimelineEntry<L> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.offset_min, &self.label).serialize(serializer)
    }
}

/// Sparse per-offset values of the merged stress / body battery timeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimelineValues {
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "compact_opt_f64")]
    pub bb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "compact_opt_f64")]
    pub stress: Option<f64>,
}

impl Compact for TimelineValues {
    fn is_compact_empty(&self) -> bool {
        self.bb.is_none() && self.stress.is_none()
    }
}

/// Resolution chosen for an event timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineMode {
    /// One entry per unique sample timestamp
    Full,
    /// Fixed-width buckets of the given size in minutes
    Bucketed(i64),
}

impl Serialize for TimelineMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TimelineMode::Full => serializer.serialize_str("full"),
            TimelineMode::Bucketed(minutes) => {
                serializer.serialize_str(&format!("bucket_{minutes}m"))
            }
        }
    }
}
