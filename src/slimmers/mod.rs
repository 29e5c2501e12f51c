//! Type-specific slimmers
//!
//! Each slimmer turns one typed raw record into a compact record. The shared
//! primitives (statistics, timelines, per-day selection) live in their own
//! modules; slimmers only extract fields and assemble output.

mod activity;
mod body_battery;
mod heart_rate;
mod hrv;
mod readiness;
mod sleep;
mod stress;

pub use activity::{ActivityMetrics, ActivitySlimmer, SlimActivity};
pub use body_battery::{BodyBatterySlimmer, SlimActivityRef, SlimBodyBattery, SlimEvent};
pub use heart_rate::{HeartRateSlimmer, SlimHeartRateDay};
pub use hrv::{HrvBaseline, HrvSlimmer, SlimHrvDay};
pub use readiness::{ReadinessFactors, ReadinessSlimmer, SlimReadiness};
pub use sleep::{
    LevelsTimeline, MovementSummary, SleepNeed, SleepScore, SleepSlimmer, SlimSleepDay,
    SLEEP_LEVEL_BUCKET_MINUTES,
};
pub use stress::{SlimStressDay, StressSlimmer};

use crate::adapters::SeriesParse;
use crate::types::{MetricKind, PickPolicy};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Settings threaded into the slimmers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlimContext {
    /// Stress level above which event timelines keep full resolution
    pub high_stress_threshold: f64,
    /// Per-day pick for training readiness snapshots
    pub readiness_pick: PickPolicy,
}

impl Default for SlimContext {
    fn default() -> Self {
        Self {
            high_stress_threshold: 50.0,
            readiness_pick: PickPolicy::Latest,
        }
    }
}

/// Data quality counters gathered while slimming
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlimReport {
    /// Series samples whose value was not a number
    pub malformed_values: usize,
    /// Samples or records whose timestamp could not be read
    pub unreadable_timestamps: usize,
    /// Records dropped by a list variant (empty or duplicate)
    pub dropped_records: usize,
}

impl SlimReport {
    pub(crate) fn record_series(&mut self, series: &SeriesParse) {
        self.malformed_values += series.malformed_values;
        self.unreadable_timestamps += series.unreadable_timestamps;
    }

    /// True when nothing was malformed or dropped
    pub fn is_clean(&self) -> bool {
        *self == SlimReport::default()
    }
}

/// A slimmer for one metric type
pub trait Slimmer {
    /// Typed raw record
    type Raw: DeserializeOwned;
    /// Compact output record
    type Output: Serialize;

    /// Metric handled by this slimmer
    fn metric(&self) -> MetricKind;

    /// Slim one record
    fn slim(&self, raw: &Self::Raw, report: &mut SlimReport) -> Self::Output;

    /// Slim a list of records
    fn slim_list(&self, raws: Vec<Self::Raw>, report: &mut SlimReport) -> Vec<Self::Output> {
        raws.iter().map(|raw| self.slim(raw, report)).collect()
    }
}

/// Pass a scalar through, re-rendering strings that hold timestamps
pub(crate) fn timestamp_field(value: &Option<Value>) -> Option<Value> {
    match value {
        Some(raw @ Value::String(_)) => crate::timestamp::render(raw).map(Value::String),
        other => other.clone(),
    }
}

/// Render a timestamp value as a string (epoch milliseconds become ISO)
pub(crate) fn timestamp_string(value: &Option<Value>) -> Option<String> {
    value.as_ref().and_then(crate::timestamp::render)
}

pub(crate) fn calendar_date(value: &Option<Value>) -> Option<String> {
    value.as_ref().and_then(crate::timestamp::calendar_date)
}
