//! Activity slimmer
//!
//! Keeps what the activity was, when it happened and the load metrics that
//! matter for recovery.

use super::{timestamp_field, SlimReport, Slimmer};
use crate::adapters::RawActivity;
use crate::encoder::{compact, Compact};
use crate::types::MetricKind;
use serde::Serialize;
use serde_json::{Number, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moving_s: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_kcal: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_hr: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hr: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_gain_m: Option<Number>,
}

impl Compact for ActivityMetrics {
    fn is_compact_empty(&self) -> bool {
        *self == ActivityMetrics::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlimActivity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<Value>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time_local: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ActivityMetrics>,
}

#[derive(Debug, Clone, Default)]
pub struct ActivitySlimmer;

impl Slimmer for ActivitySlimmer {
    type Raw = RawActivity;
    type Output = SlimActivity;

    fn metric(&self) -> MetricKind {
        MetricKind::Activity
    }

    fn slim(&self, raw: &RawActivity, _report: &mut SlimReport) -> SlimActivity {
        SlimActivity {
            activity_id: raw.activity_id.clone(),
            activity_type: raw.activity_type.as_ref().and_then(|t| t.type_key.clone()),
            start_time_local: timestamp_field(&raw.start_time_local),
            location_name: raw.location_name.clone(),
            metrics: compact(ActivityMetrics {
                distance_m: raw.distance.clone(),
                duration_s: raw.duration.clone(),
                moving_s: raw.moving_duration.clone(),
                steps: raw.steps.clone(),
                calories_kcal: raw.calories.clone(),
                avg_hr: raw.average_hr.clone(),
                max_hr: raw.max_hr.clone(),
                elevation_gain_m: raw.elevation_gain.clone(),
            }),
        }
    }
}
