//! Daily HRV slimmer

use super::{calendar_date, SlimReport, Slimmer};
use crate::adapters::RawHrvDay;
use crate::encoder::{compact, Compact};
use crate::types::MetricKind;
use serde::Serialize;
use serde_json::{Number, Value};

/// Personal HRV baseline bands
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HrvBaseline {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_upper: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balanced_low: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balanced_upper: Option<Number>,
}

impl Compact for HrvBaseline {
    fn is_compact_empty(&self) -> bool {
        self.low_upper.is_none() && self.balanced_low.is_none() && self.balanced_upper.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlimHrvDay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_avg: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_night_avg: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_night_5_min_high: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_phrase: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<HrvBaseline>,
}

#[derive(Debug, Clone, Default)]
pub struct HrvSlimmer;

impl Slimmer for HrvSlimmer {
    type Raw = RawHrvDay;
    type Output = SlimHrvDay;

    fn metric(&self) -> MetricKind {
        MetricKind::DailyHrv
    }

    fn slim(&self, raw: &RawHrvDay, _report: &mut SlimReport) -> SlimHrvDay {
        let baseline = raw.baseline.as_ref().map(|b| HrvBaseline {
            low_upper: b.low_upper.clone(),
            balanced_low: b.balanced_low.clone(),
            balanced_upper: b.balanced_upper.clone(),
        });

        SlimHrvDay {
            calendar_date: calendar_date(&raw.calendar_date),
            weekly_avg: raw.weekly_avg.clone(),
            last_night_avg: raw.last_night_avg.clone(),
            last_night_5_min_high: raw.last_night_5_min_high.clone(),
            status: raw.status.clone(),
            feedback_phrase: raw.feedback_phrase.clone(),
            baseline: baseline.and_then(compact),
        }
    }
}
