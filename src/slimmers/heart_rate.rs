//! Daily heart rate slimmer

use super::{calendar_date, timestamp_string, SlimReport, Slimmer};
use crate::adapters::{parse_series, RawHeartRateDay};
use crate::encoder::compact;
use crate::stats::summarize_series;
use crate::types::{MetricKind, SeriesSummary};
use serde::Serialize;
use serde_json::Number;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlimHeartRateDay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_timestamp_gmt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_timestamp_gmt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resting_heart_rate: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seven_days_avg_resting_heart_rate: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_heart_rate: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_heart_rate: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_summary: Option<SeriesSummary>,
}

/// Summarizes the intraday `heart_rate_values` series of each day
#[derive(Debug, Clone, Default)]
pub struct HeartRateSlimmer;

impl Slimmer for HeartRateSlimmer {
    type Raw = RawHeartRateDay;
    type Output = SlimHeartRateDay;

    fn metric(&self) -> MetricKind {
        MetricKind::DailyHeartRate
    }

    fn slim(&self, raw: &RawHeartRateDay, report: &mut SlimReport) -> SlimHeartRateDay {
        let series = parse_series(&raw.heart_rate_values, 1);
        report.record_series(&series);

        SlimHeartRateDay {
            calendar_date: calendar_date(&raw.calendar_date),
            start_timestamp_gmt: timestamp_string(&raw.start_timestamp_gmt),
            end_timestamp_gmt: timestamp_string(&raw.end_timestamp_gmt),
            resting_heart_rate: raw.resting_heart_rate.clone(),
            last_seven_days_avg_resting_heart_rate: raw
                .last_seven_days_avg_resting_heart_rate
                .clone(),
            min_heart_rate: raw.min_heart_rate.clone(),
            max_heart_rate: raw.max_heart_rate.clone(),
            series_summary: compact(summarize_series(&series.points)),
        }
    }
}
