//! Training readiness slimmer
//!
//! The provider may return several readiness snapshots per day (the score is
//! recomputed after sleep sync, after activities...). The list variant keeps
//! one snapshot per calendar date.

use super::{calendar_date, timestamp_string, SlimReport, Slimmer};
use crate::adapters::RawTrainingReadiness;
use crate::encoder::{compact, Compact};
use crate::selector::{select_per_day, DatedRecord};
use crate::timestamp::TimestampParse;
use crate::types::{MetricKind, PickPolicy};
use serde::Serialize;
use serde_json::{Number, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadinessFactors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_score: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_score_percent: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_time_hours: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_percent: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acute_load: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hrv_percent: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hrv_weekly_average: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_history_percent: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_history_percent: Option<Number>,
}

impl Compact for ReadinessFactors {
    fn is_compact_empty(&self) -> bool {
        *self == ReadinessFactors::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlimReadiness {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_local: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_short: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_long: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factors: Option<ReadinessFactors>,
}

impl DatedRecord for SlimReadiness {
    fn calendar_date(&self) -> Option<&str> {
        self.calendar_date.as_deref()
    }

    fn local_timestamp(&self) -> TimestampParse {
        TimestampParse::local(self.timestamp_local.as_deref())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadinessSlimmer {
    pick: PickPolicy,
}

impl ReadinessSlimmer {
    pub fn new(pick: PickPolicy) -> Self {
        Self { pick }
    }
}

impl Slimmer for ReadinessSlimmer {
    type Raw = RawTrainingReadiness;
    type Output = SlimReadiness;

    fn metric(&self) -> MetricKind {
        MetricKind::TrainingReadinessData
    }

    fn slim(&self, raw: &RawTrainingReadiness, _report: &mut SlimReport) -> SlimReadiness {
        SlimReadiness {
            calendar_date: calendar_date(&raw.calendar_date),
            timestamp_local: timestamp_string(&raw.timestamp_local),
            level: raw.level.clone(),
            score: raw.score.clone(),
            feedback_short: raw.feedback_short.clone(),
            feedback_long: raw.feedback_long.clone(),
            factors: compact(ReadinessFactors {
                sleep_score: raw.sleep_score.clone(),
                sleep_score_percent: raw.sleep_score_factor_percent.clone(),
                recovery_time_hours: raw.recovery_time.clone(),
                recovery_percent: raw.recovery_time_factor_percent.clone(),
                acute_load: raw.acute_load.clone(),
                hrv_percent: raw.hrv_factor_percent.clone(),
                hrv_weekly_average: raw.hrv_weekly_average.clone(),
                stress_history_percent: raw.stress_history_factor_percent.clone(),
                sleep_history_percent: raw.sleep_history_factor_percent.clone(),
            }),
        }
    }

    /// One snapshot per calendar date, ascending by date
    fn slim_list(&self, raws: Vec<RawTrainingReadiness>, report: &mut SlimReport) -> Vec<SlimReadiness> {
        let slimmed: Vec<SlimReadiness> = raws.iter().map(|raw| self.slim(raw, report)).collect();
        report.unreadable_timestamps += slimmed
            .iter()
            .filter(|record| record.local_timestamp().is_unparsable())
            .count();

        let total = slimmed.len();
        let selected = select_per_day(slimmed, self.pick);
        report.dropped_records += total - selected.len();
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::GarminAdapter;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn snapshots() -> Vec<RawTrainingReadiness> {
        let (raws, _) = GarminAdapter::typed(vec![
            json!({
                "calendar_date": "2024-05-01",
                "timestamp_local": "2024-05-01T07:00:00.0",
                "level": "LOW",
                "score": 40,
                "sleep_score": 61,
                "recovery_time": 18
            }),
            json!({
                "calendar_date": "2024-05-01",
                "timestamp_local": "2024-05-01T07:30:00.0",
                "level": "MODERATE",
                "score": 55,
                "sleep_score": 61,
                "recovery_time": 12
            }),
            json!({
                "calendar_date": "2024-04-30",
                "timestamp_local": "2024-04-30T06:50:00.0",
                "score": 71
            }),
        ]);
        raws
    }

    fn scores(records: &[SlimReadiness]) -> Vec<Option<Number>> {
        records.iter().map(|r| r.score.clone()).collect()
    }

    #[test]
    fn test_latest_snapshot_per_day() {
        let mut report = SlimReport::default();
        let records = ReadinessSlimmer::new(PickPolicy::Latest).slim_list(snapshots(), &mut report);

        assert_eq!(scores(&records), vec![Some(Number::from(71)), Some(Number::from(55))]);
        assert_eq!(report.dropped_records, 1);
        assert_eq!(
            serde_json::to_value(&records[1]).unwrap(),
            json!({
                "calendar_date": "2024-05-01",
                "timestamp_local": "2024-05-01T07:30:00",
                "level": "MODERATE",
                "score": 55,
                "factors": {"sleep_score": 61, "recovery_time_hours": 12}
            })
        );
    }

    #[test]
    fn test_earliest_snapshot_per_day() {
        let records = ReadinessSlimmer::new(PickPolicy::Earliest)
            .slim_list(snapshots(), &mut SlimReport::default());
        assert_eq!(scores(&records), vec![Some(Number::from(71)), Some(Number::from(40))]);
    }

    #[test]
    fn test_snapshot_without_factors_omits_them() {
        let (raws, _) = GarminAdapter::typed(vec![json!({"calendar_date": "2024-05-01", "score": 50})]);
        let records: Vec<SlimReadiness> =
            ReadinessSlimmer::default().slim_list(raws, &mut SlimReport::default());
        assert_eq!(
            serde_json::to_value(&records).unwrap(),
            json!([{"calendar_date": "2024-05-01", "score": 50}])
        );
    }

    #[test]
    fn test_unparsable_timestamps_are_reported() {
        let (raws, _) = GarminAdapter::typed(vec![
            json!({"calendar_date": "2024-05-01", "timestamp_local": "morning", "score": 10}),
            json!({"calendar_date": "2024-05-01", "timestamp_local": "2024-05-01T08:00:00", "score": 20}),
        ]);
        let mut report = SlimReport::default();
        let records = ReadinessSlimmer::default().slim_list(raws, &mut report);

        assert_eq!(scores(&records), vec![Some(Number::from(20))]);
        assert_eq!(report.unreadable_timestamps, 1);
    }
}
