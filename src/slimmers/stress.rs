//! Daily stress slimmer

use super::{calendar_date, SlimReport, Slimmer};
use crate::adapters::RawStressDay;
use crate::types::MetricKind;
use serde::Serialize;
use serde_json::Number;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlimStressDay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_stress_level: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_duration_s: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_duration_s: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium_duration_s: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_duration_s: Option<Number>,
}

#[derive(Debug, Clone, Default)]
pub struct StressSlimmer;

impl Slimmer for StressSlimmer {
    type Raw = RawStressDay;
    type Output = SlimStressDay;

    fn metric(&self) -> MetricKind {
        MetricKind::DailyStress
    }

    fn slim(&self, raw: &RawStressDay, _report: &mut SlimReport) -> SlimStressDay {
        SlimStressDay {
            calendar_date: calendar_date(&raw.calendar_date),
            overall_stress_level: raw.overall_stress_level.clone(),
            rest_duration_s: raw.rest_stress_duration.clone(),
            low_duration_s: raw.low_stress_duration.clone(),
            medium_duration_s: raw.medium_stress_duration.clone(),
            high_duration_s: raw.high_stress_duration.clone(),
        }
    }

    /// Days without an overall stress level carry no signal and are dropped
    fn slim_list(&self, raws: Vec<RawStressDay>, report: &mut SlimReport) -> Vec<SlimStressDay> {
        let total = raws.len();
        let kept: Vec<SlimStressDay> = raws
            .iter()
            .map(|raw| self.slim(raw, report))
            .filter(|day| day.overall_stress_level.is_some())
            .collect();
        report.dropped_records += total - kept.len();
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::GarminAdapter;
    use serde_json::json;

    #[test]
    fn test_slim_stress_days() {
        let (raws, _) = GarminAdapter::typed(vec![
            json!({
                "calendar_date": "2024-05-01",
                "overall_stress_level": 34,
                "rest_stress_duration": 28800,
                "high_stress_duration": 1200
            }),
            json!({"calendar_date": "2024-05-02", "overall_stress_level": null}),
        ]);

        let mut report = SlimReport::default();
        let days = StressSlimmer.slim_list(raws, &mut report);

        assert_eq!(days.len(), 1);
        assert_eq!(report.dropped_records, 1);
        assert_eq!(
            serde_json::to_value(&days[0]).unwrap(),
            json!({
                "calendar_date": "2024-05-01",
                "overall_stress_level": 34,
                "rest_duration_s": 28800,
                "high_duration_s": 1200
            })
        );
    }

    #[test]
    fn test_empty_list() {
        let days = StressSlimmer.slim_list(Vec::new(), &mut SlimReport::default());
        assert!(days.is_empty());
    }
}
