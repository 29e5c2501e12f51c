//! Body battery event slimmer
//!
//! A body battery record describes one event (sleep, activity, stressful
//! period) with the stress and body battery series measured during it. The
//! slim record keeps the event header, one summary per series and a merged
//! timeline anchored at the event start.

use super::{SlimReport, Slimmer};
use crate::adapters::{parse_series, RawBodyBattery, RawBodyBatteryEvent};
use crate::encoder::{compact, compact_opt_f64, Compact};
use crate::stats::{round2, summarize_levels, summarize_series};
use crate::timeline::{EventTimelineBuilder, MINUTE_MS};
use crate::timestamp::{instant_millis, render};
use crate::types::{LevelSummary, MetricKind, SeriesSummary, TimelineEntry, TimelineMode, TimelineValues};
use serde::Serialize;
use serde_json::{Number, Value};

/// Index of the level inside a `body_battery_values_array` row
const BODY_BATTERY_LEVEL_INDEX: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlimEvent {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_gmt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone_offset_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_feedback: Option<Value>,
}

impl Compact for SlimEvent {
    fn is_compact_empty(&self) -> bool {
        *self == SlimEvent::default()
    }
}

/// Activity that caused the event
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlimActivityRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
}

impl Compact for SlimActivityRef {
    fn is_compact_empty(&self) -> bool {
        self.id.is_none() && self.activity_type.is_none() && self.name.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlimBodyBattery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<SlimEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_series_summary: Option<SeriesSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_battery_series_summary: Option<LevelSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub timeline: Vec<TimelineEntry<TimelineValues>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline_mode: Option<TimelineMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<SlimActivityRef>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "compact_opt_f64")]
    pub avg_stress: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct BodyBatterySlimmer {
    timeline: EventTimelineBuilder,
}

impl BodyBatterySlimmer {
    pub fn new(high_stress_threshold: f64) -> Self {
        Self {
            timeline: EventTimelineBuilder::new(high_stress_threshold),
        }
    }

    fn slim_event(event: &RawBodyBatteryEvent) -> SlimEvent {
        SlimEvent {
            event_type: event.event_type.clone(),
            start_gmt: event.event_start_time_gmt.as_ref().and_then(render),
            timezone_offset_min: event
                .timezone_offset
                .map(|ms| (ms.floor() as i64).div_euclid(MINUTE_MS)),
            duration_s: event.duration_in_milliseconds.map(|ms| (ms / 1000.0).trunc() as i64),
            impact: event.body_battery_impact.clone(),
            feedback_type: event.feedback_type.clone(),
            short_feedback: event.short_feedback.clone(),
        }
    }
}

impl Default for BodyBatterySlimmer {
    fn default() -> Self {
        Self::new(super::SlimContext::default().high_stress_threshold)
    }
}

impl Slimmer for BodyBatterySlimmer {
    type Raw = RawBodyBattery;
    type Output = SlimBodyBattery;

    fn metric(&self) -> MetricKind {
        MetricKind::BodyBatteryData
    }

    fn slim(&self, raw: &RawBodyBattery, report: &mut SlimReport) -> SlimBodyBattery {
        let stress = parse_series(&raw.stress_values_array, 1);
        let levels = parse_series(&raw.body_battery_values_array, BODY_BATTERY_LEVEL_INDEX);
        report.record_series(&stress);
        report.record_series(&levels);

        let start = raw.event.as_ref().and_then(|e| e.event_start_time_gmt.as_ref());
        let anchor_ms = start.and_then(instant_millis);
        if start.is_some() && anchor_ms.is_none() {
            report.unreadable_timestamps += 1;
        }

        let (timeline, timeline_mode) = match anchor_ms {
            Some(anchor) => {
                let built = self.timeline.build(anchor, &stress.points, &levels.points);
                if built.entries.is_empty() {
                    (Vec::new(), None)
                } else {
                    (built.entries, Some(built.mode))
                }
            }
            None => (Vec::new(), None),
        };

        SlimBodyBattery {
            event: raw.event.as_ref().map(Self::slim_event).and_then(compact),
            stress_series_summary: compact(summarize_series(&stress.points)),
            body_battery_series_summary: compact(summarize_levels(&levels.points)),
            timeline,
            timeline_mode,
            activity: compact(SlimActivityRef {
                id: raw.activity_id.clone(),
                activity_type: raw.activity_type.clone(),
                name: raw.activity_name.clone(),
            }),
            avg_stress: raw.average_stress.map(round2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::GarminAdapter;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const START: i64 = 1_714_546_800_000; // 2024-05-01T07:00:00Z

    fn raw(value: Value) -> RawBodyBattery {
        let (mut records, _) = GarminAdapter::typed(vec![value]);
        records.remove(0)
    }

    fn at(minutes: i64) -> i64 {
        START + minutes * MINUTE_MS
    }

    #[test]
    fn test_slim_low_stress_event() {
        let record = raw(json!({
            "event": {
                "event_type": "NAP",
                "event_start_time_gmt": "2024-05-01 07:00:00",
                "timezone_offset": 7200000,
                "duration_in_milliseconds": 3600000,
                "body_battery_impact": 6,
                "feedback_type": "NAP_RESTFUL",
                "short_feedback": "RESTFUL_PERIOD"
            },
            "average_stress": 18.456,
            "stress_values_array": [
                [at(-5), 45],
                [at(0), 20],
                [at(10), null],
                [at(40), 15]
            ],
            "body_battery_values_array": [
                [at(0), "MEASURED", 40, 2.0],
                [at(20), "MEASURED", 44, 2.0],
                [at(45), "MEASURED", 46, 2.0]
            ]
        }));

        let slim = BodyBatterySlimmer::new(50.0).slim(&record, &mut SlimReport::default());

        assert_eq!(
            serde_json::to_value(&slim).unwrap(),
            json!({
                "event": {
                    "type": "NAP",
                    "start_gmt": "2024-05-01T07:00:00",
                    "timezone_offset_min": 120,
                    "duration_s": 3600,
                    "impact": 6,
                    "feedback_type": "NAP_RESTFUL",
                    "short_feedback": "RESTFUL_PERIOD"
                },
                "stress_series_summary": {
                    "samples_count": 4,
                    "missing_count": 1,
                    "avg": 26.67,
                    "p95": 42.5,
                    "min": 15,
                    "max": 45,
                    "peak": {"ts": at(-5), "value": 45}
                },
                "body_battery_series_summary": {
                    "samples_count": 3,
                    "min": 40,
                    "max": 46,
                    "start_value": 40,
                    "end_value": 46,
                    "delta": 6,
                    "peak": {"ts": at(45), "value": 46},
                    "lowest": {"ts": at(0), "value": 40}
                },
                "timeline": [
                    [0, {"bb": 44, "stress": 20}],
                    [30, {"bb": 46, "stress": 15}]
                ],
                "timeline_mode": "bucket_30m",
                "avg_stress": 18.46
            })
        );
    }

    #[test]
    fn test_high_stress_event_keeps_full_timeline() {
        let record = raw(json!({
            "event": {"event_type": "STRESS", "event_start_time_gmt": "2024-05-01T07:00:00Z"},
            "stress_values_array": [[at(0), 35], [at(3), 78], [at(7), 64]],
            "body_battery_values_array": [[at(3), "MEASURED", 52, 2.0]],
            "activity_id": 15023, "activity_name": "Morning Run"
        }));

        let slim = BodyBatterySlimmer::new(50.0).slim(&record, &mut SlimReport::default());

        assert_eq!(slim.timeline_mode, Some(TimelineMode::Full));
        assert_eq!(
            serde_json::to_value(&slim.timeline).unwrap(),
            json!([[0, {"stress": 35}], [3, {"bb": 52, "stress": 78}], [7, {"stress": 64}]])
        );
        assert_eq!(
            serde_json::to_value(&slim.activity).unwrap(),
            json!({"id": 15023, "name": "Morning Run"})
        );
    }

    #[test]
    fn test_zero_timezone_offset_is_kept() {
        let record = raw(json!({"event": {"timezone_offset": 0}}));
        let slim = BodyBatterySlimmer::default().slim(&record, &mut SlimReport::default());
        assert_eq!(slim.event.unwrap().timezone_offset_min, Some(0));
    }

    #[test]
    fn test_event_without_start_has_no_timeline() {
        let record = raw(json!({
            "event": {"event_type": "SLEEP", "event_start_time_gmt": "whenever"},
            "stress_values_array": [[at(0), 35]]
        }));
        let mut report = SlimReport::default();
        let slim = BodyBatterySlimmer::default().slim(&record, &mut report);

        assert!(slim.timeline.is_empty());
        assert_eq!(slim.timeline_mode, None);
        assert_eq!(slim.event.unwrap().start_gmt.as_deref(), Some("whenever"));
        assert_eq!(report.unreadable_timestamps, 1);
    }

    #[test]
    fn test_empty_record_is_empty_object() {
        let slim = BodyBatterySlimmer::default().slim(&RawBodyBattery::default(), &mut SlimReport::default());
        assert_eq!(serde_json::to_value(&slim).unwrap(), json!({}));
    }
}
