//! Daily sleep slimmer
//!
//! Keeps the nightly summary fields, condenses the per-minute movement
//! series into a handful of statistics and turns the sleep stage intervals
//! into a run-length compressed timeline at 10 minute resolution.

use super::{calendar_date, timestamp_field, timestamp_string, SlimReport, Slimmer};
use crate::adapters::{RawSleepDay, RawSleepDto, RawSleepSegment};
use crate::encoder::{compact, compact_f64, Compact};
use crate::stats::{mean, percentile, round2, SUMMARY_PERCENTILE};
use crate::timeline::{anchored_timeline, signed_offset_minutes};
use crate::timestamp::instant_millis;
use crate::types::{MetricKind, SleepStage, TimelineEntry};
use serde::Serialize;
use serde_json::{Number, Value};

/// Resolution of the sleep stage timeline
pub const SLEEP_LEVEL_BUCKET_MINUTES: i64 = 10;

/// Movement at or above this percentile counts as restless
const HIGH_MOVEMENT_PERCENTILE: f64 = 0.90;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SleepScore {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<Value>,
}

impl Compact for SleepScore {
    fn is_compact_empty(&self) -> bool {
        self.value.is_none() && self.qualifier.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SleepNeed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hrv_adjustment: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nap_adjustment: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_history_adjustment: Option<Value>,
}

impl Compact for SleepNeed {
    fn is_compact_empty(&self) -> bool {
        *self == SleepNeed::default()
    }
}

/// Summary of the per-minute movement series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementSummary {
    #[serde(serialize_with = "compact_f64")]
    pub avg: f64,
    #[serde(serialize_with = "compact_f64")]
    pub p95: f64,
    #[serde(serialize_with = "compact_f64")]
    pub max: f64,
    pub high_minutes: usize,
    pub longest_high_block_minutes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_start_gmt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_start_offset_min: Option<i64>,
    /// The peak started before the sleep start, so no offset is reported
    pub peak_offset_clamped: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelsTimeline {
    pub timeline_10m: Vec<TimelineEntry<SleepStage>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlimSleepDay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_start_timestamp_gmt: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_end_timestamp_gmt: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_start_timestamp_local: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_end_timestamp_local: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_time_seconds: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nap_time_seconds: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_sleep_seconds: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_sleep_seconds: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rem_sleep_seconds: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awake_sleep_seconds: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awake_count: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resting_heart_rate: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_battery_change: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_sleep_stress: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_respiration_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest_respiration_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_respiration_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_score_feedback: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_score_insight: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_score_personalized_insight: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_score: Option<SleepScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_need: Option<SleepNeed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement_summary: Option<MovementSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels_timeline: Option<LevelsTimeline>,
}

#[derive(Debug, Clone, Default)]
pub struct SleepSlimmer;

impl Slimmer for SleepSlimmer {
    type Raw = RawSleepDay;
    type Output = SlimSleepDay;

    fn metric(&self) -> MetricKind {
        MetricKind::DailySleepData
    }

    fn slim(&self, raw: &RawSleepDay, report: &mut SlimReport) -> SlimSleepDay {
        let dto = raw.daily_sleep_dto.clone().unwrap_or_default();
        let sleep_start = dto.sleep_start_timestamp_gmt.as_ref();
        let anchor_ms = sleep_start.and_then(instant_millis);
        if sleep_start.is_some() && anchor_ms.is_none() {
            report.unreadable_timestamps += 1;
        }

        let mut slim = core_fields(&dto);
        slim.movement_summary = summarize_movement(&raw.sleep_movement, anchor_ms);
        slim.levels_timeline = anchor_ms.and_then(|anchor| levels_timeline(&raw.sleep_levels, anchor, report));
        slim
    }
}

fn core_fields(dto: &RawSleepDto) -> SlimSleepDay {
    let sleep_score = dto
        .sleep_scores
        .as_ref()
        .and_then(|scores| scores.overall.as_ref())
        .map(|overall| SleepScore {
            value: overall.value.clone(),
            qualifier: overall.qualifier_key.clone(),
        })
        .and_then(compact);

    let sleep_need = dto
        .sleep_need
        .as_ref()
        .map(|need| SleepNeed {
            baseline: need.baseline.clone(),
            actual: need.actual.clone(),
            feedback: need.feedback.clone(),
            hrv_adjustment: need.hrv_adjustment.clone(),
            nap_adjustment: need.nap_adjustment.clone(),
            sleep_history_adjustment: need.sleep_history_adjustment.clone(),
        })
        .and_then(compact);

    SlimSleepDay {
        calendar_date: calendar_date(&dto.calendar_date),
        sleep_start_timestamp_gmt: timestamp_field(&dto.sleep_start_timestamp_gmt),
        sleep_end_timestamp_gmt: timestamp_field(&dto.sleep_end_timestamp_gmt),
        sleep_start_timestamp_local: timestamp_field(&dto.sleep_start_timestamp_local),
        sleep_end_timestamp_local: timestamp_field(&dto.sleep_end_timestamp_local),
        sleep_time_seconds: dto.sleep_time_seconds.clone(),
        nap_time_seconds: dto.nap_time_seconds.clone(),
        deep_sleep_seconds: dto.deep_sleep_seconds.clone(),
        light_sleep_seconds: dto.light_sleep_seconds.clone(),
        rem_sleep_seconds: dto.rem_sleep_seconds.clone(),
        awake_sleep_seconds: dto.awake_sleep_seconds.clone(),
        awake_count: dto.awake_count.clone(),
        resting_heart_rate: dto.resting_heart_rate.clone(),
        body_battery_change: dto.body_battery_change.clone(),
        avg_sleep_stress: dto.avg_sleep_stress.clone(),
        average_respiration_value: dto.average_respiration_value.clone(),
        lowest_respiration_value: dto.lowest_respiration_value.clone(),
        highest_respiration_value: dto.highest_respiration_value.clone(),
        sleep_score_feedback: dto.sleep_score_feedback.clone(),
        sleep_score_insight: dto.sleep_score_insight.clone(),
        sleep_score_personalized_insight: dto.sleep_score_personalized_insight.clone(),
        sleep_score,
        sleep_need,
        movement_summary: None,
        levels_timeline: None,
    }
}

/// Condense per-minute movement. Segments without a level are ignored and
/// break a run of high movement.
fn summarize_movement(movement: &[RawSleepSegment], anchor_ms: Option<i64>) -> Option<MovementSummary> {
    let levels: Vec<f64> = movement.iter().filter_map(|m| m.activity_level).collect();
    let avg = mean(&levels)?;
    let p90 = percentile(&levels, HIGH_MOVEMENT_PERCENTILE)?;
    let p95 = percentile(&levels, SUMMARY_PERCENTILE)?;
    let max = levels.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut high_minutes = 0;
    let mut longest_block = 0;
    let mut current_block = 0;
    for segment in movement {
        match segment.activity_level {
            Some(level) if level >= p90 => {
                high_minutes += 1;
                current_block += 1;
                longest_block = longest_block.max(current_block);
            }
            _ => current_block = 0,
        }
    }

    let peak = movement.iter().find(|m| m.activity_level == Some(max));
    let peak_start_gmt = peak.and_then(|m| timestamp_string(&m.start_gmt));
    let raw_offset = match (peak.and_then(|m| m.start_gmt.as_ref()).and_then(instant_millis), anchor_ms) {
        (Some(peak_ms), Some(anchor)) => signed_offset_minutes(peak_ms, anchor),
        _ => None,
    };

    Some(MovementSummary {
        avg: round2(avg),
        p95: round2(p95),
        max: round2(max),
        high_minutes,
        longest_high_block_minutes: longest_block,
        peak_start_gmt,
        peak_start_offset_min: raw_offset.filter(|offset| *offset >= 0),
        peak_offset_clamped: raw_offset.is_some_and(|offset| offset < 0),
    })
}

fn levels_timeline(levels: &[RawSleepSegment], anchor_ms: i64, report: &mut SlimReport) -> Option<LevelsTimeline> {
    let mut samples = Vec::with_capacity(levels.len());
    for segment in levels {
        let Some(start) = segment.start_gmt.as_ref() else {
            continue;
        };
        match instant_millis(start) {
            Some(ts) => samples.push((ts, SleepStage::from_activity_level(segment.activity_level))),
            None => report.unreadable_timestamps += 1,
        }
    }

    let timeline = anchored_timeline(anchor_ms, samples, SLEEP_LEVEL_BUCKET_MINUTES);
    if timeline.is_empty() {
        None
    } else {
        Some(LevelsTimeline { timeline_10m: timeline })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{normalize_keys, GarminAdapter};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    // 2024-05-01T00:00:00Z
    const SLEEP_START: i64 = 1_714_521_600_000;

    fn raw(value: Value) -> RawSleepDay {
        let (mut records, _) = GarminAdapter::typed(vec![normalize_keys(value)]);
        records.remove(0)
    }

    fn segment(start_gmt: &str, level: f64) -> Value {
        json!({"startGMT": start_gmt, "endGMT": start_gmt, "activityLevel": level})
    }

    #[test]
    fn test_core_fields_and_scores() {
        let day = raw(json!({
            "dailySleepDTO": {
                "calendarDate": "2024-05-01",
                "sleepStartTimestampGMT": SLEEP_START,
                "sleepTimeSeconds": 27000,
                "deepSleepSeconds": 5400,
                "awakeCount": 1,
                "avgSleepStress": 14.5,
                "sleepScores": {"overall": {"value": 82, "qualifierKey": "GOOD"}},
                "sleepNeed": {"baseline": 480, "actual": 500, "feedback": "INCREASED"}
            }
        }));

        let slim = SleepSlimmer.slim(&day, &mut SlimReport::default());
        assert_eq!(
            serde_json::to_value(&slim).unwrap(),
            json!({
                "calendar_date": "2024-05-01",
                "sleep_start_timestamp_gmt": SLEEP_START,
                "sleep_time_seconds": 27000,
                "deep_sleep_seconds": 5400,
                "awake_count": 1,
                "avg_sleep_stress": 14.5,
                "sleep_score": {"value": 82, "qualifier": "GOOD"},
                "sleep_need": {"baseline": 480, "actual": 500, "feedback": "INCREASED"}
            })
        );
    }

    #[test]
    fn test_movement_summary() {
        // levels: 0.5, 1.0, 3.0, 3.0, 0.2 -> p90 = 3.0
        let day = raw(json!({
            "dailySleepDTO": {"sleepStartTimestampGMT": SLEEP_START},
            "sleepMovement": [
                segment("2024-04-30T23:58:00.0", 0.5),
                segment("2024-04-30T23:59:00.0", 1.0),
                segment("2024-05-01T00:00:00.0", 3.0),
                segment("2024-05-01T00:01:00.0", 3.0),
                segment("2024-05-01T00:02:00.0", 0.2)
            ]
        }));

        let summary = SleepSlimmer
            .slim(&day, &mut SlimReport::default())
            .movement_summary
            .unwrap();

        assert_eq!(summary.avg, 1.54);
        assert_eq!(summary.max, 3.0);
        assert_eq!(summary.high_minutes, 2);
        assert_eq!(summary.longest_high_block_minutes, 2);
        assert_eq!(summary.peak_start_gmt.as_deref(), Some("2024-05-01T00:00:00"));
        assert_eq!(summary.peak_start_offset_min, Some(0));
        assert!(!summary.peak_offset_clamped);
    }

    #[test]
    fn test_movement_peak_before_sleep_start_is_clamped() {
        let day = raw(json!({
            "dailySleepDTO": {"sleepStartTimestampGMT": SLEEP_START},
            "sleepMovement": [
                segment("2024-04-30T23:50:00.0", 4.0),
                segment("2024-05-01T00:10:00.0", 1.0)
            ]
        }));

        let summary = SleepSlimmer
            .slim(&day, &mut SlimReport::default())
            .movement_summary
            .unwrap();
        assert_eq!(summary.peak_start_offset_min, None);
        assert!(summary.peak_offset_clamped);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("peak_start_offset_min").is_none());
        assert_eq!(json["peak_offset_clamped"], json!(true));
    }

    #[test]
    fn test_movement_peak_offset_out_of_range() {
        let movement = vec![RawSleepSegment {
            start_gmt: Some(json!(SLEEP_START)),
            end_gmt: None,
            activity_level: Some(2.0),
        }];

        let summary = summarize_movement(&movement, Some(i64::MIN)).unwrap();
        assert_eq!(summary.peak_start_offset_min, None);
        assert!(!summary.peak_offset_clamped);
        assert_eq!(summary.max, 2.0);
    }

    #[test]
    fn test_levels_timeline_is_compressed() {
        let day = raw(json!({
            "dailySleepDTO": {"sleepStartTimestampGMT": SLEEP_START},
            "sleepLevels": [
                segment("2024-04-30T23:45:00.0", 3.0),
                segment("2024-05-01T00:00:00.0", 1.0),
                segment("2024-05-01T00:12:00.0", 1.0),
                segment("2024-05-01T00:25:00.0", 0.0),
                segment("2024-05-01T00:27:00.0", 2.0),
                segment("2024-05-01T01:05:00.0", 2.0),
                segment("2024-05-01T01:30:00.0", 3.0)
            ]
        }));

        let slim = SleepSlimmer.slim(&day, &mut SlimReport::default());
        assert_eq!(
            serde_json::to_value(&slim.levels_timeline).unwrap(),
            json!({"timeline_10m": [[0, "light"], [20, "rem"], [90, "awake"]]})
        );
    }

    #[test]
    fn test_no_sleep_start_means_no_timeline() {
        let day = raw(json!({
            "dailySleepDTO": {"calendarDate": "2024-05-01"},
            "sleepLevels": [segment("2024-05-01T00:00:00.0", 1.0)]
        }));
        let slim = SleepSlimmer.slim(&day, &mut SlimReport::default());
        assert_eq!(slim.levels_timeline, None);
    }

    #[test]
    fn test_empty_day() {
        let slim = SleepSlimmer.slim(&RawSleepDay::default(), &mut SlimReport::default());
        assert_eq!(serde_json::to_value(&slim).unwrap(), json!({}));
    }
}
