//! Garmin provider adapter
//!
//! Parses a document collected from Garmin Connect (one key per metric, each a
//! list of records or a single record) and maps it to canonical record lists.
//! The typed raw records below describe the canonical snake_case form.

use crate::error::DigestError;
use crate::types::MetricKind;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Number, Value};

use super::{lenient, normalize_keys, to_snake_case, ProviderAdapter, ProviderDocument};

/// Garmin document adapter
pub struct GarminAdapter;

impl ProviderAdapter for GarminAdapter {
    fn parse(&self, raw_json: &str) -> Result<ProviderDocument, DigestError> {
        let document: Value = serde_json::from_str(raw_json)?;
        let Value::Object(metrics) = document else {
            return Err(DigestError::ParseError(
                "collected document must be a JSON object keyed by metric".to_string(),
            ));
        };

        let mut parsed = ProviderDocument::default();
        for (key, payload) in metrics {
            let name = to_snake_case(&key);
            let Some(kind) = MetricKind::from_name(&name) else {
                parsed.passthrough.insert(key, payload);
                continue;
            };

            let records = match payload {
                Value::Array(items) => items.into_iter().map(normalize_keys).collect(),
                record @ Value::Object(_) => vec![normalize_keys(record)],
                Value::Null => Vec::new(),
                _ => {
                    return Err(DigestError::UnsupportedPayload {
                        metric: name,
                        expected: "a list of records or a single record".to_string(),
                    })
                }
            };
            parsed.records.insert(kind, records);
        }

        Ok(parsed)
    }
}

impl GarminAdapter {
    /// Decode canonical records into typed raw records.
    ///
    /// Returns the records that could be read and how many were skipped
    /// because they were not objects.
    pub fn typed<T: DeserializeOwned>(records: Vec<Value>) -> (Vec<T>, usize) {
        let total = records.len();
        let typed: Vec<T> = records
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|record| serde_json::from_value(record).ok())
            .collect();
        let skipped = total - typed.len();
        (typed, skipped)
    }
}

// Garmin record structures (canonical snake_case keys)

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHeartRateDay {
    #[serde(default)]
    pub calendar_date: Option<Value>,
    #[serde(default)]
    pub start_timestamp_gmt: Option<Value>,
    #[serde(default)]
    pub end_timestamp_gmt: Option<Value>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub resting_heart_rate: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub last_seven_days_avg_resting_heart_rate: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub min_heart_rate: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub max_heart_rate: Option<Number>,
    /// `[epoch_ms, bpm]` rows
    #[serde(default, deserialize_with = "lenient::array")]
    pub heart_rate_values: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStressDay {
    #[serde(default)]
    pub calendar_date: Option<Value>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub overall_stress_level: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub rest_stress_duration: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub low_stress_duration: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub medium_stress_duration: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub high_stress_duration: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBodyBattery {
    #[serde(default, deserialize_with = "lenient::object")]
    pub event: Option<RawBodyBatteryEvent>,
    #[serde(default)]
    pub activity_id: Option<Value>,
    #[serde(default)]
    pub activity_type: Option<Value>,
    #[serde(default)]
    pub activity_name: Option<Value>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub average_stress: Option<f64>,
    /// `[epoch_ms, stress]` rows
    #[serde(default, deserialize_with = "lenient::array")]
    pub stress_values_array: Vec<Value>,
    /// `[epoch_ms, status, level, version]` rows
    #[serde(default, deserialize_with = "lenient::array")]
    pub body_battery_values_array: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBodyBatteryEvent {
    #[serde(default)]
    pub event_type: Option<Value>,
    #[serde(default)]
    pub event_start_time_gmt: Option<Value>,
    /// Milliseconds
    #[serde(default, deserialize_with = "lenient::float")]
    pub timezone_offset: Option<f64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub duration_in_milliseconds: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub body_battery_impact: Option<Number>,
    #[serde(default)]
    pub feedback_type: Option<Value>,
    #[serde(default)]
    pub short_feedback: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTrainingReadiness {
    #[serde(default)]
    pub calendar_date: Option<Value>,
    #[serde(default)]
    pub timestamp_local: Option<Value>,
    #[serde(default)]
    pub level: Option<Value>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub score: Option<Number>,
    #[serde(default)]
    pub feedback_short: Option<Value>,
    #[serde(default)]
    pub feedback_long: Option<Value>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub sleep_score: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub sleep_score_factor_percent: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub recovery_time: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub recovery_time_factor_percent: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub acute_load: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub hrv_factor_percent: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub hrv_weekly_average: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub stress_history_factor_percent: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub sleep_history_factor_percent: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHrvDay {
    #[serde(default)]
    pub calendar_date: Option<Value>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub weekly_avg: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub last_night_avg: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub last_night_5_min_high: Option<Number>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub feedback_phrase: Option<Value>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub baseline: Option<RawHrvBaseline>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHrvBaseline {
    #[serde(default, deserialize_with = "lenient::number")]
    pub low_upper: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub balanced_low: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub balanced_upper: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSleepDay {
    #[serde(default, deserialize_with = "lenient::object")]
    pub daily_sleep_dto: Option<RawSleepDto>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub sleep_movement: Vec<RawSleepSegment>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub sleep_levels: Vec<RawSleepSegment>,
}

/// Nightly sleep summary; scalar fields are carried through as delivered
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSleepDto {
    #[serde(default)]
    pub calendar_date: Option<Value>,
    #[serde(default)]
    pub sleep_start_timestamp_gmt: Option<Value>,
    #[serde(default)]
    pub sleep_end_timestamp_gmt: Option<Value>,
    #[serde(default)]
    pub sleep_start_timestamp_local: Option<Value>,
    #[serde(default)]
    pub sleep_end_timestamp_local: Option<Value>,
    #[serde(default)]
    pub sleep_time_seconds: Option<Value>,
    #[serde(default)]
    pub nap_time_seconds: Option<Value>,
    #[serde(default)]
    pub deep_sleep_seconds: Option<Value>,
    #[serde(default)]
    pub light_sleep_seconds: Option<Value>,
    #[serde(default)]
    pub rem_sleep_seconds: Option<Value>,
    #[serde(default)]
    pub awake_sleep_seconds: Option<Value>,
    #[serde(default)]
    pub awake_count: Option<Value>,
    #[serde(default)]
    pub resting_heart_rate: Option<Value>,
    #[serde(default)]
    pub body_battery_change: Option<Value>,
    #[serde(default)]
    pub avg_sleep_stress: Option<Value>,
    #[serde(default)]
    pub average_respiration_value: Option<Value>,
    #[serde(default)]
    pub lowest_respiration_value: Option<Value>,
    #[serde(default)]
    pub highest_respiration_value: Option<Value>,
    #[serde(default)]
    pub sleep_score_feedback: Option<Value>,
    #[serde(default)]
    pub sleep_score_insight: Option<Value>,
    #[serde(default)]
    pub sleep_score_personalized_insight: Option<Value>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub sleep_scores: Option<RawSleepScores>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub sleep_need: Option<RawSleepNeed>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSleepScores {
    #[serde(default, deserialize_with = "lenient::object")]
    pub overall: Option<RawSleepScore>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSleepScore {
    #[serde(default, deserialize_with = "lenient::number")]
    pub value: Option<Number>,
    #[serde(default)]
    pub qualifier_key: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSleepNeed {
    #[serde(default)]
    pub baseline: Option<Value>,
    #[serde(default)]
    pub actual: Option<Value>,
    #[serde(default)]
    pub feedback: Option<Value>,
    #[serde(default)]
    pub hrv_adjustment: Option<Value>,
    #[serde(default)]
    pub nap_adjustment: Option<Value>,
    #[serde(default)]
    pub sleep_history_adjustment: Option<Value>,
}

/// One `sleep_movement` or `sleep_levels` interval
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSleepSegment {
    #[serde(default)]
    pub start_gmt: Option<Value>,
    #[serde(default)]
    pub end_gmt: Option<Value>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub activity_level: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawActivity {
    #[serde(default)]
    pub activity_id: Option<Value>,
    #[serde(default)]
    pub activity_name: Option<Value>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub activity_type: Option<RawActivityType>,
    #[serde(default)]
    pub start_time_local: Option<Value>,
    #[serde(default)]
    pub location_name: Option<Value>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub distance: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub duration: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub moving_duration: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub steps: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub calories: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub average_hr: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub max_hr: Option<Number>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub elevation_gain: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawActivityType {
    #[serde(default)]
    pub type_key: Option<Value>,
}
