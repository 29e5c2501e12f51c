//! Provider document adapters
//!
//! This module provides adapters that parse a collected provider document and
//! map it to the canonical form the slimmers work on: one list of records per
//! metric, keys in snake_case, series decoded into [`SeriesPoint`]s.

mod garmin;
pub mod lenient;

pub use garmin::{
    GarminAdapter, RawActivity, RawActivityType, RawBodyBattery, RawBodyBatteryEvent,
    RawHeartRateDay, RawHrvBaseline, RawHrvDay, RawSleepDay, RawSleepDto, RawSleepNeed,
    RawSleepScore, RawSleepScores, RawSleepSegment, RawStressDay, RawTrainingReadiness,
};

use crate::error::DigestError;
use crate::timestamp::instant_millis;
use crate::types::{MetricKind, SeriesPoint};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Trait for provider document adapters
pub trait ProviderAdapter {
    /// Parse a collected document into canonical per-metric record lists
    fn parse(&self, raw_json: &str) -> Result<ProviderDocument, DigestError>;
}

/// A provider document after canonicalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderDocument {
    /// Records of metrics with a dedicated slimmer, keys normalized
    pub records: BTreeMap<MetricKind, Vec<Value>>,
    /// Metrics without a slimmer, exactly as delivered
    pub passthrough: BTreeMap<String, Value>,
}

impl ProviderDocument {
    /// Number of metrics present in the document
    pub fn metric_count(&self) -> usize {
        self.records.len() + self.passthrough.len()
    }
}

/// Convert a camelCase / PascalCase key to snake_case.
///
/// Acronym runs stay together (`sleepStartTimestampGMT` becomes
/// `sleep_start_timestamp_gmt`, `HRVData` becomes `hrv_data`) and digits are
/// split from letters (`lastNight5MinHigh` becomes `last_night_5_min_high`).
/// Keys that are already snake_case are returned unchanged.
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();

        let boundary = match prev {
            None => false,
            Some(p) if c.is_ascii_uppercase() => {
                p.is_ascii_lowercase()
                    || p.is_ascii_digit()
                    || (p.is_ascii_uppercase() && next.is_some_and(|n| n.is_ascii_lowercase()))
            }
            Some(p) if c.is_ascii_digit() => p.is_ascii_alphabetic(),
            Some(_) => false,
        };

        if boundary && !out.ends_with('_') {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Recursively rewrite every object key to snake_case
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (to_snake_case(&k), normalize_keys(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// A decoded series and what was wrong with it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesParse {
    pub points: Vec<SeriesPoint>,
    /// Samples whose value was present but not a number
    pub malformed_values: usize,
    /// Samples whose timestamp could not be read
    pub unreadable_timestamps: usize,
}

/// Decode `[timestamp, ..., value, ...]` rows.
///
/// The timestamp is at index 0 and the value at `value_index`. A row that is
/// not an array, or too short to hold the value, becomes a sample with no
/// timestamp and no value so it still counts as missing.
pub fn parse_series(rows: &[Value], value_index: usize) -> SeriesParse {
    let mut parsed = SeriesParse {
        points: Vec::with_capacity(rows.len()),
        ..Default::default()
    };

    for row in rows {
        let Some(cells) = row.as_array() else {
            parsed.malformed_values += 1;
            parsed.unreadable_timestamps += 1;
            parsed.points.push(SeriesPoint { ts: None, value: None });
            continue;
        };

        let ts = cells.first().and_then(instant_millis);
        if ts.is_none() {
            parsed.unreadable_timestamps += 1;
        }

        let value = match cells.get(value_index) {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let value = lenient::coerce_f64(raw);
                if value.is_none() {
                    parsed.malformed_values += 1;
                }
                value
            }
        };

        parsed.points.push(SeriesPoint { ts, value });
    }

    parsed
}
