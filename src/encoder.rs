//! Digest encoding
//!
//! This module owns the compaction conventions every slimmer follows and the
//! encoder that turns the per-metric results into the final JSON document.
//!
//! Compaction: a field with no value is omitted, never written as `null`, and
//! a nested object with nothing in it is omitted as a whole. Integral
//! statistics are written as JSON integers.

use crate::error::DigestError;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Largest magnitude at which every integer is exactly representable as f64
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Nested output objects that can be dropped when they carry no data
pub trait Compact {
    fn is_compact_empty(&self) -> bool;
}

/// Keep `value` only if it carries data
pub fn compact<T: Compact>(value: T) -> Option<T> {
    if value.is_compact_empty() {
        None
    } else {
        Some(value)
    }
}

/// Write an f64 as an integer when it has no fractional part
pub fn compact_f64<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// [`compact_f64`] for optional fields
pub fn compact_opt_f64<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => compact_f64(v, serializer),
        None => serializer.serialize_none(),
    }
}

/// Final output: metric name to compacted record(s), keys in sorted order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DigestDocument {
    metrics: BTreeMap<String, Value>,
}

impl DigestDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: impl Into<String>, records: Value) {
        self.metrics.insert(metric.into(), records);
    }

    pub fn get(&self, metric: &str) -> Option<&Value> {
        self.metrics.get(metric)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.metrics.into_iter().collect())
    }
}

/// JSON layout of the encoded document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputStyle {
    /// Single line
    Compact,
    /// Two-space indentation
    #[default]
    Pretty,
}

/// Encoder for digest documents
#[derive(Debug, Clone, Default)]
pub struct DigestEncoder {
    style: OutputStyle,
}

impl DigestEncoder {
    /// Create an encoder producing indented JSON
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with a specific layout
    pub fn with_style(style: OutputStyle) -> Self {
        Self { style }
    }

    /// Convert compacted records into a document value
    pub fn to_value<T: Serialize>(&self, records: &T) -> Result<Value, DigestError> {
        serde_json::to_value(records).map_err(|e| DigestError::EncodingError(e.to_string()))
    }

    /// Encode the document to a JSON string
    pub fn encode(&self, document: &DigestDocument) -> Result<String, DigestError> {
        let encoded = match self.style {
            OutputStyle::Compact => serde_json::to_string(document),
            OutputStyle::Pretty => serde_json::to_string_pretty(document),
        };
        encoded.map_err(|e| DigestError::EncodingError(e.to_string()))
    }
}
