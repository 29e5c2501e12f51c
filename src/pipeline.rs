//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Digest.
//! It orchestrates the full pipeline from a collected provider document to
//! the compact digest document.

use crate::adapters::{GarminAdapter, ProviderAdapter};
use crate::config::DigestConfig;
use crate::encoder::{DigestDocument, DigestEncoder, OutputStyle};
use crate::error::DigestError;
use crate::slimmers::{
    ActivitySlimmer, BodyBatterySlimmer, HeartRateSlimmer, HrvSlimmer, ReadinessSlimmer, SleepSlimmer,
    SlimReport, Slimmer, StressSlimmer,
};
use crate::types::MetricKind;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Slim a collected Garmin document with the default configuration.
///
/// # Arguments
/// * `raw_json` - Collected document, one key per metric
///
/// # Returns
/// The digest document as indented JSON
///
/// # Example
/// ```ignore
/// let digest = garmin_to_digest(collected_json)?;
/// ```
pub fn garmin_to_digest(raw_json: String) -> Result<String, DigestError> {
    slim_document(&raw_json, &DigestConfig::default())
}

/// Slim a collected Garmin document with an explicit configuration.
///
/// # Arguments
/// * `raw_json` - Collected document, one key per metric
/// * `config` - Threshold, pick policy and metric selection
///
/// # Returns
/// The digest document as indented JSON
pub fn slim_document(raw_json: &str, config: &DigestConfig) -> Result<String, DigestError> {
    DigestProcessor::new(config.clone()).process(raw_json)
}

/// What happened to one metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricReport {
    pub records_in: usize,
    pub records_out: usize,
    /// Records that were not objects
    pub skipped_records: usize,
    pub malformed_values: usize,
    pub unreadable_timestamps: usize,
    /// Empty or same-day duplicate records left out by the slimmer
    pub dropped_records: usize,
}

impl MetricReport {
    fn has_bad_input(&self) -> bool {
        self.skipped_records > 0 || self.malformed_values > 0 || self.unreadable_timestamps > 0
    }
}

/// Result of one digest run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Digest {
    pub document: DigestDocument,
    /// Per-metric counters for slimmed metrics
    pub reports: BTreeMap<MetricKind, MetricReport>,
    /// Unknown metrics copied through unchanged
    pub passed_through: Vec<String>,
    /// Metrics left out by configuration
    pub dropped: Vec<String>,
}

/// Processor holding configuration and output style.
///
/// Use this when the same settings are applied to many documents.
pub struct DigestProcessor {
    config: DigestConfig,
    encoder: DigestEncoder,
}

impl Default for DigestProcessor {
    fn default() -> Self {
        Self::new(DigestConfig::default())
    }
}

impl DigestProcessor {
    /// Create a processor producing indented JSON
    pub fn new(config: DigestConfig) -> Self {
        Self {
            config,
            encoder: DigestEncoder::new(),
        }
    }

    /// Create a processor with a specific output layout
    pub fn with_style(config: DigestConfig, style: OutputStyle) -> Self {
        Self {
            config,
            encoder: DigestEncoder::with_style(style),
        }
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Slim a collected Garmin document and encode it
    pub fn process(&self, raw_json: &str) -> Result<String, DigestError> {
        let digest = self.digest(raw_json)?;
        self.encoder.encode(&digest.document)
    }

    /// Slim a collected Garmin document
    pub fn digest(&self, raw_json: &str) -> Result<Digest, DigestError> {
        self.digest_with_adapter(&GarminAdapter, raw_json)
    }

    /// Slim a document parsed by any provider adapter.
    ///
    /// Pipeline stages:
    /// 1. ProviderAdapter - Parse and canonicalize the document
    /// 2. Slimmer - One per metric type, over typed raw records
    /// 3. DigestEncoder - Assemble the output document
    pub fn digest_with_adapter(
        &self,
        adapter: &dyn ProviderAdapter,
        raw_json: &str,
    ) -> Result<Digest, DigestError> {
        self.config.validate()?;

        // Stage 1: Parse provider document
        let parsed = adapter.parse(raw_json)?;
        debug!(metrics = parsed.metric_count(), "parsed provider document");

        let context = self.config.slim_context();
        let mut digest = Digest::default();

        // Stage 2: Slim each metric
        for (kind, records) in parsed.records {
            if !self.config.is_enabled(kind.as_str()) {
                debug!(metric = %kind, "metric disabled by configuration");
                digest.dropped.push(kind.as_str().to_string());
                continue;
            }

            let (value, report) = match kind {
                MetricKind::DailyHeartRate => self.run(&HeartRateSlimmer, records)?,
                MetricKind::DailyStress => self.run(&StressSlimmer, records)?,
                MetricKind::BodyBatteryData => {
                    self.run(&BodyBatterySlimmer::new(context.high_stress_threshold), records)?
                }
                MetricKind::TrainingReadinessData => {
                    self.run(&ReadinessSlimmer::new(context.readiness_pick), records)?
                }
                MetricKind::DailyHrv => self.run(&HrvSlimmer, records)?,
                MetricKind::DailySleepData => self.run(&SleepSlimmer, records)?,
                MetricKind::Activity => self.run(&ActivitySlimmer, records)?,
            };

            digest.document.insert(kind.as_str(), value);
            digest.reports.insert(kind, report);
        }

        for (name, payload) in parsed.passthrough {
            if self.config.passthrough_unknown && self.config.is_enabled(&name) {
                debug!(metric = %name, "passing metric through unchanged");
                digest.document.insert(name.clone(), payload);
                digest.passed_through.push(name);
            } else {
                debug!(metric = %name, "dropping metric without a slimmer");
                digest.dropped.push(name);
            }
        }

        // Stage 3 happens in the encoder; report the shape here
        info!(
            metrics = digest.document.len(),
            passed_through = digest.passed_through.len(),
            dropped = digest.dropped.len(),
            "digest built"
        );

        Ok(digest)
    }

    fn run<S: Slimmer>(&self, slimmer: &S, records: Vec<Value>) -> Result<(Value, MetricReport), DigestError> {
        let records_in = records.len();
        let (raws, skipped_records) = GarminAdapter::typed::<S::Raw>(records);

        let mut quality = SlimReport::default();
        let slimmed = slimmer.slim_list(raws, &mut quality);

        let report = MetricReport {
            records_in,
            records_out: slimmed.len(),
            skipped_records,
            malformed_values: quality.malformed_values,
            unreadable_timestamps: quality.unreadable_timestamps,
            dropped_records: quality.dropped_records,
        };

        debug!(
            metric = %slimmer.metric(),
            records_in,
            records_out = report.records_out,
            "slimmed metric"
        );
        if report.has_bad_input() {
            warn!(
                metric = %slimmer.metric(),
                skipped_records,
                malformed_values = report.malformed_values,
                unreadable_timestamps = report.unreadable_timestamps,
                "input contained malformed data"
            );
        }

        Ok((self.encoder.to_value(&slimmed)?, report))
    }
}
