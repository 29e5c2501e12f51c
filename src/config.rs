//! Configuration for Synheart Digest
//!
//! Everything the slimmers and the collection plan need is explicit here and
//! can be loaded from a JSON file. Fields missing from the file fall back to
//! their defaults.

use crate::error::DigestError;
use crate::slimmers::SlimContext;
use crate::types::{MetricKind, PickPolicy};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Stress level above which body battery timelines keep full resolution
pub const DEFAULT_HIGH_STRESS_THRESHOLD: f64 = 50.0;

/// Lookback window for metrics without an explicit day count
pub const DEFAULT_DAYS: u32 = 14;

/// Activities are fetched by count, not by date
pub const ACTIVITY_RECORD_LIMIT: u32 = 10;

/// Per-metric collection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lookback in days; `None` uses [`DigestConfig::default_days`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
}

fn default_enabled() -> bool {
    true
}

impl MetricConfig {
    pub fn days(days: u32) -> Self {
        Self {
            enabled: true,
            days: Some(days),
        }
    }
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            days: None,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub high_stress_threshold: f64,
    pub default_days: u32,
    pub readiness_pick: PickPolicy,
    /// Keep metrics without a slimmer in the output, unchanged
    pub passthrough_unknown: bool,
    pub metrics: BTreeMap<String, MetricConfig>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            high_stress_threshold: DEFAULT_HIGH_STRESS_THRESHOLD,
            default_days: DEFAULT_DAYS,
            readiness_pick: PickPolicy::Latest,
            passthrough_unknown: true,
            metrics: MetricKind::ALL
                .iter()
                .map(|kind| (kind.as_str().to_string(), MetricConfig::default()))
                .collect(),
        }
    }
}

impl DigestConfig {
    /// Morning report: last nights, readiness and the HRV trend
    pub fn morning() -> Self {
        Self::with_metrics(&[
            (MetricKind::DailySleepData, 2),
            (MetricKind::DailyHrv, 14),
            (MetricKind::DailyHeartRate, 7),
            (MetricKind::TrainingReadinessData, 3),
            (MetricKind::Activity, 3),
            (MetricKind::BodyBatteryData, 2),
            (MetricKind::DailyStress, 2),
        ])
    }

    /// Evening report: the day's stress and load
    pub fn evening() -> Self {
        Self::with_metrics(&[
            (MetricKind::DailyStress, 2),
            (MetricKind::BodyBatteryData, 2),
            (MetricKind::Activity, 2),
            (MetricKind::DailySleepData, 2),
            (MetricKind::DailyHeartRate, 3),
            (MetricKind::DailyHrv, 3),
        ])
    }

    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Default => Self::default(),
            Preset::Morning => Self::morning(),
            Preset::Evening => Self::evening(),
        }
    }

    fn with_metrics(metrics: &[(MetricKind, u32)]) -> Self {
        Self {
            metrics: metrics
                .iter()
                .map(|(kind, days)| (kind.as_str().to_string(), MetricConfig::days(*days)))
                .collect(),
            ..Self::default()
        }
    }

    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DigestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DigestError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, DigestError> {
        let config: DigestConfig = serde_json::from_str(json)
            .map_err(|e| DigestError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, DigestError> {
        serde_json::to_string_pretty(self).map_err(|e| DigestError::EncodingError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), DigestError> {
        if !self.high_stress_threshold.is_finite() || self.high_stress_threshold < 0.0 {
            return Err(DigestError::InvalidConfig(format!(
                "high_stress_threshold must be a non-negative number, got {}",
                self.high_stress_threshold
            )));
        }
        if self.default_days == 0 {
            return Err(DigestError::InvalidConfig(
                "default_days must be at least 1".to_string(),
            ));
        }
        for (name, metric) in &self.metrics {
            if name.trim().is_empty() {
                return Err(DigestError::InvalidConfig("metric names must not be empty".to_string()));
            }
            if metric.days == Some(0) {
                return Err(DigestError::InvalidConfig(format!(
                    "days for metric {name} must be at least 1"
                )));
            }
        }
        Ok(())
    }

    /// Metrics that are not listed are enabled
    pub fn is_enabled(&self, metric: &str) -> bool {
        self.metrics.get(metric).map_or(true, |m| m.enabled)
    }

    pub fn days_for(&self, metric: &str) -> u32 {
        self.metrics
            .get(metric)
            .and_then(|m| m.days)
            .unwrap_or(self.default_days)
    }

    /// Settings threaded into the slimmers
    pub fn slim_context(&self) -> SlimContext {
        SlimContext {
            high_stress_threshold: self.high_stress_threshold,
            readiness_pick: self.readiness_pick,
        }
    }

    /// What to fetch for each enabled metric, ending at `today`
    pub fn collection_plan(&self, today: NaiveDate) -> Result<Vec<CollectionWindow>, DigestError> {
        self.validate()?;

        let mut plan = Vec::new();
        for (name, metric) in &self.metrics {
            if !metric.enabled {
                continue;
            }
            let days = self.days_for(name);

            if MetricKind::from_name(name) == Some(MetricKind::Activity) {
                plan.push(CollectionWindow {
                    metric: name.clone(),
                    days,
                    start_date: None,
                    end_date: None,
                    limit: Some(ACTIVITY_RECORD_LIMIT),
                });
                continue;
            }

            let start_date = today
                .checked_sub_days(Days::new(u64::from(days - 1)))
                .ok_or_else(|| {
                    DigestError::InvalidConfig(format!("{days} days for metric {name} reaches before the calendar"))
                })?;
            plan.push(CollectionWindow {
                metric: name.clone(),
                days,
                start_date: Some(start_date),
                end_date: Some(today),
                limit: None,
            });
        }
        Ok(plan)
    }
}

/// One fetch the collector should perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionWindow {
    pub metric: String,
    pub days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Named configuration presets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Preset {
    #[default]
    Default,
    Morning,
    Evening,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Default => "default",
            Preset::Morning => "morning",
            Preset::Evening => "evening",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Preset::Default),
            "morning" => Ok(Preset::Morning),
            "evening" => Ok(Preset::Evening),
            other => Err(format!("unknown preset '{other}' (expected default, morning or evening)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = DigestConfig::default();
        assert_eq!(config.high_stress_threshold, 50.0);
        assert_eq!(config.default_days, 14);
        assert_eq!(config.readiness_pick, PickPolicy::Latest);
        assert!(config.passthrough_unknown);
        assert_eq!(config.metrics.len(), MetricKind::ALL.len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let morning = DigestConfig::morning();
        assert_eq!(morning.days_for("daily_hrv"), 14);
        assert_eq!(morning.days_for("daily_sleep_data"), 2);
        assert_eq!(morning.metrics.len(), 7);

        let evening = DigestConfig::preset(Preset::Evening);
        assert_eq!(evening.days_for("daily_heart_rate"), 3);
        assert!(!evening.metrics.contains_key("training_readiness_data"));
    }

    #[test]
    fn test_enablement_and_days() {
        let config = DigestConfig::from_json(
            r#"{"default_days": 7, "metrics": {"daily_stress": {"enabled": false}, "daily_hrv": {"days": 30}}}"#,
        )
        .unwrap();

        assert!(!config.is_enabled("daily_stress"));
        assert!(config.is_enabled("daily_hrv"));
        assert!(config.is_enabled("weekly_steps"));
        assert_eq!(config.days_for("daily_hrv"), 30);
        assert_eq!(config.days_for("daily_stress"), 7);
        // Fields missing from the file keep their defaults
        assert_eq!(config.high_stress_threshold, 50.0);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            DigestConfig::from_json(r#"{"high_stress_threshold": -1}"#),
            Err(DigestError::InvalidConfig(_))
        ));
        assert!(matches!(
            DigestConfig::from_json(r#"{"default_days": 0}"#),
            Err(DigestError::InvalidConfig(_))
        ));
        assert!(matches!(
            DigestConfig::from_json(r#"{"metrics": {"daily_hrv": {"days": 0}}}"#),
            Err(DigestError::InvalidConfig(_))
        ));
        assert!(matches!(
            DigestConfig::from_json(r#"{"readiness_pick": "newest"}"#),
            Err(DigestError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_collection_plan() {
        let plan = DigestConfig::morning().collection_plan(date("2024-05-10")).unwrap();
        assert_eq!(plan.len(), 7);

        let activity = plan.iter().find(|w| w.metric == "activity").unwrap();
        assert_eq!(activity.limit, Some(ACTIVITY_RECORD_LIMIT));
        assert_eq!(activity.start_date, None);

        let hrv = plan.iter().find(|w| w.metric == "daily_hrv").unwrap();
        assert_eq!(hrv.start_date, Some(date("2024-04-27")));
        assert_eq!(hrv.end_date, Some(date("2024-05-10")));

        let sleep = plan.iter().find(|w| w.metric == "daily_sleep_data").unwrap();
        assert_eq!(sleep.start_date, Some(date("2024-05-09")));
    }

    #[test]
    fn test_plan_skips_disabled_metrics() {
        let mut config = DigestConfig::evening();
        config.metrics.insert(
            "daily_stress".to_string(),
            MetricConfig {
                enabled: false,
                days: Some(2),
            },
        );
        let plan = config.collection_plan(date("2024-05-10")).unwrap();
        assert!(plan.iter().all(|w| w.metric != "daily_stress"));
        assert_eq!(plan.len(), 5);
    }

    #[test]
    fn test_json_round_trip_keeps_presets() {
        let config = DigestConfig::morning();
        let restored = DigestConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("Morning".parse::<Preset>().unwrap(), Preset::Morning);
        assert!("night".parse::<Preset>().is_err());
    }
}
