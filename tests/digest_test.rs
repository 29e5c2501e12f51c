//! End-to-end tests over collected provider documents

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use synheart_digest::{
    garmin_to_digest, slim_document, DigestConfig, DigestError, DigestProcessor, MetricConfig, MetricKind,
    OutputStyle, PickPolicy,
};

// 2024-05-01T07:00:00Z
const EVENT_START: i64 = 1_714_546_800_000;
const MINUTE: i64 = 60_000;

fn at(minutes: i64) -> i64 {
    EVENT_START + minutes * MINUTE
}

fn digest(document: &Value, config: &DigestConfig) -> Value {
    let output = slim_document(&document.to_string(), config).unwrap();
    serde_json::from_str(&output).unwrap()
}

fn nap_document(peak_stress: i64) -> Value {
    json!({
        "bodyBatteryData": [{
            "event": {
                "eventType": "NAP",
                "eventStartTimeGMT": "2024-05-01T07:00:00.0",
                "timezoneOffset": 7200000,
                "durationInMilliseconds": 3600000
            },
            "stressValuesArray": [
                [at(-10), 25],
                [at(0), 20],
                [at(5), peak_stress],
                [at(35), 18]
            ],
            "bodyBatteryValuesArray": [
                [at(0), "MEASURED", 40, 2.0],
                [at(35), "MEASURED", 45, 2.0]
            ]
        }]
    })
}

#[test]
fn test_readiness_keeps_one_record_per_day() {
    let document = json!({
        "training_readiness_data": [
            {"calendarDate": "2024-05-01", "timestampLocal": "2024-05-01T07:30:00.0", "score": 62, "level": "MODERATE"},
            {"calendarDate": "2024-05-01", "timestampLocal": "2024-05-01T07:00:00.0", "score": 48, "level": "LOW"},
            {"calendarDate": "2024-04-30", "timestampLocal": "2024-04-30T08:15:00.0", "score": 71, "level": "HIGH"}
        ]
    });

    let latest = digest(&document, &DigestConfig::default());
    let records = latest["training_readiness_data"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["calendar_date"], json!("2024-04-30"));
    assert_eq!(records[1]["score"], json!(62));

    let mut config = DigestConfig::default();
    config.readiness_pick = PickPolicy::Earliest;
    let earliest = digest(&document, &config);
    assert_eq!(earliest["training_readiness_data"][1]["score"], json!(48));
    assert_eq!(earliest["training_readiness_data"][1]["level"], json!("LOW"));
}

#[test]
fn test_quiet_event_is_bucketed() {
    let output = digest(&nap_document(30), &DigestConfig::default());
    let battery = &output["body_battery_data"][0];

    assert_eq!(battery["timeline_mode"], json!("bucket_30m"));
    assert_eq!(
        battery["timeline"],
        json!([[0, {"bb": 40, "stress": 30}], [30, {"bb": 45, "stress": 18}]])
    );
    assert_eq!(battery["event"]["timezone_offset_min"], json!(120));
    assert_eq!(battery["event"]["duration_s"], json!(3600));
}

#[test]
fn test_stressful_event_keeps_full_resolution() {
    let output = digest(&nap_document(75), &DigestConfig::default());
    let battery = &output["body_battery_data"][0];

    assert_eq!(battery["timeline_mode"], json!("full"));
    assert_eq!(
        battery["timeline"],
        json!([
            [0, {"bb": 40, "stress": 20}],
            [5, {"stress": 75}],
            [35, {"bb": 45, "stress": 18}]
        ])
    );
}

#[test]
fn test_threshold_is_configurable() {
    let mut config = DigestConfig::default();
    config.high_stress_threshold = 80.0;

    let output = digest(&nap_document(75), &config);
    assert_eq!(output["body_battery_data"][0]["timeline_mode"], json!("bucket_30m"));
}

#[test]
fn test_stress_before_event_start_sets_resolution_only() {
    let mut document = nap_document(30);
    document["bodyBatteryData"][0]["stressValuesArray"][0] = json!([at(-10), 90]);

    let output = digest(&document, &DigestConfig::default());
    let battery = &output["body_battery_data"][0];

    assert_eq!(battery["timeline_mode"], json!("full"));
    assert_eq!(
        battery["timeline"],
        json!([
            [0, {"bb": 40, "stress": 20}],
            [5, {"stress": 30}],
            [35, {"bb": 45, "stress": 18}]
        ])
    );
    assert_eq!(battery["stress_series_summary"]["max"], json!(90));
    assert_eq!(battery["stress_series_summary"]["peak"], json!({"ts": at(-10), "value": 90}));
}

#[test]
fn test_extreme_sample_timestamps_are_unreadable() {
    let document = json!({
        "body_battery_data": [{
            "event": {"eventType": "NAP", "eventStartTimeGMT": "1969-12-31T23:00:00Z"},
            "stressValuesArray": [[i64::MAX, 40], [0, 20], [1e300, 30]]
        }]
    });

    let digest = DigestProcessor::default().digest(&document.to_string()).unwrap();
    assert_eq!(digest.reports[&MetricKind::BodyBatteryData].unreadable_timestamps, 2);

    let battery = &digest.document.get("body_battery_data").unwrap()[0];
    assert_eq!(battery["timeline_mode"], json!("bucket_30m"));
    assert_eq!(battery["timeline"], json!([[60, {"stress": 20}]]));
}

#[test]
fn test_heart_rate_series_summary() {
    let document = json!({
        "daily_heart_rate": {
            "calendarDate": "2024-05-01",
            "restingHeartRate": 52,
            "heartRateValues": [[at(0), 60], [at(1), null], [at(2), 80], [at(3), 80]]
        }
    });

    let output = digest(&document, &DigestConfig::default());
    let day = &output["daily_heart_rate"][0];

    assert_eq!(day["resting_heart_rate"], json!(52));
    assert_eq!(
        day["series_summary"],
        json!({
            "samples_count": 4,
            "missing_count": 1,
            "avg": 73.33,
            "p95": 80,
            "min": 60,
            "max": 80,
            "peak": {"ts": at(2), "value": 80}
        })
    );
}

#[test]
fn test_unknown_metrics_pass_through() {
    let document = json!({
        "weeklyIntensityMinutes": [{"calendarDate": "2024-05-01", "moderateValue": 45}],
        "daily_hrv": [{"calendarDate": "2024-05-01", "weeklyAvg": 48}]
    });

    let output = digest(&document, &DigestConfig::default());
    assert_eq!(
        output["weeklyIntensityMinutes"],
        json!([{"calendarDate": "2024-05-01", "moderateValue": 45}])
    );

    let mut config = DigestConfig::default();
    config.passthrough_unknown = false;
    let output = digest(&document, &config);
    assert!(output.get("weeklyIntensityMinutes").is_none());
    assert_eq!(output["daily_hrv"][0]["weekly_avg"], json!(48));
}

#[test]
fn test_disabled_metric_is_left_out() {
    let mut config = DigestConfig::default();
    config.metrics.insert(
        "daily_hrv".to_string(),
        MetricConfig {
            enabled: false,
            days: None,
        },
    );

    let processor = DigestProcessor::with_style(config, OutputStyle::Compact);
    let digest = processor
        .digest(r#"{"daily_hrv": [{"calendarDate": "2024-05-01"}], "daily_stress": []}"#)
        .unwrap();

    assert_eq!(digest.document.metric_names().collect::<Vec<_>>(), vec!["daily_stress"]);
    assert_eq!(digest.dropped, vec!["daily_hrv".to_string()]);
    assert_eq!(digest.reports[&MetricKind::DailyStress].records_out, 0);
}

#[test]
fn test_output_keys_are_sorted() {
    let output = garmin_to_digest(
        json!({
            "training_readiness_data": [],
            "activity": [],
            "daily_stress": []
        })
        .to_string(),
    )
    .unwrap();

    let activity = output.find("\"activity\"").unwrap();
    let stress = output.find("\"daily_stress\"").unwrap();
    let readiness = output.find("\"training_readiness_data\"").unwrap();
    assert!(activity < stress && stress < readiness);
}

#[test]
fn test_malformed_input_is_counted_not_fatal() {
    let document = json!({
        "daily_heart_rate": [
            {"calendarDate": "2024-05-01", "heartRateValues": [[at(0), "n/a"], [at(1), 70], "garbage"]},
            42
        ]
    });

    let digest = DigestProcessor::default().digest(&document.to_string()).unwrap();
    let report = digest.reports[&MetricKind::DailyHeartRate];

    assert_eq!(report.records_in, 2);
    assert_eq!(report.skipped_records, 1);
    assert_eq!(report.malformed_values, 2);
    assert_eq!(
        digest.document.get("daily_heart_rate").unwrap()[0]["series_summary"]["missing_count"],
        json!(2)
    );
}

#[test]
fn test_document_errors() {
    assert!(matches!(
        slim_document("[1, 2, 3]", &DigestConfig::default()),
        Err(DigestError::ParseError(_))
    ));
    assert!(matches!(
        slim_document(r#"{"daily_stress": 17}"#, &DigestConfig::default()),
        Err(DigestError::UnsupportedPayload { .. })
    ));
    assert!(matches!(
        slim_document("{", &DigestConfig::default()),
        Err(DigestError::JsonError(_))
    ));
}

#[test]
fn test_config_round_trips_through_file() {
    let path = std::env::temp_dir().join(format!("synheart-digest-{}.json", std::process::id()));
    let config = DigestConfig::morning();
    config.save(&path).unwrap();

    let loaded = DigestConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, config);
    assert_eq!(loaded.days_for("daily_sleep_data"), 2);
}
