//! Timeline construction
//!
//! Timelines express a series relative to an anchor (an event or sleep start)
//! as `[offset_minutes, label]` entries. Two shapes are produced here:
//! - run-length compressed label timelines (sleep stages)
//! - adaptive stress / body battery timelines that stay at full resolution
//!   only when stress crosses the configured threshold
//!
//! Samples that precede the anchor are dropped from the entries, never
//! clamped to zero. Stress recorded before the anchor still counts when an
//! event timeline picks its resolution.

use crate::types::{SeriesPoint, TimelineEntry, TimelineMode, TimelineValues};
use std::collections::BTreeMap;

/// Milliseconds per minute
pub const MINUTE_MS: i64 = 60_000;

/// Bucket width for low-stress event timelines
pub const EVENT_BUCKET_MINUTES: i64 = 30;

/// Signed whole minutes from `anchor_ms` to `ts_ms`, floored. `None` when
/// the distance does not fit in an `i64`.
pub fn signed_offset_minutes(ts_ms: i64, anchor_ms: i64) -> Option<i64> {
    Some(ts_ms.checked_sub(anchor_ms)?.div_euclid(MINUTE_MS))
}

/// Whole minutes from `anchor_ms` to `ts_ms`, or `None` if the sample is
/// before the anchor
pub fn offset_minutes(ts_ms: i64, anchor_ms: i64) -> Option<i64> {
    signed_offset_minutes(ts_ms, anchor_ms).filter(|offset| *offset >= 0)
}

/// Start of the fixed-width bucket holding `offset`
pub fn bucket(offset: i64, width: i64) -> i64 {
    if width <= 1 {
        return offset;
    }
    offset.div_euclid(width) * width
}

/// Run-length compress an ordered timeline.
///
/// An entry at the same offset as the last emitted one overwrites its label;
/// an entry at a new offset is kept only when its label differs from the
/// last emitted label.
pub fn compress<L, I>(entries: I) -> Vec<TimelineEntry<L>>
where
    L: PartialEq,
    I: IntoIterator<Item = TimelineEntry<L>>,
{
    let mut compressed: Vec<TimelineEntry<L>> = Vec::new();
    for entry in entries {
        match compressed.last_mut() {
            Some(last) if last.offset_min == entry.offset_min => last.label = entry.label,
            Some(last) if last.label == entry.label => {}
            _ => compressed.push(entry),
        }
    }
    compressed
}

/// Label in effect at `offset` when playing a compressed timeline back
pub fn label_at<L>(timeline: &[TimelineEntry<L>], offset: i64) -> Option<&L> {
    timeline
        .iter()
        .take_while(|entry| entry.offset_min <= offset)
        .last()
        .map(|entry| &entry.label)
}

/// Build a compressed label timeline from absolute samples.
///
/// Each `(ts_ms, label)` is converted to an offset from `anchor_ms`, samples
/// before the anchor are dropped, offsets are floored to `bucket_minutes`,
/// entries are stably sorted by offset and then compressed.
pub fn anchored_timeline<L, I>(anchor_ms: i64, samples: I, bucket_minutes: i64) -> Vec<TimelineEntry<L>>
where
    L: PartialEq,
    I: IntoIterator<Item = (i64, L)>,
{
    let mut entries: Vec<TimelineEntry<L>> = samples
        .into_iter()
        .filter_map(|(ts, label)| {
            offset_minutes(ts, anchor_ms)
                .map(|offset| TimelineEntry::new(bucket(offset, bucket_minutes), label))
        })
        .collect();
    entries.sort_by_key(|entry| entry.offset_min);
    compress(entries)
}

/// Stress / body battery timeline around one event
#[derive(Debug, Clone, PartialEq)]
pub struct EventTimeline {
    pub mode: TimelineMode,
    pub entries: Vec<TimelineEntry<TimelineValues>>,
}

/// Builder for adaptive event timelines
#[derive(Debug, Clone)]
pub struct EventTimelineBuilder {
    high_stress_threshold: f64,
    bucket_minutes: i64,
}

impl EventTimelineBuilder {
    /// Create a builder that keeps full resolution when stress exceeds
    /// `high_stress_threshold`
    pub fn new(high_stress_threshold: f64) -> Self {
        Self {
            high_stress_threshold,
            bucket_minutes: EVENT_BUCKET_MINUTES,
        }
    }

    /// Override the low-stress bucket width
    pub fn with_bucket_minutes(mut self, bucket_minutes: i64) -> Self {
        self.bucket_minutes = bucket_minutes.max(1);
        self
    }

    /// Merge both series around `anchor_ms` and pick the resolution.
    ///
    /// The resolution follows the highest stress value in the whole series,
    /// including samples before the anchor; the entries only cover samples at
    /// or after it.
    pub fn build(
        &self,
        anchor_ms: i64,
        stress: &[SeriesPoint],
        body_battery: &[SeriesPoint],
    ) -> EventTimeline {
        let max_stress = stress
            .iter()
            .filter_map(|point| point.value)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));
        let merged = merge_series(anchor_ms, stress, body_battery);
        let high_stress = max_stress.is_some_and(|max| max > self.high_stress_threshold);

        if high_stress {
            let entries = merged
                .into_iter()
                .filter_map(|(ts, values)| {
                    offset_minutes(ts, anchor_ms).map(|offset| TimelineEntry::new(offset, values))
                })
                .collect();
            return EventTimeline {
                mode: TimelineMode::Full,
                entries,
            };
        }

        let mut buckets: BTreeMap<i64, TimelineValues> = BTreeMap::new();
        for (ts, values) in merged {
            let Some(offset) = offset_minutes(ts, anchor_ms) else {
                continue;
            };
            let slot = buckets.entry(bucket(offset, self.bucket_minutes)).or_default();
            if values.bb.is_some() {
                slot.bb = values.bb;
            }
            if values.stress.is_some() {
                slot.stress = values.stress;
            }
        }

        EventTimeline {
            mode: TimelineMode::Bucketed(self.bucket_minutes),
            entries: buckets
                .into_iter()
                .map(|(offset, values)| TimelineEntry::new(offset, values))
                .collect(),
        }
    }
}

/// Sparse merge keyed by timestamp.
///
/// Only non-null samples at or after the anchor contribute, so a null and a
/// value delivered at the same timestamp resolve to the value whatever their
/// order. Timestamps where neither series has a value are absent.
fn merge_series(
    anchor_ms: i64,
    stress: &[SeriesPoint],
    body_battery: &[SeriesPoint],
) -> BTreeMap<i64, TimelineValues> {
    let mut merged: BTreeMap<i64, TimelineValues> = BTreeMap::new();

    let in_window = |point: &SeriesPoint| -> Option<(i64, f64)> {
        let ts = point.ts?;
        let value = point.value?;
        offset_minutes(ts, anchor_ms).map(|_| (ts, value))
    };

    for (ts, value) in stress.iter().filter_map(in_window) {
        merged.entry(ts).or_default().stress = Some(value);
    }
    for (ts, value) in body_battery.iter().filter_map(in_window) {
        merged.entry(ts).or_default().bb = Some(value);
    }

    merged
}
