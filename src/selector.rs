//! Per-day record selection
//!
//! Providers may return several snapshots for one calendar date (a readiness
//! score is recomputed during the morning, for example). The selector keeps
//! exactly one record per date according to a [`PickPolicy`].
//!
//! Replacement rules for a date that already holds a record:
//! - a timestamped candidate replaces a timestamped holder only when it is
//!   strictly later (`latest`) or strictly earlier (`earliest`)
//! - a timestamped candidate always replaces an untimestamped holder
//! - an untimestamped candidate never replaces anything, so between two
//!   untimestamped records the first one seen is kept

use crate::timestamp::TimestampParse;
use crate::types::PickPolicy;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// A record that can be grouped by calendar date and ordered by local time
pub trait DatedRecord {
    /// Calendar date key (`YYYY-MM-DD`), if the record has one
    fn calendar_date(&self) -> Option<&str>;

    /// Local timestamp used to rank same-date records
    fn local_timestamp(&self) -> TimestampParse;
}

/// Keep one record per calendar date, ordered by date ascending.
///
/// Records without a calendar date are skipped.
pub fn select_per_day<R: DatedRecord>(records: Vec<R>, pick: PickPolicy) -> Vec<R> {
    let mut by_date: BTreeMap<String, (R, Option<NaiveDateTime>)> = BTreeMap::new();

    for record in records {
        let Some(date) = record.calendar_date().map(str::to_string) else {
            continue;
        };
        let ts = record.local_timestamp().value();

        let held = by_date.get(&date).map(|(_, held_ts)| *held_ts);
        match held {
            None => {
                by_date.insert(date, (record, ts));
            }
            Some(held_ts) if replaces(ts, held_ts, pick) => {
                by_date.insert(date, (record, ts));
            }
            Some(_) => {}
        }
    }

    by_date.into_values().map(|(record, _)| record).collect()
}

fn replaces(candidate: Option<NaiveDateTime>, held: Option<NaiveDateTime>, pick: PickPolicy) -> bool {
    match (candidate, held) {
        (Some(candidate), Some(held)) => match pick {
            PickPolicy::Latest => candidate > held,
            PickPolicy::Earliest => candidate < held,
        },
        (Some(_), None) => true,
        (None, _) => false,
    }
}
