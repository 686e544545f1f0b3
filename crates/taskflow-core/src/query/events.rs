use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::Event;
use crate::datetime::ClockTime;

/// Default window for [`upcoming_events`].
pub const DEFAULT_UPCOMING_DAYS: u32 = 30;

/// Half-open overlap: touching endpoints do not overlap.
pub fn overlaps(a: (ClockTime, ClockTime), b: (ClockTime, ClockTime)) -> bool {
    a.0 < b.1 && a.1 > b.0
}

fn chronological(mut events: Vec<&Event>) -> Vec<&Event> {
    // untimed events sort ahead of timed ones on the same day
    events.sort_by_key(|e| (e.date, e.start_time));
    events
}

pub fn events_for_date(events: &[Event], date: NaiveDate) -> Vec<&Event> {
    events.iter().filter(|e| e.occurs_on(date)).collect()
}

/// Events dated within `from..=to`, in chronological order.
pub fn events_in_range(events: &[Event], from: NaiveDate, to: NaiveDate) -> Vec<&Event> {
    chronological(
        events
            .iter()
            .filter(|e| e.date >= from && e.date <= to)
            .collect(),
    )
}

/// Events from `today` through `today + horizon_days`, ordered by date then start time.
///
/// This is a total order: on the same day, events without a start time come
/// before timed ones instead of keeping their input order.
pub fn upcoming_events(events: &[Event], today: NaiveDate, horizon_days: u32) -> Vec<&Event> {
    let end = today
        .checked_add_days(Days::new(u64::from(horizon_days)))
        .unwrap_or(NaiveDate::MAX);
    events_in_range(events, today, end)
}

/// Timed events on `date` that overlap the candidate slot.
///
/// Returns nothing unless both candidate times are given. Events without a
/// complete slot and the event named by `exclude_id` never conflict.
pub fn check_conflicts<'a>(
    events: &'a [Event],
    date: NaiveDate,
    start: Option<ClockTime>,
    end: Option<ClockTime>,
    exclude_id: Option<&str>,
) -> Vec<&'a Event> {
    let (Some(start), Some(end)) = (start, end) else {
        return Vec::new();
    };
    events
        .iter()
        .filter(|e| e.occurs_on(date))
        .filter(|e| exclude_id != Some(e.id.as_str()))
        .filter(|e| e.time_slot().is_some_and(|slot| overlaps((start, end), slot)))
        .collect()
}

/// Case-insensitive match on title, description or location. Blank query matches all.
pub fn search_events<'a>(events: &'a [Event], query: &str) -> Vec<&'a Event> {
    let needle = query.trim().to_lowercase();
    events
        .iter()
        .filter(|e| {
            needle.is_empty()
                || e.title.to_lowercase().contains(&needle)
                || e.description.to_lowercase().contains(&needle)
                || e.location.to_lowercase().contains(&needle)
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total: usize,
    /// Events in the default upcoming window
    pub upcoming: usize,
    pub today: usize,
    /// Event count per `YYYY-MM`
    pub by_month: BTreeMap<String, usize>,
}

pub fn event_stats(events: &[Event], today: NaiveDate) -> EventStats {
    let mut by_month = BTreeMap::new();
    for event in events {
        let month = format!("{:04}-{:02}", event.date.year(), event.date.month());
        *by_month.entry(month).or_insert(0) += 1;
    }
    EventStats {
        total: events.len(),
        upcoming: upcoming_events(events, today, DEFAULT_UPCOMING_DAYS).len(),
        today: events_for_date(events, today).len(),
        by_month,
    }
}
