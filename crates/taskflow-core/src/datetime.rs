//! Calendar dates and clock times as they appear on the wire.
//!
//! Records written by older clients and by SQL backends are not uniform:
//! dates may carry a time-of-day component, clock times may carry seconds, and
//! "no value" is sometimes an empty string. The helpers here normalise all of
//! those into `NaiveDate` / [`ClockTime`].

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Wall-clock time with minute precision, written as zero-padded `HH:MM`.
///
/// Ordering is chronological, which for the zero-padded text form is the same
/// as lexicographic ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Build from hour and minute; `None` when out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(ClockTime)
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// 12-hour rendering, e.g. `9:05 AM`, `12:30 PM`.
    pub fn to_12h(&self) -> String {
        let (pm, hour) = self.0.hour12();
        format!("{}:{:02} {}", hour, self.minute(), if pm { "PM" } else { "AM" })
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map(|t| ClockTime(t.with_second(0).unwrap_or(t)))
            .map_err(|_| ValidationError::invalid("time", format!("expected HH:MM, got '{s}'")))
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Extract the calendar date from a date or date-time string.
///
/// Accepts `YYYY-MM-DD`, naive date-times (`2024-03-15T23:00:00`,
/// `2024-03-15 23:00:00`, optional fractional seconds) and RFC 3339
/// timestamps. Zoned timestamps are converted to the local time zone before the
/// date is taken.
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

/// Parse a user-supplied date, reporting the field name on failure.
pub fn parse_date_field(field: &str, s: &str) -> Result<NaiveDate, ValidationError> {
    parse_calendar_date(s)
        .ok_or_else(|| ValidationError::invalid(field, format!("expected YYYY-MM-DD, got '{s}'")))
}

/// Parse a record timestamp: RFC 3339, or SQL `YYYY-MM-DD HH:MM:SS` taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc())
}

pub(crate) fn de_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: '{raw}'")))
}

/// `null` text columns decode as the empty string.
pub(crate) fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub(crate) fn de_calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: '{raw}'")))
}

pub(crate) fn de_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match non_empty(Option::<String>::deserialize(deserializer)?) {
        None => Ok(None),
        Some(raw) => parse_calendar_date(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid date: '{raw}'"))),
    }
}

pub(crate) fn de_optional_clock<'de, D>(deserializer: D) -> Result<Option<ClockTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match non_empty(Option::<String>::deserialize(deserializer)?) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Patch form of [`de_optional_date`]: a present key (even `null`) yields `Some`.
pub(crate) fn de_patch_date<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    de_optional_date(deserializer).map(Some)
}

pub(crate) fn de_patch_clock<'de, D>(
    deserializer: D,
) -> Result<Option<Option<ClockTime>>, D::Error>
where
    D: Deserializer<'de>,
{
    de_optional_clock(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn clock_time_parses_minutes_and_seconds() {
        let t: ClockTime = "09:30".parse().unwrap();
        assert_eq!(t.to_string(), "09:30");
        let t: ClockTime = "14:05:59".parse().unwrap();
        assert_eq!(t.to_string(), "14:05");
        assert!("25:00".parse::<ClockTime>().is_err());
        assert!("noon".parse::<ClockTime>().is_err());
    }

    #[test]
    fn clock_time_orders_chronologically() {
        let early: ClockTime = "09:00".parse().unwrap();
        let late: ClockTime = "10:00".parse().unwrap();
        assert!(early < late);
        assert!(early.to_string() < late.to_string());
    }

    #[test]
    fn clock_time_twelve_hour_format() {
        assert_eq!(ClockTime::from_hm(0, 5).unwrap().to_12h(), "12:05 AM");
        assert_eq!(ClockTime::from_hm(9, 0).unwrap().to_12h(), "9:00 AM");
        assert_eq!(ClockTime::from_hm(12, 30).unwrap().to_12h(), "12:30 PM");
        assert_eq!(ClockTime::from_hm(23, 45).unwrap().to_12h(), "11:45 PM");
    }

    #[test]
    fn calendar_date_ignores_time_of_day() {
        assert_eq!(parse_calendar_date("2024-03-15"), Some(date(2024, 3, 15)));
        assert_eq!(parse_calendar_date("2024-03-15T00:00:00"), Some(date(2024, 3, 15)));
        assert_eq!(parse_calendar_date("2024-03-15T23:00:00"), Some(date(2024, 3, 15)));
        assert_eq!(parse_calendar_date("2024-03-15 08:15:00"), Some(date(2024, 3, 15)));
        assert_eq!(parse_calendar_date("2024-03-15T23:00:00.250"), Some(date(2024, 3, 15)));
        assert_eq!(parse_calendar_date("15/03/2024"), None);
    }

    #[test]
    fn calendar_date_converts_zoned_timestamps_to_local() {
        let stamp = "2024-03-15T12:00:00+00:00";
        let expected = DateTime::parse_from_rfc3339(stamp)
            .unwrap()
            .with_timezone(&Local)
            .date_naive();
        assert_eq!(parse_calendar_date(stamp), Some(expected));
    }

    #[test]
    fn timestamps_accept_rfc3339_and_sql_forms() {
        let a = parse_timestamp("2024-03-15T10:00:00.000Z").unwrap();
        let b = parse_timestamp("2024-03-15 10:00:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "de_optional_clock")]
        start: Option<ClockTime>,
        #[serde(default, deserialize_with = "de_patch_date")]
        deadline: Option<Option<NaiveDate>>,
    }

    #[test]
    fn empty_strings_decode_as_absent() {
        let probe: Probe = serde_json::from_str(r#"{"start": "", "deadline": ""}"#).unwrap();
        assert_eq!(probe.start, None);
        assert_eq!(probe.deadline, Some(None));
    }

    #[test]
    fn patch_fields_distinguish_missing_from_null() {
        let probe: Probe = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(probe.deadline, None);
        let probe: Probe = serde_json::from_str(r#"{"deadline": null}"#).unwrap();
        assert_eq!(probe.deadline, Some(None));
        let probe: Probe = serde_json::from_str(r#"{"deadline": "2024-01-02"}"#).unwrap();
        assert_eq!(probe.deadline, Some(Some(date(2024, 1, 2))));
    }
}
