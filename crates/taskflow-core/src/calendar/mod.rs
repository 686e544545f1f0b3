//! Calendar event records and their create/patch inputs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::datetime::{
    de_calendar_date, de_optional_clock, de_optional_date, de_patch_clock, de_text, de_timestamp,
    ClockTime,
};
use crate::error::ValidationError;
use crate::record::{EntityKind, Record};

/// Color given to events created without one.
pub const DEFAULT_EVENT_COLOR: &str = "hsl(260, 70%, 55%)";

/// Reminder value meaning "no reminder".
pub const DEFAULT_REMINDER: &str = "none";

fn default_color() -> String {
    DEFAULT_EVENT_COLOR.to_string()
}

fn default_reminder() -> String {
    DEFAULT_REMINDER.to_string()
}

/// Start must be strictly before end when both are given.
pub fn validate_time_range(
    start: Option<ClockTime>,
    end: Option<ClockTime>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if start >= end => Err(ValidationError::InvalidTimeRange {
            start: start.to_string(),
            end: end.to_string(),
        }),
        _ => Ok(()),
    }
}

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "de_text")]
    pub description: String,
    /// Day the event takes place on
    #[serde(deserialize_with = "de_calendar_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "de_optional_clock")]
    pub start_time: Option<ClockTime>,
    #[serde(default, deserialize_with = "de_optional_clock")]
    pub end_time: Option<ClockTime>,
    #[serde(default, deserialize_with = "de_text")]
    pub location: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_reminder")]
    pub reminder: String,
    #[serde(deserialize_with = "de_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "de_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Both ends of the time slot, if the event has one.
    pub fn time_slot(&self) -> Option<(ClockTime, ClockTime)> {
        Some((self.start_time?, self.end_time?))
    }

    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        self.date == date
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

impl Record for Event {
    const KIND: EntityKind = EntityKind::Event;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for creating an event; also the create payload on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub title: String,
    #[serde(default, deserialize_with = "de_text")]
    pub description: String,
    #[serde(default, deserialize_with = "de_optional_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de_optional_clock")]
    pub start_time: Option<ClockTime>,
    #[serde(default, deserialize_with = "de_optional_clock")]
    pub end_time: Option<ClockTime>,
    #[serde(default, deserialize_with = "de_text")]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<String>,
}

impl NewEvent {
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        NewEvent {
            title: title.into(),
            date: Some(date),
            ..Default::default()
        }
    }

    pub fn with_times(mut self, start: ClockTime, end: ClockTime) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "Event title" });
        }
        if self.date.is_none() {
            return Err(ValidationError::MissingField { field: "Event date" });
        }
        validate_time_range(self.start_time, self.end_time)
    }

    /// Trim free text, fill in color/reminder defaults, then validate.
    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.location = self.location.trim().to_string();
        self.color = self
            .color
            .filter(|c| !c.trim().is_empty())
            .or_else(|| Some(default_color()));
        self.reminder = self
            .reminder
            .filter(|r| !r.trim().is_empty())
            .or_else(|| Some(default_reminder()));
        self.validate()?;
        Ok(self)
    }

    /// Materialize the record with the given id and creation time.
    pub fn into_event(self, id: String, now: DateTime<Utc>) -> Result<Event, ValidationError> {
        let date = self
            .date
            .ok_or(ValidationError::MissingField { field: "Event date" })?;
        Ok(Event {
            id,
            title: self.title,
            description: self.description,
            date,
            start_time: self.start_time,
            end_time: self.end_time,
            location: self.location,
            color: self.color.unwrap_or_else(default_color),
            reminder: self.reminder.unwrap_or_else(default_reminder),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update for an event. Times are tri-state like task deadlines;
/// `date` can be moved but not cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_optional_date"
    )]
    pub date: Option<NaiveDate>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_patch_clock"
    )]
    pub start_time: Option<Option<ClockTime>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_patch_clock"
    )]
    pub end_time: Option<Option<ClockTime>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.location.is_none()
            && self.color.is_none()
            && self.reminder.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.title {
            Some(title) if title.trim().is_empty() => {
                Err(ValidationError::EmptyField { field: "Event title" })
            }
            _ => Ok(()),
        }
    }

    /// Validate the patch together with the record it will be applied to,
    /// so a new end time is checked against an unchanged start time.
    pub fn validate_against(&self, current: &Event) -> Result<(), ValidationError> {
        self.validate()?;
        let start = self.start_time.unwrap_or(current.start_time);
        let end = self.end_time.unwrap_or(current.end_time);
        validate_time_range(start, end)
    }

    /// Apply the whitelisted fields and refresh `updated_at`.
    pub fn apply(&self, event: &mut Event, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            event.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            event.description = description.trim().to_string();
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(start) = self.start_time {
            event.start_time = start;
        }
        if let Some(end) = self.end_time {
            event.end_time = end;
        }
        if let Some(location) = &self.location {
            event.location = location.trim().to_string();
        }
        if let Some(color) = &self.color {
            event.color = color.clone();
        }
        if let Some(reminder) = &self.reminder {
            event.reminder = reminder.clone();
        }
        event.touch(now);
    }
}
