//! SQLite table storage behind the HTTP API.
//!
//! One table per record kind. Lists come back in API order: tasks newest
//! first, events by date then start time.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;

use crate::calendar::{Event, EventPatch, NewEvent};
use crate::datetime::{parse_date_field, parse_timestamp, ClockTime};
use crate::error::{DatabaseError, ValidationError};
use crate::record::{new_record_id, EntityKind};
use crate::task::{NewTask, Task, TaskPatch};

use super::migrations;

const TASK_COLUMNS: &str =
    "id, title, description, assignee, status, priority, deadline, created_at, updated_at";

const EVENT_COLUMNS: &str = "id, title, description, event_date, start_time, end_time, \
     location, color, reminder, created_at, updated_at";

/// SQLite database holding the task and event tables.
pub struct Database {
    conn: Connection,
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ValidationError>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn optional_clock(row: &Row, idx: usize) -> rusqlite::Result<Option<ClockTime>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) if !raw.trim().is_empty() => raw.parse().map(Some).map_err(|e| conversion_error(idx, e)),
        _ => Ok(None),
    }
}

fn date_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    parse_date_field("date", &raw).map_err(|e| conversion_error(idx, e))
}

fn optional_date(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) if !raw.trim().is_empty() => parse_date_field("deadline", &raw)
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
        _ => Ok(None),
    }
}

fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw)
        .ok_or_else(|| conversion_error(idx, ValidationError::invalid("timestamp", raw.clone())))
}

/// Current time at the precision timestamps are stored with.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        assignee: row.get(3)?,
        status: parse_column(row, 4)?,
        priority: parse_column(row, 5)?,
        deadline: optional_date(row, 6)?,
        created_at: timestamp_column(row, 7)?,
        updated_at: timestamp_column(row, 8)?,
    })
}

fn row_to_event(row: &Row) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        date: date_column(row, 3)?,
        start_time: optional_clock(row, 4)?,
        end_time: optional_clock(row, 5)?,
        location: row.get(6)?,
        color: row.get(7)?,
        reminder: row.get(8)?,
        created_at: timestamp_column(row, 9)?,
        updated_at: timestamp_column(row, 10)?,
    })
}

fn supplied_id(id: &Option<String>) -> String {
    id.as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map_or_else(new_record_id, str::to_string)
}

impl Database {
    /// Open (or create) the database at `path` and apply migrations.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // --- tasks ---

    pub fn list_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, rowid DESC"
        ))?;
        let tasks = stmt
            .query_map([], row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>, DatabaseError> {
        let task = self
            .conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    /// Insert a new task, keeping a supplied id or generating one.
    pub fn insert_task(&self, input: &NewTask) -> Result<Task, DatabaseError> {
        let id = supplied_id(&input.id);
        if self.get_task(&id)?.is_some() {
            return Err(DatabaseError::Duplicate {
                entity: EntityKind::Task,
                id,
            });
        }
        let task = input.clone().into_task(id, now());
        self.conn.execute(
            &format!("INSERT INTO tasks ({TASK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                task.id,
                task.title,
                task.description,
                task.assignee,
                task.status.as_str(),
                task.priority.as_str(),
                task.deadline.map(|d| d.to_string()),
                format_timestamp(&task.created_at),
                format_timestamp(&task.updated_at),
            ],
        )?;
        Ok(task)
    }

    /// Apply a patch to an existing task and return the stored result.
    pub fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, DatabaseError> {
        let mut task = self.get_task(id)?.ok_or_else(|| DatabaseError::NotFound {
            entity: EntityKind::Task,
            id: id.to_string(),
        })?;
        patch.apply(&mut task, now());
        self.conn.execute(
            "UPDATE tasks SET title = ?2, description = ?3, assignee = ?4, status = ?5,
                priority = ?6, deadline = ?7, updated_at = ?8
             WHERE id = ?1",
            params![
                task.id,
                task.title,
                task.description,
                task.assignee,
                task.status.as_str(),
                task.priority.as_str(),
                task.deadline.map(|d| d.to_string()),
                format_timestamp(&task.updated_at),
            ],
        )?;
        Ok(task)
    }

    pub fn delete_task(&self, id: &str) -> Result<(), DatabaseError> {
        let removed = self.conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(DatabaseError::NotFound {
                entity: EntityKind::Task,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    // --- events ---

    pub fn list_events(&self) -> Result<Vec<Event>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY event_date ASC, start_time ASC, rowid ASC"
        ))?;
        let events = stmt
            .query_map([], row_to_event)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    pub fn get_event(&self, id: &str) -> Result<Option<Event>, DatabaseError> {
        let event = self
            .conn
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
                params![id],
                row_to_event,
            )
            .optional()?;
        Ok(event)
    }

    pub fn insert_event(&self, input: &NewEvent) -> Result<Event, DatabaseError> {
        let id = supplied_id(&input.id);
        if self.get_event(&id)?.is_some() {
            return Err(DatabaseError::Duplicate {
                entity: EntityKind::Event,
                id,
            });
        }
        let event = input
            .clone()
            .into_event(id, now())
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.conn.execute(
            &format!(
                "INSERT INTO events ({EVENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                event.id,
                event.title,
                event.description,
                event.date.to_string(),
                event.start_time.map(|t| t.to_string()),
                event.end_time.map(|t| t.to_string()),
                event.location,
                event.color,
                event.reminder,
                format_timestamp(&event.created_at),
                format_timestamp(&event.updated_at),
            ],
        )?;
        Ok(event)
    }

    pub fn update_event(&self, id: &str, patch: &EventPatch) -> Result<Event, DatabaseError> {
        let mut event = self.get_event(id)?.ok_or_else(|| DatabaseError::NotFound {
            entity: EntityKind::Event,
            id: id.to_string(),
        })?;
        patch.apply(&mut event, now());
        self.conn.execute(
            "UPDATE events SET title = ?2, description = ?3, event_date = ?4, start_time = ?5,
                end_time = ?6, location = ?7, color = ?8, reminder = ?9, updated_at = ?10
             WHERE id = ?1",
            params![
                event.id,
                event.title,
                event.description,
                event.date.to_string(),
                event.start_time.map(|t| t.to_string()),
                event.end_time.map(|t| t.to_string()),
                event.location,
                event.color,
                event.reminder,
                format_timestamp(&event.updated_at),
            ],
        )?;
        Ok(event)
    }

    pub fn delete_event(&self, id: &str) -> Result<(), DatabaseError> {
        let removed = self.conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(DatabaseError::NotFound {
                entity: EntityKind::Event,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
