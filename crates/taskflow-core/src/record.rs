//! Shared record identity: entity kinds, the [`Record`] trait and id generation.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two record collections TaskFlow manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Task,
    Event,
}

impl EntityKind {
    /// Collection path segment on the HTTP API (`/tasks`, `/events`).
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Task => "tasks",
            EntityKind::Event => "events",
        }
    }

    /// Key of the single record in a `{success, <key>: record}` envelope.
    pub fn singular(&self) -> &'static str {
        match self {
            EntityKind::Task => "task",
            EntityKind::Event => "event",
        }
    }

    /// Key of the collection in the local durable store.
    pub fn storage_key(&self) -> &'static str {
        match self {
            EntityKind::Task => "taskflow_tasks",
            EntityKind::Event => "taskflow_events",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Task => f.write_str("Task"),
            EntityKind::Event => f.write_str("Event"),
        }
    }
}

/// A flat entity with a unique id, stored in one collection per kind.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;
}

/// Generate a record id.
///
/// Every producer of ids (sync engine, local provider, HTTP server) uses this
/// one scheme: a UUID v4 string.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
