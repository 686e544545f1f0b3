//! Core types for record synchronization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::EntityKind;

/// Lifecycle of the most recent mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationState {
    /// Nothing has been attempted yet
    #[default]
    Idle,
    /// Waiting on the provider
    Pending,
    /// Provider accepted; the store reflects the result
    Committed,
    /// Provider refused or could not be reached; the store is unchanged
    Failed,
}

/// What a mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

/// The most recent mutation and how it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    pub kind: MutationKind,
    pub entity: EntityKind,
    pub id: String,
    pub state: MutationState,
}

/// Current sync status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Provider name ("local", "remote").
    pub provider: String,
    /// Last successful full load.
    pub last_load_at: Option<DateTime<Utc>>,
    pub task_count: usize,
    pub event_count: usize,
    pub last_mutation: Option<Mutation>,
}
