//! Persistence providers.
//!
//! A [`Provider`] is the source of truth for both collections. Two
//! implementations share one contract and are chosen once at startup:
//!
//! - [`RemoteProvider`]: the HTTP+JSON CRUD API
//! - [`LocalProvider`]: JSON collections in a local directory
//!
//! Both fail `update_*` / `delete_*` with [`ProviderError::NotFound`] for an
//! unknown id and never create a record in that case. The local provider
//! refuses a `create_*` whose id is already stored with
//! [`ProviderError::Duplicate`]; the server answers 409 for the same case.

mod local;
mod remote;

pub use local::LocalProvider;
pub use remote::{RemoteProvider, DEFAULT_TIMEOUT};

use async_trait::async_trait;
use thiserror::Error;

use crate::calendar::{Event, EventPatch, NewEvent};
use crate::error::CoreError;
use crate::record::EntityKind;
use crate::task::{NewTask, Task, TaskPatch};

/// Provider-level failures.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Mutation target does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    /// Create named an id that is already stored
    #[error("{entity} already exists: {id}")]
    Duplicate { entity: EntityKind, id: String },

    /// Server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Server answered `success: false`
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Request could not be sent or completed
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Base URL could not be parsed or joined
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Response body was not the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Local storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ProviderError {
    pub(crate) fn not_found(entity: EntityKind, id: &str) -> Self {
        ProviderError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Local storage failures surface as `Storage`.
impl From<CoreError> for ProviderError {
    fn from(err: CoreError) -> Self {
        ProviderError::Storage(err.to_string())
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// CRUD over the task and event collections.
///
/// Inputs arrive already validated by the caller; `create_*` returns the
/// authoritative record, which may differ from the input in id or timestamps.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short name for logs ("remote", "local").
    fn name(&self) -> &str;

    async fn list_tasks(&self) -> ProviderResult<Vec<Task>>;

    async fn create_task(&self, input: &NewTask) -> ProviderResult<Task>;

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> ProviderResult<Task>;

    async fn delete_task(&self, id: &str) -> ProviderResult<()>;

    async fn list_events(&self) -> ProviderResult<Vec<Event>>;

    async fn create_event(&self, input: &NewEvent) -> ProviderResult<Event>;

    async fn update_event(&self, id: &str, patch: &EventPatch) -> ProviderResult<Event>;

    async fn delete_event(&self, id: &str) -> ProviderResult<()>;
}
