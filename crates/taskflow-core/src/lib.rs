//! # TaskFlow Core Library
//!
//! This library provides the data layer of TaskFlow, a task and calendar
//! event manager. The CLI and the HTTP API server are thin layers over it.
//!
//! ## Architecture
//!
//! - **Records**: [`Task`] and [`Event`], created from validated inputs and
//!   changed only through whitelisted patches
//! - **Providers**: one [`Provider`] trait with a remote (HTTP) and a local
//!   (JSON files) implementation, chosen at startup
//! - **Queries**: pure filtering, sorting, windowing and conflict detection
//! - **Sync**: [`SyncEngine`] validates, calls the provider and reconciles the
//!   in-memory [`RecordStore`]
//! - **Storage**: TOML configuration, the local JSON store, and the SQLite
//!   tables behind the HTTP API
//!
//! ## Key Components
//!
//! - [`SyncEngine`]: application context owning the store and the provider
//! - [`Database`]: SQLite tables served by the API
//! - [`Config`]: Application configuration management

pub mod calendar;
pub mod datetime;
pub mod error;
pub mod provider;
pub mod query;
pub mod record;
pub mod storage;
pub mod store;
pub mod sync;
pub mod task;

pub use calendar::{Event, EventPatch, NewEvent, DEFAULT_EVENT_COLOR, DEFAULT_REMINDER};
pub use datetime::ClockTime;
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use provider::{LocalProvider, Provider, ProviderError, RemoteProvider};
pub use record::{new_record_id, EntityKind, Record};
pub use storage::{Config, Database, LocalStore, ProviderMode};
pub use store::RecordStore;
pub use sync::{MutationState, SyncEngine, SyncStatus};
pub use task::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
