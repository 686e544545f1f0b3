//! Synchronization layer between the in-memory record store and a provider.

pub mod sync_engine;
pub mod types;


pub use sync_engine::SyncEngine;
pub use types::{Mutation, MutationKind, MutationState, SyncStatus};
