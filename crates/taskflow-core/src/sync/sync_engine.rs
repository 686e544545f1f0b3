//! Sync engine: keeps the record store in step with the provider.
//!
//! Every mutation validates first, then checks the id against the store,
//! then calls the provider. Only a successful provider call touches the
//! store, and then with the record the provider returned. Mutations take
//! `&mut self`, so at most one is in flight at a time.

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use super::types::{Mutation, MutationKind, MutationState, SyncStatus};
use crate::calendar::{Event, EventPatch, NewEvent};
use crate::datetime::ClockTime;
use crate::error::{CoreError, Result, ValidationError};
use crate::provider::{Provider, ProviderResult};
use crate::query::check_conflicts;
use crate::record::{new_record_id, EntityKind};
use crate::store::RecordStore;
use crate::task::{NewTask, Task, TaskPatch, TaskStatus};

/// Application context owning the in-memory store and the provider.
pub struct SyncEngine {
    provider: Box<dyn Provider>,
    store: RecordStore,
    last_mutation: Option<Mutation>,
    last_load_at: Option<chrono::DateTime<Utc>>,
}

fn not_found(entity: EntityKind, id: &str) -> CoreError {
    CoreError::NotFound {
        entity,
        id: id.to_string(),
    }
}

fn duplicate(entity: EntityKind, id: &str) -> CoreError {
    ValidationError::invalid("id", format!("{entity} already exists: {id}")).into()
}

fn no_fields() -> CoreError {
    ValidationError::invalid("patch", "No fields to update").into()
}

impl SyncEngine {
    /// Create an engine with an empty store. Call [`SyncEngine::load`] to fill it.
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self {
            provider,
            store: RecordStore::new(),
            last_mutation: None,
            last_load_at: None,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks.as_slice()
    }

    pub fn events(&self) -> &[Event] {
        self.store.events.as_slice()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.store.tasks.get(id)
    }

    pub fn event(&self, id: &str) -> Option<&Event> {
        self.store.events.get(id)
    }

    /// State of the most recent mutation.
    pub fn state(&self) -> MutationState {
        self.last_mutation
            .as_ref()
            .map_or(MutationState::Idle, |m| m.state)
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            provider: self.provider.name().to_string(),
            last_load_at: self.last_load_at,
            task_count: self.store.tasks.len(),
            event_count: self.store.events.len(),
            last_mutation: self.last_mutation.clone(),
        }
    }

    /// Replace both collections with the provider's. On failure the
    /// previous collections stay as they were.
    pub async fn load(&mut self) -> Result<()> {
        let tasks = self.provider.list_tasks().await;
        let events = self.provider.list_events().await;
        match (tasks, events) {
            (Ok(tasks), Ok(events)) => {
                info!(
                    provider = self.provider.name(),
                    tasks = tasks.len(),
                    events = events.len(),
                    "records loaded"
                );
                self.store.tasks.reset(tasks);
                self.store.events.reset(events);
                self.last_load_at = Some(Utc::now());
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(provider = self.provider.name(), error = %e, "load failed; keeping cached records");
                Err(e.into())
            }
        }
    }

    fn begin(&mut self, kind: MutationKind, entity: EntityKind, id: &str) {
        self.last_mutation = Some(Mutation {
            kind,
            entity,
            id: id.to_string(),
            state: MutationState::Pending,
        });
    }

    /// Record how the pending mutation ended and convert the provider result.
    fn settle<T>(&mut self, result: ProviderResult<T>) -> Result<T> {
        let state = if result.is_ok() {
            MutationState::Committed
        } else {
            MutationState::Failed
        };
        if let Some(mutation) = self.last_mutation.as_mut() {
            mutation.state = state;
        }
        result.map_err(|e| {
            warn!(provider = self.provider.name(), error = %e, "mutation failed");
            e.into()
        })
    }

    // --- tasks ---

    pub async fn create_task(&mut self, input: NewTask) -> Result<Task> {
        let mut input = input.normalized()?;
        let id = input.id.get_or_insert_with(new_record_id).clone();
        if self.store.tasks.contains(&id) {
            return Err(duplicate(EntityKind::Task, &id));
        }

        self.begin(MutationKind::Create, EntityKind::Task, &id);
        let result = self.provider.create_task(&input).await;
        let task = self.settle(result)?;

        if !self.store.tasks.replace(task.clone()) {
            self.store.tasks.push(task.clone());
        }
        info!(id = %task.id, "task created");
        Ok(task)
    }

    pub async fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        patch.validate()?;
        if patch.is_empty() {
            return Err(no_fields());
        }
        if !self.store.tasks.contains(id) {
            return Err(not_found(EntityKind::Task, id));
        }

        self.begin(MutationKind::Update, EntityKind::Task, id);
        let result = self.provider.update_task(id, &patch).await;
        let task = self.settle(result)?;

        self.store.tasks.replace(task.clone());
        info!(id, "task updated");
        Ok(task)
    }

    pub async fn set_task_status(&mut self, id: &str, status: TaskStatus) -> Result<Task> {
        self.update_task(id, TaskPatch::status(status)).await
    }

    pub async fn delete_task(&mut self, id: &str) -> Result<()> {
        if !self.store.tasks.contains(id) {
            return Err(not_found(EntityKind::Task, id));
        }

        self.begin(MutationKind::Delete, EntityKind::Task, id);
        let result = self.provider.delete_task(id).await;
        self.settle(result)?;

        self.store.tasks.remove(id);
        info!(id, "task deleted");
        Ok(())
    }

    /// Delete every cached task. Stops at the first failure.
    pub async fn clear_tasks(&mut self) -> Result<usize> {
        let ids = self.store.tasks.ids();
        for id in &ids {
            self.delete_task(id).await?;
        }
        Ok(ids.len())
    }

    // --- events ---

    pub async fn create_event(&mut self, input: NewEvent) -> Result<Event> {
        let mut input = input.normalized()?;
        let id = input.id.get_or_insert_with(new_record_id).clone();
        if self.store.events.contains(&id) {
            return Err(duplicate(EntityKind::Event, &id));
        }

        self.begin(MutationKind::Create, EntityKind::Event, &id);
        let result = self.provider.create_event(&input).await;
        let event = self.settle(result)?;

        if !self.store.events.replace(event.clone()) {
            self.store.events.push(event.clone());
        }
        info!(id = %event.id, "event created");
        Ok(event)
    }

    pub async fn update_event(&mut self, id: &str, patch: EventPatch) -> Result<Event> {
        patch.validate()?;
        if patch.is_empty() {
            return Err(no_fields());
        }
        let current = self
            .store
            .events
            .get(id)
            .ok_or_else(|| not_found(EntityKind::Event, id))?;
        patch.validate_against(current)?;

        self.begin(MutationKind::Update, EntityKind::Event, id);
        let result = self.provider.update_event(id, &patch).await;
        let event = self.settle(result)?;

        self.store.events.replace(event.clone());
        info!(id, "event updated");
        Ok(event)
    }

    pub async fn delete_event(&mut self, id: &str) -> Result<()> {
        if !self.store.events.contains(id) {
            return Err(not_found(EntityKind::Event, id));
        }

        self.begin(MutationKind::Delete, EntityKind::Event, id);
        let result = self.provider.delete_event(id).await;
        self.settle(result)?;

        self.store.events.remove(id);
        info!(id, "event deleted");
        Ok(())
    }

    /// Delete every cached event. Stops at the first failure.
    pub async fn clear_events(&mut self) -> Result<usize> {
        let ids = self.store.events.ids();
        for id in &ids {
            self.delete_event(id).await?;
        }
        Ok(ids.len())
    }

    /// Cached events that would clash with the given slot.
    pub fn event_conflicts_for(
        &self,
        date: NaiveDate,
        start: Option<ClockTime>,
        end: Option<ClockTime>,
        exclude_id: Option<&str>,
    ) -> Vec<&Event> {
        check_conflicts(self.store.events.as_slice(), date, start, end, exclude_id)
    }
}
