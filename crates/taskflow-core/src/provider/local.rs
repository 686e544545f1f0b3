//! LocalProvider: collections kept in a [`LocalStore`] directory.
//!
//! Every operation reads the whole collection, changes it, and writes it back.
//! There is no server here, so ids and timestamps are assigned locally.

use async_trait::async_trait;
use chrono::Utc;

use super::{Provider, ProviderError, ProviderResult};
use crate::calendar::{Event, EventPatch, NewEvent};
use crate::record::{new_record_id, Record};
use crate::storage::LocalStore;
use crate::task::{NewTask, Task, TaskPatch};

pub struct LocalProvider {
    store: LocalStore,
}

impl LocalProvider {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    fn insert<R: Record>(&self, record: R) -> ProviderResult<R> {
        let mut items = self.store.load_collection::<R>();
        if items.iter().any(|r| r.id() == record.id()) {
            return Err(ProviderError::Duplicate {
                entity: R::KIND,
                id: record.id().to_string(),
            });
        }
        items.push(record.clone());
        self.store.save_collection(&items)?;
        Ok(record)
    }

    fn modify<R: Record>(&self, id: &str, change: impl FnOnce(&mut R)) -> ProviderResult<R> {
        let mut items = self.store.load_collection::<R>();
        let record = items
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| ProviderError::not_found(R::KIND, id))?;
        change(record);
        let updated = record.clone();
        self.store.save_collection(&items)?;
        Ok(updated)
    }

    fn remove<R: Record>(&self, id: &str) -> ProviderResult<()> {
        let mut items = self.store.load_collection::<R>();
        let before = items.len();
        items.retain(|r| r.id() != id);
        if items.len() == before {
            return Err(ProviderError::not_found(R::KIND, id));
        }
        self.store.save_collection(&items)?;
        Ok(())
    }
}

fn assigned_id(supplied: &Option<String>) -> String {
    supplied
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map_or_else(new_record_id, str::to_string)
}

#[async_trait]
impl Provider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn list_tasks(&self) -> ProviderResult<Vec<Task>> {
        Ok(self.store.load_collection())
    }

    async fn create_task(&self, input: &NewTask) -> ProviderResult<Task> {
        let id = assigned_id(&input.id);
        self.insert(input.clone().into_task(id, Utc::now()))
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> ProviderResult<Task> {
        self.modify(id, |task: &mut Task| patch.apply(task, Utc::now()))
    }

    async fn delete_task(&self, id: &str) -> ProviderResult<()> {
        self.remove::<Task>(id)
    }

    async fn list_events(&self) -> ProviderResult<Vec<Event>> {
        Ok(self.store.load_collection())
    }

    async fn create_event(&self, input: &NewEvent) -> ProviderResult<Event> {
        let id = assigned_id(&input.id);
        let event = input
            .clone()
            .into_event(id, Utc::now())
            .map_err(|e| ProviderError::Rejected(e.to_string()))?;
        self.insert(event)
    }

    async fn update_event(&self, id: &str, patch: &EventPatch) -> ProviderResult<Event> {
        self.modify(id, |event: &mut Event| patch.apply(event, Utc::now()))
    }

    async fn delete_event(&self, id: &str) -> ProviderResult<()> {
        self.remove::<Event>(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EntityKind;
    use tempfile::TempDir;

    fn provider() -> (TempDir, LocalProvider) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        (dir, LocalProvider::new(store))
    }

    #[tokio::test]
    async fn create_keeps_supplied_id_and_generates_otherwise() {
        let (_dir, provider) = provider();
        let mut input = NewTask::new("Write docs");
        input.id = Some("fixed".into());
        assert_eq!(provider.create_task(&input).await.unwrap().id, "fixed");

        let generated = provider.create_task(&NewTask::new("Other")).await.unwrap();
        assert_eq!(generated.id.len(), 36);
        assert_eq!(provider.list_tasks().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_with_a_stored_id_is_refused() {
        let (_dir, provider) = provider();
        let mut input = NewTask::new("First");
        input.id = Some("dup".into());
        provider.create_task(&input).await.unwrap();

        input.title = "Second".into();
        let err = provider.create_task(&input).await.unwrap_err();
        assert!(matches!(err, ProviderError::Duplicate { entity: EntityKind::Task, ref id } if id == "dup"));

        let tasks = provider.list_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "First");
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (_dir, provider) = provider();
        let err = provider
            .update_task("missing", &TaskPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { entity: EntityKind::Task, .. }));
        assert!(provider.delete_event("missing").await.is_err());
        assert!(provider.list_tasks().await.unwrap().is_empty());
    }
}
