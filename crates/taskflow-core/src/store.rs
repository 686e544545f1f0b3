//! In-memory record store: the client-side cache of both collections.

use crate::calendar::Event;
use crate::record::Record;
use crate::task::Task;

/// Ordered collection of one record kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<R> {
    items: Vec<R>,
}

impl<R> Default for Collection<R> {
    fn default() -> Self {
        Collection { items: Vec::new() }
    }
}

impl<R: Record> Collection<R> {
    pub fn new(items: Vec<R>) -> Self {
        Collection { items }
    }

    pub fn as_slice(&self) -> &[R] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.items.iter().find(|r| r.id() == id)
    }

    /// Replace the whole collection.
    pub fn reset(&mut self, items: Vec<R>) {
        self.items = items;
    }

    pub fn push(&mut self, record: R) {
        self.items.push(record);
    }

    /// Swap in a new version of an existing record, keeping its position.
    /// Returns `false` when no record has that id.
    pub fn replace(&mut self, record: R) -> bool {
        match self.items.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<R> {
        let index = self.items.iter().position(|r| r.id() == id)?;
        Some(self.items.remove(index))
    }

    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|r| r.id().to_string()).collect()
    }
}

/// Tasks and events held by one application context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    pub tasks: Collection<Task>,
    pub events: Collection<Event>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}
