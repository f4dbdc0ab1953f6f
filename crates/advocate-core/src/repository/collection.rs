use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Collection, Event, Resource};
use crate::storage::JsonStore;

pub type ResourcesRepository = Repository<Resource>;
pub type EventsRepository = Repository<Event>;

/// Cached façade over one collection file.
///
/// Each call holds the lock for its whole read-modify-write, so mutations on
/// one repository never interleave.
pub struct Repository<T: Collection> {
    store: Arc<JsonStore>,
    cached: Mutex<Option<Vec<T>>>,
}

impl<T: Collection> Repository<T> {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self {
            store,
            cached: Mutex::new(None),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Option<Vec<T>>> {
        self.cached.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load_into(&self, cached: &mut Option<Vec<T>>) -> Vec<T> {
        if let Some(items) = cached.as_ref() {
            return items.clone();
        }
        debug!(collection = T::LABEL, "Loading collection from disk");
        let items: Vec<T> = self.store.load_items(T::FILENAME);
        *cached = Some(items.clone());
        items
    }

    fn persist(&self, cached: &mut Option<Vec<T>>, items: Vec<T>) {
        info!(collection = T::LABEL, count = items.len(), "Saving collection to disk");
        self.store.save(&items, T::FILENAME);
        *cached = Some(items);
    }

    /// All records, loading from disk on first use.
    pub fn get_all(&self) -> Vec<T> {
        let mut cached = self.guard();
        self.load_into(&mut cached)
    }

    /// Replace the whole collection.
    pub fn save_all(&self, items: Vec<T>) {
        let mut cached = self.guard();
        self.persist(&mut cached, items);
    }

    pub fn add(&self, item: T) {
        let mut cached = self.guard();
        let mut items = self.load_into(&mut cached);
        items.push(item);
        self.persist(&mut cached, items);
    }

    /// Replace the first record with the same id. Returns false (and writes nothing) if none matches.
    pub fn update(&self, item: T) -> bool {
        let mut cached = self.guard();
        let mut items = self.load_into(&mut cached);
        let Some(index) = items.iter().position(|existing| existing.id() == item.id()) else {
            debug!(collection = T::LABEL, id = %item.id(), "Update skipped, id not found");
            return false;
        };
        items[index] = item;
        self.persist(&mut cached, items);
        true
    }

    /// Remove every record with `id`. Returns how many were removed.
    pub fn delete(&self, id: Uuid) -> usize {
        let mut cached = self.guard();
        let mut items = self.load_into(&mut cached);
        let before = items.len();
        items.retain(|existing| existing.id() != id);
        let removed = before - items.len();
        self.persist(&mut cached, items);
        removed
    }

    pub fn find(&self, id: Uuid) -> Option<T> {
        self.get_all().into_iter().find(|item| item.id() == id)
    }

    /// Drop the in-memory copy and read the file again.
    pub fn reload(&self) -> Vec<T> {
        let mut cached = self.guard();
        *cached = None;
        self.load_into(&mut cached)
    }
}
