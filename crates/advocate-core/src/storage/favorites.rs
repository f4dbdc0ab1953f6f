use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use uuid::Uuid;

use super::{CollectionLoad, JsonStore};

const FAVORITES_FILE: &str = "Favorites.json";

/// Legacy favorites: a JSON array of resource ids next to the collections.
pub struct FavoriteList {
    store: Arc<JsonStore>,
    lock: Mutex<()>,
}

impl FavoriteList {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Current ids, or `None` when the file exists but cannot be decoded.
    fn read(&self) -> Option<BTreeSet<Uuid>> {
        match self.store.load::<Uuid>(FAVORITES_FILE) {
            CollectionLoad::Unreadable => None,
            load => Some(load.into_items().into_iter().collect()),
        }
    }

    pub fn ids(&self) -> BTreeSet<Uuid> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.read().unwrap_or_default()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.ids().contains(&id)
    }

    /// Flip `id` in the list and persist. Returns whether it is now a favorite,
    /// or `None` when an unreadable file was left untouched.
    pub fn toggle(&self, id: Uuid) -> Option<bool> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let Some(mut ids) = self.read() else {
            warn!(id = %id, "Favorites file unreadable, not overwriting it");
            return None;
        };
        let favorited = if ids.remove(&id) {
            false
        } else {
            ids.insert(id);
            true
        };
        let ids: Vec<Uuid> = ids.into_iter().collect();
        self.store.save(&ids, FAVORITES_FILE);
        debug!(id = %id, favorited = favorited, "Toggled favorite");
        Some(favorited)
    }

    /// Empty the list, e.g. once its ids have moved elsewhere.
    pub fn clear(&self) {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.store.save::<Uuid>(&[], FAVORITES_FILE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_toggle_twice_restores_state() {
        let dir = TempDir::new().unwrap();
        let favorites = FavoriteList::new(Arc::new(JsonStore::new(dir.path().to_path_buf())));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(favorites.toggle(a), Some(true));
        assert_eq!(favorites.toggle(b), Some(true));
        assert_eq!(favorites.ids(), BTreeSet::from([a, b]));

        assert_eq!(favorites.toggle(a), Some(false));
        assert!(!favorites.contains(a));
        assert!(favorites.contains(b));
        assert_eq!(favorites.ids(), BTreeSet::from([b]));
    }

    #[test]
    fn test_unreadable_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FAVORITES_FILE);
        std::fs::write(&path, "[\"not-a-uuid\"").unwrap();
        let favorites = FavoriteList::new(Arc::new(JsonStore::new(dir.path().to_path_buf())));

        assert_eq!(favorites.toggle(Uuid::new_v4()), None);
        assert!(favorites.ids().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[\"not-a-uuid\"");
    }
}
