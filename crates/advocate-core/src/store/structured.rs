use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::records::{uuid_column, EventSort, Order, Record, ResourceSort, SCHEMA};
use crate::models::{Event, Resource, User};

/// Schema version stored in `user_version`.
const SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Structured store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to create store directory: {0}")]
    Io(#[from] std::io::Error),
}

type Result<T> = std::result::Result<T, StoreError>;

/// SQLite-backed store with upsert-by-id semantics.
///
/// If the database cannot be opened the store stays usable and every read
/// returns an empty result.
pub struct StructuredStore {
    conn: Mutex<std::result::Result<Connection, String>>,
}

impl StructuredStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Self {
        let conn = Self::connect(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to open structured store");
            e.to_string()
        });
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// A store that lives only as long as this value, for previews and tests.
    pub fn in_memory() -> Self {
        let conn = Connection::open_in_memory()
            .map_err(StoreError::from)
            .and_then(Self::init_schema)
            .map_err(|e| e.to_string());
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn connect(path: &Path) -> Result<Connection> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init_schema(conn)
    }

    fn init_schema(conn: Connection) -> Result<Connection> {
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(conn)
    }

    fn guard(&self) -> MutexGuard<'_, std::result::Result<Connection, String>> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_conn<R>(&self, f: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        let guard = self.guard();
        match guard.as_ref() {
            Ok(conn) => f(conn),
            Err(reason) => Err(StoreError::Unavailable(reason.clone())),
        }
    }

    pub fn is_available(&self) -> bool {
        self.guard().is_ok()
    }

    // ===== Generic Operations =====

    pub fn try_upsert<T: Record>(&self, record: &T) -> Result<()> {
        self.with_conn(|conn| {
            record.upsert(conn)?;
            Ok(())
        })
    }

    /// Insert or overwrite the record with the same id. Returns false on failure (logged).
    pub fn upsert<T: Record>(&self, record: &T) -> bool {
        match self.try_upsert(record) {
            Ok(()) => {
                debug!(table = T::TABLE, id = %record.id(), "Upserted record");
                true
            }
            Err(e) => {
                error!(table = T::TABLE, id = %record.id(), error = %e, "Failed to save record");
                false
            }
        }
    }

    pub fn try_load_all<T: Record>(&self, sort: T::Sort, order: Order) -> Result<Vec<T>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&T::select_sql(sort, order))?;
            let rows = stmt.query_map([], |row| T::from_row(row))?;
            Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
        })
    }

    /// Every stored record of `T`, ordered by `sort`. Empty on failure (logged).
    pub fn load_all<T: Record>(&self, sort: T::Sort, order: Order) -> Vec<T> {
        self.try_load_all(sort, order).unwrap_or_else(|e| {
            error!(table = T::TABLE, error = %e, "Failed to load records");
            Vec::new()
        })
    }

    // ===== Resources =====

    pub fn save_resource(&self, resource: &Resource) -> bool {
        self.upsert(resource)
    }

    /// Newest first.
    pub fn load_resources(&self) -> Vec<Resource> {
        self.load_all(ResourceSort::DateAdded, Order::Descending)
    }

    pub fn try_toggle_favorite(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE resources SET is_favorite = NOT is_favorite WHERE id = ?1",
                params![id.to_string()],
            )?;
            Ok(changed > 0)
        })
    }

    /// Flip the favorite flag of resource `id`. Unknown ids are ignored.
    pub fn toggle_favorite(&self, id: Uuid) {
        match self.try_toggle_favorite(id) {
            Ok(true) => debug!(id = %id, "Toggled favorite"),
            Ok(false) => debug!(id = %id, "Favorite toggle skipped, id not found"),
            Err(e) => error!(id = %id, error = %e, "Failed to toggle favorite"),
        }
    }

    pub fn try_favorite_ids(&self) -> Result<HashSet<Uuid>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM resources WHERE is_favorite = 1")?;
            let ids = stmt.query_map([], |row| uuid_column(row, 0))?;
            Ok(ids.collect::<rusqlite::Result<HashSet<Uuid>>>()?)
        })
    }

    pub fn favorite_ids(&self) -> HashSet<Uuid> {
        self.try_favorite_ids().unwrap_or_else(|e| {
            error!(error = %e, "Failed to load favorites");
            HashSet::new()
        })
    }

    // ===== Events =====

    pub fn save_event(&self, event: &Event) -> bool {
        self.upsert(event)
    }

    /// Soonest first.
    pub fn load_events(&self) -> Vec<Event> {
        self.load_all(EventSort::Date, Order::Ascending)
    }

    // ===== User =====

    pub fn save_user(&self, user: &User) -> bool {
        self.upsert(user)
    }

    pub fn try_load_user(&self) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM {} LIMIT 1",
                <User as Record>::COLUMNS,
                <User as Record>::TABLE
            ))?;
            let mut rows = stmt.query_map([], |row| User::from_row(row))?;
            let user = rows.next().transpose()?;
            Ok(user)
        })
    }

    pub fn load_user(&self) -> Option<User> {
        self.try_load_user().unwrap_or_else(|e| {
            error!(error = %e, "Failed to load user");
            None
        })
    }

    /// Remove the local user profile.
    pub fn delete_user(&self) {
        let result = self.with_conn(|conn| Ok(conn.execute("DELETE FROM users", [])?));
        match result {
            Ok(removed) => info!(removed = removed, "User profile deleted"),
            Err(e) => error!(error = %e, "Failed to delete user"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventCategory, ResourceCategory};
    use crate::store::UserSort;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn resource(title: &str, days_ago: i64) -> Resource {
        let mut r = Resource::new(title, "desc", ResourceCategory::Healthcare);
        r.date_added = Utc::now() - Duration::days(days_ago);
        r.tags = vec!["health".to_string()];
        r
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let store = StructuredStore::in_memory();
        let mut r = resource("Clinic Directory", 0);

        assert!(store.save_resource(&r));
        assert_eq!(store.load_resources().len(), 1);

        r.title = "Clinic Directory 2025".to_string();
        r.url = Some("https://example.org".to_string());
        assert!(store.save_resource(&r));

        let all = store.load_resources();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Clinic Directory 2025");
        assert_eq!(all[0].url.as_deref(), Some("https://example.org"));
        assert_eq!(all[0].tags, vec!["health".to_string()]);

        assert!(store.save_resource(&resource("Other", 0)));
        assert_eq!(store.load_resources().len(), 2);
    }

    #[test]
    fn test_resources_newest_first() {
        let store = StructuredStore::in_memory();
        store.save_resource(&resource("Old", 10));
        store.save_resource(&resource("New", 1));
        store.save_resource(&resource("Middle", 5));

        let titles: Vec<_> = store.load_resources().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["New", "Middle", "Old"]);

        let by_title: Vec<Resource> = store.load_all(ResourceSort::Title, Order::Ascending);
        assert_eq!(by_title[0].title, "Middle");
    }

    #[test]
    fn test_events_soonest_first() {
        let store = StructuredStore::in_memory();
        let now = Utc::now();
        let later = Event::new("Later", "", now + Duration::days(9), "Hall", EventCategory::Rally);
        let mut soon = Event::new("Soon", "", now + Duration::days(1), "Online", EventCategory::Webinar);
        soon.is_virtual = true;
        store.save_event(&later);
        store.save_event(&soon);

        let events = store.load_events();
        assert_eq!(events[0].title, "Soon");
        assert!(events[0].is_virtual);
        assert_eq!(events[1], later);
    }

    #[test]
    fn test_toggle_favorite_twice_restores_state() {
        let store = StructuredStore::in_memory();
        let a = resource("A", 0);
        let b = resource("B", 0);
        store.save_resource(&a);
        store.save_resource(&b);
        assert!(store.favorite_ids().is_empty());

        store.toggle_favorite(a.id);
        assert_eq!(store.favorite_ids(), HashSet::from([a.id]));

        store.toggle_favorite(a.id);
        assert!(store.favorite_ids().is_empty());
    }

    #[test]
    fn test_toggle_unknown_id_is_noop() {
        let store = StructuredStore::in_memory();
        assert!(!store.try_toggle_favorite(Uuid::new_v4()).unwrap());
        assert!(store.favorite_ids().is_empty());
    }

    #[test]
    fn test_upsert_preserves_favorite_flag() {
        let store = StructuredStore::in_memory();
        let mut r = resource("A", 0);
        store.save_resource(&r);
        store.toggle_favorite(r.id);

        r.title = "A (edited)".to_string();
        store.save_resource(&r);
        assert_eq!(store.favorite_ids(), HashSet::from([r.id]));
    }

    #[test]
    fn test_user_roundtrip_and_delete() {
        let store = StructuredStore::in_memory();
        assert_eq!(store.load_user(), None);

        let mut user = User::new("Alex", "alex@example.org");
        user.interests = vec!["housing".to_string()];
        user.notification_preferences.news_updates = true;
        assert!(store.save_user(&user));
        assert_eq!(store.load_user(), Some(user.clone()));

        user.bio = Some("Advocate".to_string());
        store.save_user(&user);
        assert_eq!(store.load_all::<User>(UserSort::Name, Order::Ascending).len(), 1);

        store.delete_user();
        assert_eq!(store.load_user(), None);
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("advocacy.db");
        let r = resource("Persisted", 0);
        {
            let store = StructuredStore::open(&path);
            assert!(store.is_available());
            store.save_resource(&r);
        }
        let reopened = StructuredStore::open(&path);
        assert_eq!(reopened.load_resources(), vec![r]);
    }

    #[test]
    fn test_unavailable_store_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened as a database file.
        let store = StructuredStore::open(dir.path());
        assert!(!store.is_available());
        assert!(!store.save_resource(&resource("A", 0)));
        assert!(store.load_resources().is_empty());
        assert!(store.favorite_ids().is_empty());
        assert_eq!(store.load_user(), None);
        assert!(matches!(
            store.try_load_all::<Event>(EventSort::Date, Order::Ascending),
            Err(StoreError::Unavailable(_))
        ));
    }
}
