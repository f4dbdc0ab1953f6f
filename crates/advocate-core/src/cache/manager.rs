use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::models::{Event, Resource};

/// Default lifetime of a cache entry.
const CACHE_EXPIRATION_DAYS: i64 = 7;

/// Extension of every cache file.
const CACHE_EXTENSION: &str = "json";

pub mod keys {
    pub const RESOURCES: &str = "resources";
    pub const EVENTS: &str = "events";
}

/// Keys map to one file inside the cache directory, so separators and
/// parent references are not allowed.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['/', '\\']) && !key.contains("..")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    #[serde(rename = "expirationDate")]
    pub expiration_date: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T, expiration_date: DateTime<Utc>) -> Self {
        Self {
            data,
            expiration_date,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expiration_date < Utc::now()
    }
}

/// Reads only the expiration of an entry, ignoring its payload.
#[derive(Deserialize)]
struct ExpirationHeader {
    #[serde(rename = "expirationDate")]
    expiration_date: DateTime<Utc>,
}

/// Outcome of a cache read.
///
/// `Expired` and `Corrupted` entries have already been deleted by the time
/// the caller sees them.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Hit(T),
    Missing,
    Expired,
    Corrupted,
}

impl<T> CacheLookup<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            CacheLookup::Hit(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }
}

/// Expiring file-per-key cache.
///
/// Writes are best effort: failures are logged and never reach the caller.
/// All operations on one instance are serialized through an internal lock.
pub struct CacheManager {
    cache_dir: PathBuf,
    lock: Mutex<()>,
}

impl CacheManager {
    /// The directory is created on the first write, not here.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            lock: Mutex::new(()),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// File backing `key`, or `None` when the key is not a single file name.
    fn cache_path(&self, key: &str) -> Option<PathBuf> {
        if !is_valid_key(key) {
            warn!(key = key, "Rejecting cache key that is not a plain file name");
            return None;
        }
        Some(self.cache_dir.join(format!("{}.{}", key, CACHE_EXTENSION)))
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn default_expiration() -> DateTime<Utc> {
        Utc::now() + Duration::days(CACHE_EXPIRATION_DAYS)
    }

    // ===== Generic Operations =====

    /// Cache `data` under `key` for the default 7 days.
    pub fn put<T: Serialize>(&self, key: &str, data: &T) {
        self.put_until(key, data, Self::default_expiration());
    }

    /// Cache `data` under `key` until `expiration_date`, replacing any previous entry.
    pub fn put_until<T: Serialize>(&self, key: &str, data: &T, expiration_date: DateTime<Utc>) {
        let _guard = self.guard();
        if let Err(e) = self.write_entry(key, data, expiration_date) {
            error!(key = key, error = %e, "Failed to cache data");
        }
    }

    fn write_entry<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        expiration_date: DateTime<Utc>,
    ) -> Result<()> {
        let Some(path) = self.cache_path(key) else {
            return Ok(());
        };
        std::fs::create_dir_all(&self.cache_dir).with_context(|| {
            format!("Failed to create cache directory: {}", self.cache_dir.display())
        })?;

        let cached = CachedData::new(data, expiration_date);
        let contents = serde_json::to_vec(&cached)
            .with_context(|| format!("Failed to encode cache entry: {}", key))?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write cache file: {}", key))?;
        Ok(())
    }

    /// Read `key`, distinguishing a miss from an expired or corrupted entry.
    pub fn lookup<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        let _guard = self.guard();
        let Some(path) = self.cache_path(key) else {
            return CacheLookup::Missing;
        };
        if !path.exists() {
            return CacheLookup::Missing;
        }

        let parsed = std::fs::read(&path)
            .with_context(|| format!("Failed to read cache file: {}", key))
            .and_then(|bytes| {
                serde_json::from_slice::<CachedData<T>>(&bytes)
                    .with_context(|| format!("Failed to parse cache file: {}", key))
            });

        match parsed {
            Ok(cached) if cached.is_expired() => {
                debug!(key = key, expired_at = %cached.expiration_date, "Cache entry expired");
                Self::remove_file(&path);
                CacheLookup::Expired
            }
            Ok(cached) => CacheLookup::Hit(cached.data),
            Err(e) => {
                warn!(key = key, error = %e, "Removing corrupted cache entry");
                Self::remove_file(&path);
                CacheLookup::Corrupted
            }
        }
    }

    /// Cached value for `key`, or `None` when missing, expired or unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lookup(key).into_option()
    }

    /// Delete the entry for `key`. Absent keys are not an error.
    pub fn remove(&self, key: &str) {
        let _guard = self.guard();
        if let Some(path) = self.cache_path(key) {
            Self::remove_file(&path);
        }
    }

    fn remove_file(path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!(path = %path.display(), error = %e, "Failed to remove cache file"),
        }
    }

    fn cache_files(&self) -> Result<Vec<PathBuf>> {
        if !self.cache_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.cache_dir).with_context(|| {
            format!("Failed to list cache directory: {}", self.cache_dir.display())
        })?;
        Ok(entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect())
    }

    /// Delete every file in the cache directory. Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let _guard = self.guard();
        match self.cache_files() {
            Ok(files) => {
                let count = files.len();
                for file in files {
                    Self::remove_file(&file);
                }
                count
            }
            Err(e) => {
                error!(error = %e, "Failed to clear cache");
                0
            }
        }
    }

    /// Delete entries that have expired or no longer parse. Returns how many were removed.
    pub fn clear_expired(&self) -> usize {
        let _guard = self.guard();
        let files = match self.cache_files() {
            Ok(files) => files,
            Err(e) => {
                error!(error = %e, "Failed to clear expired cache");
                return 0;
            }
        };

        let now = Utc::now();
        let mut removed = 0;
        for file in files {
            if file.extension().and_then(|ext| ext.to_str()) != Some(CACHE_EXTENSION) {
                continue;
            }
            let stale = match std::fs::read(&file)
                .ok()
                .and_then(|bytes| serde_json::from_slice::<ExpirationHeader>(&bytes).ok())
            {
                Some(header) => header.expiration_date < now,
                None => true,
            };
            if stale {
                Self::remove_file(&file);
                removed += 1;
            }
        }
        debug!(removed = removed, "Cleared expired cache entries");
        removed
    }

    // ===== Resources =====

    pub fn cache_resources(&self, resources: &[Resource]) {
        self.put(keys::RESOURCES, &resources)
    }

    pub fn retrieve_resources(&self) -> Option<Vec<Resource>> {
        self.get(keys::RESOURCES)
    }

    // ===== Events =====

    pub fn cache_events(&self, events: &[Event]) {
        self.put(keys::EVENTS, &events)
    }

    pub fn retrieve_events(&self) -> Option<Vec<Event>> {
        self.get(keys::EVENTS)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceCategory;
    use tempfile::TempDir;

    fn test_cache() -> (CacheManager, TempDir) {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::new(dir.path().join("cache"));
        (cache, dir)
    }

    #[test]
    fn test_put_then_get_returns_value() {
        let (cache, _dir) = test_cache();
        cache.put("k", &42);
        assert_eq!(cache.get::<i32>("k"), Some(42));
    }

    #[test]
    fn test_directory_created_lazily() {
        let (cache, _dir) = test_cache();
        assert!(!cache.cache_dir().exists());
        assert_eq!(cache.get::<i32>("k"), None);
        cache.put("k", &1);
        assert!(cache.cache_dir().exists());
    }

    #[test]
    fn test_file_layout() {
        let (cache, _dir) = test_cache();
        cache.put("numbers", &vec![1, 2]);
        let raw = std::fs::read_to_string(cache.cache_dir().join("numbers.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["data"], serde_json::json!([1, 2]));
        assert!(value["expirationDate"].is_string());
    }

    #[test]
    fn test_expired_entry_is_absent_and_deleted() {
        let (cache, _dir) = test_cache();
        cache.put_until("k", &42, Utc::now() - Duration::seconds(1));
        let path = cache.cache_dir().join("k.json");
        assert!(path.exists());

        assert_eq!(cache.lookup::<i32>("k"), CacheLookup::Expired);
        assert!(!path.exists());
        assert_eq!(cache.lookup::<i32>("k"), CacheLookup::Missing);
    }

    #[test]
    fn test_corrupted_entry_is_deleted() {
        let (cache, _dir) = test_cache();
        std::fs::create_dir_all(cache.cache_dir()).unwrap();
        let path = cache.cache_dir().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        assert_eq!(cache.lookup::<i32>("bad"), CacheLookup::Corrupted);
        assert!(!path.exists());
    }

    #[test]
    fn test_type_mismatch_counts_as_corrupted() {
        let (cache, _dir) = test_cache();
        cache.put("k", &"text");
        assert_eq!(cache.get::<i32>("k"), None);
        assert!(!cache.cache_dir().join("k.json").exists());
    }

    #[test]
    fn test_put_overwrites_existing_entry() {
        let (cache, _dir) = test_cache();
        cache.put("k", &1);
        cache.put("k", &2);
        assert_eq!(cache.get::<i32>("k"), Some(2));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (cache, _dir) = test_cache();
        cache.put("k", &1);
        cache.remove("k");
        cache.remove("k");
        assert_eq!(cache.get::<i32>("k"), None);
    }

    #[test]
    fn test_clear_all() {
        let (cache, _dir) = test_cache();
        cache.put("a", &1);
        cache.put("b", &2);
        assert_eq!(cache.clear_all(), 2);
        assert_eq!(cache.get::<i32>("a"), None);
        assert_eq!(cache.get::<i32>("b"), None);
    }

    #[test]
    fn test_clear_all_without_directory() {
        let (cache, _dir) = test_cache();
        assert_eq!(cache.clear_all(), 0);
    }

    #[test]
    fn test_clear_expired_keeps_fresh_entries() {
        let (cache, _dir) = test_cache();
        cache.put_until("k", &42, Utc::now() + Duration::hours(1));
        assert_eq!(cache.get::<i32>("k"), Some(42));

        assert_eq!(cache.clear_expired(), 0);
        assert_eq!(cache.get::<i32>("k"), Some(42));

        cache.put_until("k2", &7, Utc::now() - Duration::seconds(1));
        assert_eq!(cache.clear_expired(), 1);
        assert!(!cache.cache_dir().join("k2.json").exists());
        assert_eq!(cache.get::<i32>("k"), Some(42));
    }

    #[test]
    fn test_clear_expired_removes_corrupted_files() {
        let (cache, _dir) = test_cache();
        cache.put("good", &1);
        std::fs::write(cache.cache_dir().join("junk.json"), "[]").unwrap();
        std::fs::write(cache.cache_dir().join("notes.txt"), "keep").unwrap();

        assert_eq!(cache.clear_expired(), 1);
        assert!(cache.cache_dir().join("notes.txt").exists());
        assert_eq!(cache.get::<i32>("good"), Some(1));
    }

    #[test]
    fn test_key_with_separator_is_rejected() {
        let (cache, _dir) = test_cache();
        cache.put("news/2024", &42);
        assert_eq!(cache.lookup::<i32>("news/2024"), CacheLookup::Missing);
        assert!(!cache.cache_dir().join("news").exists());

        cache.put("news\\2024", &42);
        assert_eq!(cache.get::<i32>("news\\2024"), None);
        assert_eq!(cache.clear_all(), 0);
    }

    #[test]
    fn test_key_cannot_escape_cache_directory() {
        let (cache, dir) = test_cache();
        cache.put("../escaped", &7);
        assert!(!dir.path().join("escaped.json").exists());
        assert_eq!(cache.get::<i32>("../escaped"), None);

        cache.remove("../escaped");
        cache.put("", &1);
        assert_eq!(cache.clear_all(), 0);
    }

    #[test]
    fn test_typed_resource_helpers() {
        let (cache, _dir) = test_cache();
        assert!(cache.retrieve_resources().is_none());

        let resources = vec![Resource::new("ADA", "Overview", ResourceCategory::Legal)];
        cache.cache_resources(&resources);
        assert_eq!(cache.retrieve_resources(), Some(resources));
        assert!(cache.retrieve_events().is_none());
    }
}
