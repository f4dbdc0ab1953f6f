//! The component graph, built once at start-up and passed by reference.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::cache::CacheManager;
use crate::config::Config;
use crate::models::Resource;
use crate::offline::{self, SyncReport};
use crate::repository::{EventsRepository, ResourcesRepository};
use crate::storage::{FavoriteList, JsonStore};
use crate::store::StructuredStore;

pub struct Services {
    pub config: Config,
    pub cache: Arc<CacheManager>,
    pub collections: Arc<JsonStore>,
    pub resources: ResourcesRepository,
    pub events: EventsRepository,
    pub legacy_favorites: FavoriteList,
    pub store: StructuredStore,
    pub api: ApiClient,
}

impl Services {
    pub fn new(config: Config) -> Result<Self> {
        let cache = Arc::new(CacheManager::new(config.cache_dir()?));

        let mut json = JsonStore::new(config.data_dir()?);
        if let Some(ref seed_dir) = config.seed_dir {
            json = json.with_seed_dir(seed_dir.clone());
        }
        let collections = Arc::new(json);

        let store = StructuredStore::open(&config.database_path()?);
        let api = ApiClient::new(config.client_settings()).context("Failed to create API client")?;

        Ok(Self {
            resources: ResourcesRepository::new(collections.clone()),
            events: EventsRepository::new(collections.clone()),
            legacy_favorites: FavoriteList::new(collections.clone()),
            config,
            cache,
            collections,
            store,
            api,
        })
    }

    /// Flip the favorite flag of resource `id`.
    ///
    /// The resource is mirrored into the structured store first so the flag
    /// has a row to live on. Returns the new state, or `None` for unknown ids.
    pub fn toggle_favorite(&self, id: Uuid) -> Option<bool> {
        let resource = self.resources.find(id)?;
        if !self.store.save_resource(&resource) {
            return None;
        }
        self.store.toggle_favorite(id);
        Some(self.store.favorite_ids().contains(&id))
    }

    /// Resources currently flagged as favorites, in collection order.
    pub fn favorite_resources(&self) -> Vec<Resource> {
        let ids = self.store.favorite_ids();
        self.resources
            .get_all()
            .into_iter()
            .filter(|r| ids.contains(&r.id))
            .collect()
    }

    /// Move ids from the legacy `Favorites.json` list onto structured store flags.
    /// Returns how many favorites were migrated.
    pub fn migrate_legacy_favorites(&self) -> usize {
        let legacy = self.legacy_favorites.ids();
        if legacy.is_empty() {
            return 0;
        }
        let flagged = self.store.favorite_ids();
        let mut migrated = 0;
        for id in legacy {
            if !flagged.contains(&id) && self.toggle_favorite(id) == Some(true) {
                migrated += 1;
            }
        }
        self.legacy_favorites.clear();
        info!(migrated = migrated, "Migrated legacy favorites");
        migrated
    }

    /// Offline-first refresh of remote resources and events.
    pub async fn sync(&self) -> SyncReport {
        offline::sync_content(&self.api, &self.cache).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceCategory;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn test_services() -> (Services, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: Some(dir.path().join("data")),
            cache_dir: Some(dir.path().join("cache")),
            ..Config::default()
        };
        (Services::new(config).unwrap(), dir)
    }

    #[test]
    fn test_toggle_favorite_round_trip() {
        let (services, _dir) = test_services();
        let r = Resource::new("Housing Rights", "Fair housing", ResourceCategory::Legal);
        services.resources.add(r.clone());

        assert_eq!(services.toggle_favorite(r.id), Some(true));
        assert_eq!(services.favorite_resources(), vec![r.clone()]);

        assert_eq!(services.toggle_favorite(r.id), Some(false));
        assert!(services.favorite_resources().is_empty());
    }

    #[test]
    fn test_toggle_unknown_resource() {
        let (services, _dir) = test_services();
        assert_eq!(services.toggle_favorite(Uuid::new_v4()), None);
    }

    #[test]
    fn test_migrate_legacy_favorites() {
        let (services, _dir) = test_services();
        let a = Resource::new("A", "", ResourceCategory::Education);
        let b = Resource::new("B", "", ResourceCategory::Employment);
        services.resources.save_all(vec![a.clone(), b.clone()]);

        services.legacy_favorites.toggle(a.id);
        services.legacy_favorites.toggle(Uuid::new_v4());

        assert_eq!(services.migrate_legacy_favorites(), 1);
        assert_eq!(services.store.favorite_ids().len(), 1);
        assert!(services.store.favorite_ids().contains(&a.id));
        assert_eq!(services.legacy_favorites.ids(), BTreeSet::new());
        assert_eq!(services.migrate_legacy_favorites(), 0);
    }
}
