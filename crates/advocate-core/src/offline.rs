//! Offline-first fetching of remote content.
//!
//! A successful fetch refreshes the cache; a failed one falls back to the
//! last cached copy so content stays readable without a connection. Cache
//! file I/O runs on the blocking thread pool.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::cache::{keys, CacheManager};
use crate::models::{Event, Resource};

pub const RESOURCES_ENDPOINT: &str = "/resources";
pub const EVENTS_ENDPOINT: &str = "/events";

/// Where a fetched collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Remote,
    Cache,
    Unavailable,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Remote => write!(f, "remote"),
            Source::Cache => write!(f, "cache"),
            Source::Unavailable => write!(f, "unavailable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub items: Vec<T>,
    pub source: Source,
    /// User-facing message for the network failure, if any.
    pub error: Option<&'static str>,
}

/// Fetch `endpoint`, caching the result under `key`, or fall back to the cache.
pub async fn fetch_offline_first<T>(
    client: &ApiClient,
    cache: &Arc<CacheManager>,
    endpoint: &str,
    key: &str,
) -> Fetched<T>
where
    T: DeserializeOwned + Serialize + Clone + Send + 'static,
{
    match client.get::<Vec<T>>(endpoint, &[]).await {
        Ok(items) => {
            let cache = Arc::clone(cache);
            let owned_key = key.to_string();
            let snapshot = items.clone();
            let stored = tokio::task::spawn_blocking(move || cache.put(&owned_key, &snapshot)).await;
            if let Err(e) = stored {
                error!(key = key, error = %e, "Cache write task failed");
            }
            info!(endpoint = endpoint, count = items.len(), "Fetched remote content");
            Fetched {
                items,
                source: Source::Remote,
                error: None,
            }
        }
        Err(e) => {
            warn!(endpoint = endpoint, error = %e, "Fetch failed, falling back to cache");
            let error = Some(e.user_message());
            let cache = Arc::clone(cache);
            let owned_key = key.to_string();
            let cached = tokio::task::spawn_blocking(move || cache.get::<Vec<T>>(&owned_key))
                .await
                .unwrap_or_else(|e| {
                    error!(key = key, error = %e, "Cache read task failed");
                    None
                });
            match cached {
                Some(items) => Fetched {
                    items,
                    source: Source::Cache,
                    error,
                },
                None => Fetched {
                    items: Vec::new(),
                    source: Source::Unavailable,
                    error,
                },
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub resources: Fetched<Resource>,
    pub events: Fetched<Event>,
}

/// Fetch resources and events concurrently.
pub async fn sync_content(client: &ApiClient, cache: &Arc<CacheManager>) -> SyncReport {
    let (resources, events) = futures::join!(
        fetch_offline_first::<Resource>(client, cache, RESOURCES_ENDPOINT, keys::RESOURCES),
        fetch_offline_first::<Event>(client, cache, EVENTS_ENDPOINT, keys::EVENTS),
    );
    SyncReport { resources, events }
}
