//! Local caching module for offline data access.
//!
//! This module provides the `CacheManager`, an expiring key/value cache with
//! one JSON file per key. Entries expire after 7 days unless an explicit
//! expiration is given. Unreadable or expired entries are deleted on read.
//!
//! Well-known keys live in [`keys`]. A key must be a plain file name:
//! keys containing path separators or `..` are rejected.

pub mod manager;

pub use manager::{keys, CacheLookup, CacheManager, CachedData};
