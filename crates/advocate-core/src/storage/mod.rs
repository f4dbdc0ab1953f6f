//! JSON collection storage.
//!
//! Each entity kind is stored as a single pretty-printed JSON array with
//! sorted keys (`Resources.json`, `Events.json`) in a writable data
//! directory. On first use a read-only seed copy is copied in when present.
//!
//! `FavoriteList` keeps the legacy id-list of favorited resources in the
//! same directory.

pub mod favorites;
pub mod json;

pub use favorites::FavoriteList;
pub use json::{export_collection, import_collection, CollectionLoad, JsonStore};
