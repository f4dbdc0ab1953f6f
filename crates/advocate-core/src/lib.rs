//! Local data layer for the disability advocacy companion.
//!
//! - `cache`: expiring one-file-per-key cache for remote content
//! - `storage`: JSON collection files with first-run seeding
//! - `repository`: in-memory cached CRUD over those collections
//! - `store`: SQLite store for favorites and the user profile
//! - `api`: JSON HTTP client with retry and backoff
//! - `services`: everything above, constructed once and passed around

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod offline;
pub mod repository;
pub mod services;
pub mod storage;
pub mod store;

pub use config::Config;
pub use services::Services;
