//! In-memory cached CRUD over JSON collections.
//!
//! A `Repository<T>` owns one collection file. The first read loads it from
//! disk, and every mutation rewrites the whole file so memory and disk stay
//! in step. `reload()` drops the in-memory copy to pick up external edits
//! such as an import.

pub mod collection;

pub use collection::{EventsRepository, Repository, ResourcesRepository};
