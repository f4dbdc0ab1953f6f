//! Structured SQLite persistence for resources, events and the user profile.
//!
//! This is the compatibility path kept alongside the JSON repositories. It
//! stores favorites as a flag on the resource row and holds the single local
//! user profile. Every public call degrades to an empty result on storage
//! failure; the `try_*` variants expose the underlying `StoreError`.

pub mod records;
pub mod structured;

pub use records::{EventSort, Order, Record, ResourceSort, UserSort};
pub use structured::{StoreError, StructuredStore};
