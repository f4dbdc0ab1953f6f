//! Data models for advocacy content.
//!
//! - `Resource`: a rights, education or support resource with a category
//! - `Event`: a workshop, webinar or meeting on a given date
//! - `User`: the local profile, including notification preferences
//! - `LetterTemplate`: an advocacy letter with `[key]` placeholders
//!
//! Every record carries a stable `Uuid`. Collections stored as JSON arrays
//! implement [`Collection`], which ties the type to its file name.

pub mod event;
pub mod letter;
pub mod resource;
pub mod user;

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

pub use event::{Event, EventCategory, EventDateFilter};
pub use letter::{sample_templates, LetterCategory, LetterTemplate, Placeholder};
pub use resource::{Resource, ResourceCategory};
pub use user::{NotificationPreferences, User};

/// A uniquely identified record.
pub trait Entity {
    fn id(&self) -> Uuid;
}

/// An entity kind persisted as one JSON array file.
pub trait Collection: Entity + Clone + Serialize + DeserializeOwned + Send + 'static {
    /// File name inside the writable data directory, e.g. `Resources.json`.
    const FILENAME: &'static str;
    /// Short plural label used in log output.
    const LABEL: &'static str;
}
