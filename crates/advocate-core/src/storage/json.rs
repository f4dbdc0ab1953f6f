use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info, warn};

/// Outcome of loading a collection file.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionLoad<T> {
    /// Parsed from the writable copy.
    Found(Vec<T>),
    /// Parsed from the seed copy on first run.
    Seeded(Vec<T>),
    /// Neither a writable copy nor a seed exists.
    Absent,
    /// A file exists but could not be read or decoded. It is left in place.
    Unreadable,
}

impl<T> CollectionLoad<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            CollectionLoad::Found(items) | CollectionLoad::Seeded(items) => items,
            CollectionLoad::Absent | CollectionLoad::Unreadable => Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CollectionLoad::Unreadable)
    }
}

/// Loads and saves whole collections as JSON arrays.
#[derive(Debug, Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
    seed_dir: Option<PathBuf>,
}

impl JsonStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            seed_dir: None,
        }
    }

    /// Use `seed_dir` as the read-only bundle consulted on first run.
    pub fn with_seed_dir(mut self, seed_dir: PathBuf) -> Self {
        self.seed_dir = Some(seed_dir);
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn data_path(&self, filename: &str) -> PathBuf {
        self.data_dir.join(filename)
    }

    fn seed_path(&self, filename: &str) -> Option<PathBuf> {
        self.seed_dir
            .as_ref()
            .map(|dir| dir.join(filename))
            .filter(|path| path.is_file())
    }

    /// Load `filename`, seeding the writable copy from the bundle if it is missing.
    ///
    /// Never fails: decode errors are logged and reported as `Unreadable`.
    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> CollectionLoad<T> {
        let path = self.data_path(filename);
        if path.exists() {
            return match read_collection(&path) {
                Ok(items) => CollectionLoad::Found(items),
                Err(e) => {
                    error!(file = filename, error = %e, "Failed to load collection");
                    CollectionLoad::Unreadable
                }
            };
        }

        let Some(seed) = self.seed_path(filename) else {
            debug!(file = filename, "No collection file or seed found");
            return CollectionLoad::Absent;
        };

        if let Err(e) = self.copy_seed(&seed, &path) {
            warn!(file = filename, error = %e, "Failed to copy seed into data directory");
        }

        match read_collection(&seed) {
            Ok(items) => {
                info!(file = filename, count = items.len(), "Seeded collection from bundle");
                CollectionLoad::Seeded(items)
            }
            Err(e) => {
                error!(file = filename, error = %e, "Failed to load seed collection");
                CollectionLoad::Unreadable
            }
        }
    }

    /// Shorthand for `load(..).into_items()`.
    pub fn load_items<T: DeserializeOwned>(&self, filename: &str) -> Vec<T> {
        self.load(filename).into_items()
    }

    fn copy_seed(&self, seed: &Path, dest: &Path) -> Result<()> {
        // User edits must never be clobbered by reseeding.
        if dest.exists() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory: {}", self.data_dir.display())
        })?;
        std::fs::copy(seed, dest)
            .with_context(|| format!("Failed to copy seed file: {}", seed.display()))?;
        Ok(())
    }

    /// Replace `filename` with `items`. Returns false if the write failed (already logged).
    pub fn save<T: Serialize>(&self, items: &[T], filename: &str) -> bool {
        let result = std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create data directory: {}", self.data_dir.display()))
            .and_then(|_| write_collection(items, &self.data_path(filename)));
        match result {
            Ok(()) => true,
            Err(e) => {
                error!(file = filename, error = %e, "Failed to save collection");
                false
            }
        }
    }

    /// Location of `filename`: the seed copy if bundled, else the writable copy if present.
    pub fn local_file_path(&self, filename: &str) -> Option<PathBuf> {
        self.seed_path(filename).or_else(|| {
            let path = self.data_path(filename);
            path.exists().then_some(path)
        })
    }
}

fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let contents = std::fs::read(path)
        .with_context(|| format!("Failed to read collection file: {}", path.display()))?;
    serde_json::from_slice(&contents)
        .with_context(|| format!("Failed to parse collection file: {}", path.display()))
}

/// Pretty JSON with sorted object keys.
fn encode_sorted<T: Serialize>(items: &T) -> Result<String> {
    // serde_json::Value keeps object keys in a BTreeMap
    let value = serde_json::to_value(items).context("Failed to encode collection")?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Write through a temporary sibling and rename so readers never see a partial file.
fn write_collection<T: Serialize>(items: &[T], path: &Path) -> Result<()> {
    let contents = encode_sorted(&items)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write temporary file: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace collection file: {}", path.display()))?;
    Ok(())
}

/// Write a collection to an arbitrary path, e.g. for sharing or backup.
pub fn export_collection<T: Serialize>(items: &[T], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_collection(items, path)
}

/// Read a collection from an arbitrary path. Unreadable files yield `None`.
pub fn import_collection<T: DeserializeOwned>(path: &Path) -> Option<Vec<T>> {
    match read_collection(path) {
        Ok(items) => Some(items),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to import collection");
            None
        }
    }
}
