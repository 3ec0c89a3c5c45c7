//! Snapshot Storage Module
//!
//! Durable key-value slots that hold serialized cache snapshots.

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{CacheError, Result};

// == Storage Trait ==
/// A durable medium addressed by namespace.
///
/// Implementations are synchronous. Every method may fail; callers in this
/// crate log failures instead of propagating them.
pub trait SnapshotStorage: Debug + Send + Sync {
    /// Reads the slot, `Ok(None)` if it was never written.
    fn read(&self, namespace: &str) -> Result<Option<String>>;

    /// Replaces the slot contents.
    fn write(&self, namespace: &str, data: &str) -> Result<()>;

    /// Deletes the slot. Deleting a missing slot is not an error.
    fn remove(&self, namespace: &str) -> Result<()>;
}

// == File Storage ==
/// One `<namespace>.json` file per slot inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `namespace`.
    pub fn slot_path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{}.json", namespace))
    }
}

impl SnapshotStorage for FileStorage {
    fn read(&self, namespace: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.slot_path(namespace)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, namespace: &str, data: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        // Write-then-rename so readers never see a half-written snapshot
        let path = self.slot_path(namespace);
        let tmp = self.dir.join(format!("{}.json.tmp", namespace));
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, namespace: &str) -> Result<()> {
        match fs::remove_file(self.slot_path(namespace)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// == Memory Storage ==
/// In-process storage. Clones share the same slots, so a slot outlives any
/// single cache that writes to it.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_slots<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> Result<T> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| CacheError::Storage("memory storage lock poisoned".to_string()))?;
        Ok(f(&mut slots))
    }
}

impl SnapshotStorage for MemoryStorage {
    fn read(&self, namespace: &str) -> Result<Option<String>> {
        self.with_slots(|slots| slots.get(namespace).cloned())
    }

    fn write(&self, namespace: &str, data: &str) -> Result<()> {
        self.with_slots(|slots| {
            slots.insert(namespace.to_string(), data.to_string());
        })
    }

    fn remove(&self, namespace: &str) -> Result<()> {
        self.with_slots(|slots| {
            slots.remove(namespace);
        })
    }
}
