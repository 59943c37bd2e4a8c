//! Snapshot persistence for the session record.
//!
//! A single serialized blob, overwritten on every save. Last-write-wins with
//! no versioning or migration: this is advisory marketing data, not durable
//! state, and the engine warns-and-continues if a write fails.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::session::SessionRecord;

/// Where the serialized session snapshot goes.
pub trait SnapshotStore: Send + Sync {
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;
}

/// Writes the snapshot as pretty JSON to a single file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store holding only the latest snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    last: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently saved snapshot, if any.
    pub fn snapshot(&self) -> Option<SessionRecord> {
        self.last
            .lock()
            .expect("store lock")
            .as_ref()
            .and_then(|json| serde_json::from_str(json).ok())
    }

    pub fn save_count_is_zero(&self) -> bool {
        self.last.lock().expect("store lock").is_none()
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        *self.last.lock().expect("store lock") = Some(json);
        Ok(())
    }
}
