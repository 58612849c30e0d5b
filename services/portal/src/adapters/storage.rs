//! services/portal/src/adapters/storage.rs
//!
//! The session storage adapter, the concrete implementation of the
//! `SessionStorage` port. The durable scope is one JSON file per key under the
//! session directory so a remembered login survives restarts; the ephemeral
//! scope lives only as long as this process.

use civic_portal_core::ports::{PortError, PortResult, SessionStorage, StorageScope};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct FileSessionStorage {
    dir: PathBuf,
    ephemeral: Mutex<HashMap<String, String>>,
}

impl FileSessionStorage {
    /// Creates a new `FileSessionStorage`. The directory is created lazily on
    /// the first durable write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ephemeral: Mutex::new(HashMap::new()),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn memory(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.ephemeral.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_durable(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read stored session entry");
                return None;
            }
        };
        match serde_json::from_str::<String>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt session entry");
                None
            }
        }
    }

    fn write_durable(&self, key: &str, value: &str) -> PortResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            PortError::Unexpected(format!(
                "Failed to create session directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;
        let encoded = serde_json::to_string(value)
            .map_err(|e| PortError::Unexpected(format!("Failed to encode session entry: {}", e)))?;
        let path = self.path_for(key);
        std::fs::write(&path, encoded).map_err(|e| {
            PortError::Unexpected(format!("Failed to write {}: {}", path.display(), e))
        })
    }
}

//=========================================================================================
// `SessionStorage` Trait Implementation
//=========================================================================================

impl SessionStorage for FileSessionStorage {
    fn get(&self, scope: StorageScope, key: &str) -> Option<String> {
        match scope {
            StorageScope::Durable => self.read_durable(key),
            StorageScope::Ephemeral => self.memory().get(key).cloned(),
        }
    }

    fn set(&self, scope: StorageScope, key: &str, value: &str) -> PortResult<()> {
        match scope {
            StorageScope::Durable => self.write_durable(key, value),
            StorageScope::Ephemeral => {
                self.memory().insert(key.to_string(), value.to_string());
                Ok(())
            }
        }
    }

    fn remove(&self, scope: StorageScope, key: &str) {
        match scope {
            StorageScope::Durable => {
                let path = self.path_for(key);
                if let Err(e) = std::fs::remove_file(&path) {
                    if e.kind() != ErrorKind::NotFound {
                        warn!(path = %path.display(), error = %e, "Could not remove session entry");
                    }
                }
            }
            StorageScope::Ephemeral => {
                self.memory().remove(key);
            }
        }
    }
}
