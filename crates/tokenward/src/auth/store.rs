//! Client-side storage and the single-slot credential store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::error::{Error, StorageError};

use super::tokens::AccessToken;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Named-slot client storage.
///
/// Synchronous by contract: storage access is never a suspension point.
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }
}

/// Storage persisted as a JSON object in a single file.
///
/// The file is rewritten on every change and, on Unix, restricted to the
/// owner (`0600`).
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Open storage at `path`. The file is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let json = fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&json).map_err(|e| StorageError::Corrupt {
            message: format!("{}: {}", self.path.display(), e),
        })
    }

    fn save(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(items).map_err(|e| StorageError::Corrupt {
            message: e.to_string(),
        })?;
        fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut items = self.load()?;
        items.insert(key.to_string(), value.to_string());
        self.save(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut items = self.load()?;
        if items.remove(key).is_some() {
            self.save(&items)?;
        }
        Ok(())
    }
}

/// The single slot holding the current access credential.
///
/// Every consumer re-reads the credential from here; nothing else caches
/// it. Writes are last-writer-wins with no locking across callers.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn StorageBackend>,
    key: String,
}

impl CredentialStore {
    /// Create a store over `backend`, using the slot named `key`.
    pub fn new(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Store `token`, overwriting the previous credential.
    ///
    /// An empty token is ignored: a falsy set never clears the slot.
    pub fn set(&self, token: &str) -> Result<(), Error> {
        if token.is_empty() {
            debug!("Ignoring empty credential");
            return Ok(());
        }
        self.backend.set_item(&self.key, token)?;
        Ok(())
    }

    /// Returns the stored credential, if any.
    ///
    /// Unreadable storage counts as no credential.
    pub fn get(&self) -> Option<AccessToken> {
        match self.backend.get_item(&self.key) {
            Ok(value) => value.filter(|t| !t.is_empty()).map(AccessToken::new),
            Err(e) => {
                warn!(error = %e, "Failed to read credential from storage");
                None
            }
        }
    }

    /// Remove the stored credential unconditionally.
    pub fn clear(&self) -> Result<(), Error> {
        self.backend.remove_item(&self.key)?;
        Ok(())
    }

    /// Presence check only. Says nothing about validity or expiry.
    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
