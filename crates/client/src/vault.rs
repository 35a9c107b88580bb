//! Durable key-value slots surviving restarts.
//!
//! The browser build of this product keeps its session in localStorage;
//! here the same slots live in a JSON file under a data directory. The
//! [`Vault`] trait seam lets tests run on an in-memory map instead.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use coincraft_core::error::{ClientError, ClientResult};

/// Well-known slot keys.
pub mod keys {
    /// The bearer token.
    pub const TOKEN: &str = "coincraft_token";
    /// Serialized current-user record.
    pub const USER: &str = "coincraft_user";
    /// Serialized profile snapshot.
    pub const PROFILE_SNAPSHOT: &str = "coincraft_profile";
    /// Serialized recent-transactions snapshot.
    pub const RECENT_TRANSACTIONS: &str = "coincraft_recent_transactions";
    /// Credentials of freshly created child accounts, keyed by child id,
    /// kept so a parent can review them in the current session. Local
    /// only; never sent back to the server.
    pub const CHILD_CREDENTIALS: &str = "coincraft_child_credentials";
}

/// Every slot the logout sweep clears.
pub const SESSION_SCOPED_KEYS: &[&str] = &[
    keys::TOKEN,
    keys::USER,
    keys::PROFILE_SNAPSHOT,
    keys::RECENT_TRANSACTIONS,
    keys::CHILD_CREDENTIALS,
];

/// Default location of the file-backed vault.
pub const DEFAULT_VAULT_PATH: &str = "data/session.json";

/// String-keyed durable storage. Values are opaque to the vault; callers
/// serialize through serde where needed.
pub trait Vault: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, key: &str) -> ClientResult<()>;
    /// Drop every slot.
    fn clear(&self) -> ClientResult<()>;
}

/// File-backed vault: one JSON object per file, rewritten on every change.
///
/// The slot map is tiny (a token and a few snapshots), so a full rewrite
/// per mutation is fine.
pub struct FileVault {
    path: PathBuf,
    slots: Mutex<HashMap<String, String>>,
}

impl FileVault {
    /// Open the vault file at `path`, creating an empty vault if the file
    /// does not exist. A corrupt file is discarded and logged rather than
    /// treated as fatal.
    pub fn open(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();

        let slots = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Discarding corrupt vault file");
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(ClientError::Internal(format!(
                    "Failed to read vault file {}: {e}",
                    path.display()
                )))
            }
        };

        Ok(Self {
            path,
            slots: Mutex::new(slots),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A poisoned lock only means a panic elsewhere; the map itself is
        // still usable.
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn flush(&self, slots: &HashMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ClientError::Internal(format!("Failed to create vault directory: {e}"))
                })?;
            }
        }
        let raw = serde_json::to_string_pretty(slots)
            .map_err(|e| ClientError::Internal(format!("Failed to serialize vault: {e}")))?;
        std::fs::write(&self.path, raw)
            .map_err(|e| ClientError::Internal(format!("Failed to write vault file: {e}")))
    }
}

impl Vault for FileVault {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> ClientResult<()> {
        let mut slots = self.lock();
        slots.insert(key.to_string(), value.to_string());
        self.flush(&slots)
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let mut slots = self.lock();
        if slots.remove(key).is_some() {
            self.flush(&slots)?;
        }
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        let mut slots = self.lock();
        slots.clear();
        self.flush(&slots)
    }
}

/// In-memory vault for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryVault {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Vault for MemoryVault {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> ClientResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        self.lock().clear();
        Ok(())
    }
}
