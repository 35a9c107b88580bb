//! Reset coordination: drive every registered store back to its initial
//! state on logout.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::RwLock;

use coincraft_core::error::ClientResult;

use crate::cache::CacheCoordinator;
use crate::vault::{Vault, SESSION_SCOPED_KEYS};

/// Implemented by every domain store that participates in the logout sweep.
#[async_trait]
pub trait Resettable: Send + Sync {
    /// Short name used in logs when a reset fails.
    fn name(&self) -> &'static str;

    /// Return the store to its just-constructed state.
    async fn reset(&self) -> ClientResult<()>;
}

/// Explicit registry of resettable stores.
///
/// Each store registers itself at construction; `reset_all` sweeps the
/// list, then clears the cache coordinator and the session-scoped vault
/// slots. Stores are held weakly so the registry never keeps a dropped
/// store alive.
pub struct ResetRegistry {
    stores: RwLock<Vec<Weak<dyn Resettable>>>,
    cache: Arc<CacheCoordinator>,
    vault: Arc<dyn Vault>,
}

impl ResetRegistry {
    pub fn new(cache: Arc<CacheCoordinator>, vault: Arc<dyn Vault>) -> Self {
        Self {
            stores: RwLock::new(Vec::new()),
            cache,
            vault,
        }
    }

    /// Add a store to the sweep. Called once per store, at construction.
    pub async fn register(&self, store: Weak<dyn Resettable>) {
        self.stores.write().await.push(store);
    }

    /// Number of live registered stores.
    pub async fn registered_count(&self) -> usize {
        self.stores
            .read()
            .await
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Reset every registered store, then purge cached data and the
    /// session-scoped persisted slots.
    ///
    /// Best-effort: a store whose reset fails is logged and skipped, and
    /// the sweep continues. Idempotent -- running it with nothing to clear
    /// is a no-op.
    pub async fn reset_all(&self) {
        let stores: Vec<Arc<dyn Resettable>> = {
            let mut registered = self.stores.write().await;
            // Compact dropped stores out of the list while we are here.
            registered.retain(|w| w.strong_count() > 0);
            registered.iter().filter_map(Weak::upgrade).collect()
        };

        for store in stores {
            if let Err(e) = store.reset().await {
                tracing::warn!(store = store.name(), error = %e, "Store reset failed; continuing");
            }
        }

        self.cache.clear().await;

        for key in SESSION_SCOPED_KEYS {
            if let Err(e) = self.vault.remove(key) {
                tracing::warn!(key, error = %e, "Failed to clear persisted slot; continuing");
            }
        }

        tracing::debug!("Reset sweep complete");
    }
}
