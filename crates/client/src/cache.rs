//! The cache coordinator: one entry per (resource kind, scope key) pair.
//!
//! Serves cached data while an entry is inside its TTL, otherwise the
//! owning store refetches and `put`s the result. Entries are owned
//! exclusively by the coordinator; domain stores never mutate them in
//! place.

use std::collections::HashMap;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use coincraft_core::cache::{CacheEntry, CacheKind};
use coincraft_core::types::Timestamp;

/// Thread-safe map of cached loads, shared via `Arc` across the stores.
#[derive(Default)]
pub struct CacheCoordinator {
    entries: RwLock<HashMap<(CacheKind, String), CacheEntry<serde_json::Value>>>,
}

impl CacheCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff an entry exists for `(kind, scope_key)` and is inside its
    /// TTL right now.
    pub async fn is_valid(&self, kind: CacheKind, scope_key: &str) -> bool {
        let entries = self.entries.read().await;
        entries
            .get(&(kind, scope_key.to_string()))
            .is_some_and(|entry| entry.is_fresh(Utc::now()))
    }

    /// The cached data for `(kind, scope_key)`, regardless of freshness.
    ///
    /// Returns `None` when no entry exists or the stored payload no longer
    /// decodes as `T`.
    pub async fn get<T: DeserializeOwned>(&self, kind: CacheKind, scope_key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(&(kind, scope_key.to_string()))?;
        match serde_json::from_value(entry.data.clone()) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!(?kind, scope_key, error = %e, "Dropping undecodable cache entry");
                None
            }
        }
    }

    /// Store `data` with `fetched_at = now`, replacing any prior entry for
    /// the key wholesale.
    pub async fn put<T: Serialize>(&self, kind: CacheKind, scope_key: &str, data: &T) {
        self.put_at(kind, scope_key, data, Utc::now()).await;
    }

    /// [`put`](Self::put) with an explicit fetch time. Used when restoring
    /// persisted snapshots whose fetch predates this process.
    pub async fn put_at<T: Serialize>(
        &self,
        kind: CacheKind,
        scope_key: &str,
        data: &T,
        fetched_at: Timestamp,
    ) {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                // A payload that cannot serialize simply is not cached; the
                // next load falls through to the backend.
                tracing::warn!(?kind, scope_key, error = %e, "Skipping uncacheable payload");
                return;
            }
        };
        self.entries
            .write()
            .await
            .insert((kind, scope_key.to_string()), CacheEntry::new(value, fetched_at));
    }

    /// Drop one entry, or every entry of `kind` when `scope_key` is `None`.
    pub async fn invalidate(&self, kind: CacheKind, scope_key: Option<&str>) {
        let mut entries = self.entries.write().await;
        match scope_key {
            Some(scope) => {
                entries.remove(&(kind, scope.to_string()));
            }
            None => {
                entries.retain(|key, _| key.0 != kind);
            }
        }
    }

    /// Drop everything. Called by the reset sweep on logout.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
