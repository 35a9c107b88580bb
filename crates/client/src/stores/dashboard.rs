//! Role-scoped dashboard aggregate.
//!
//! One backend call returns everything the landing view needs; the
//! aggregate is cached per role. A child dashboard carries the
//! authoritative coin total, which overwrites whatever balance the
//! session learned optimistically.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::RwLock;

use coincraft_api::models::DashboardSummary;
use coincraft_api::Backend;
use coincraft_core::cache::CacheKind;
use coincraft_core::error::{ClientError, ClientResult};

use crate::cache::CacheCoordinator;
use crate::reset::{Resettable, ResetRegistry};
use crate::session::SessionManager;

/// Observable state of the dashboard store.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub summary: Option<DashboardSummary>,
}

pub struct DashboardStore {
    session: Arc<SessionManager>,
    backend: Arc<dyn Backend>,
    cache: Arc<CacheCoordinator>,
    state: RwLock<DashboardState>,
}

impl DashboardStore {
    /// Build the store and register it with the reset sweep.
    pub async fn new(
        session: Arc<SessionManager>,
        backend: Arc<dyn Backend>,
        cache: Arc<CacheCoordinator>,
        resets: &ResetRegistry,
    ) -> Arc<Self> {
        let store = Arc::new(Self {
            session,
            backend,
            cache,
            state: RwLock::new(DashboardState::default()),
        });
        let dyn_store: Arc<dyn Resettable> = store.clone();
        let handle: Weak<dyn Resettable> = Arc::downgrade(&dyn_store);
        resets.register(handle).await;
        store
    }

    pub async fn summary(&self) -> Option<DashboardSummary> {
        self.state.read().await.summary.clone()
    }

    /// Load the aggregate for the session's role.
    pub async fn load(&self, force_refresh: bool) -> ClientResult<DashboardSummary> {
        let token = self.session.require_token().await?;
        let role = self
            .session
            .role()
            .await
            .ok_or_else(|| ClientError::Unauthorized("No session role".to_string()))?;
        let scope = role.as_str();

        if !force_refresh && self.cache.is_valid(CacheKind::Dashboard, scope).await {
            if let Some(summary) = self
                .cache
                .get::<DashboardSummary>(CacheKind::Dashboard, scope)
                .await
            {
                self.adopt(summary.clone()).await;
                return Ok(summary);
            }
        }

        match self.backend.dashboard(&token, role).await {
            Ok(summary) => {
                self.cache.put(CacheKind::Dashboard, scope, &summary).await;
                self.adopt(summary.clone()).await;
                Ok(summary)
            }
            Err(err) => {
                self.session.handle_remote_error(&err).await;
                Err(err)
            }
        }
    }

    async fn adopt(&self, summary: DashboardSummary) {
        // The aggregate's coin total is authoritative for child roles.
        if summary.user.role.is_child() {
            self.session.record_balance(summary.stats.total_coins).await;
        }
        self.state.write().await.summary = Some(summary);
    }
}

#[async_trait]
impl Resettable for DashboardStore {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    async fn reset(&self) -> ClientResult<()> {
        *self.state.write().await = DashboardState::default();
        Ok(())
    }
}
