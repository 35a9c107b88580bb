//! Shop catalog and the purchase flow.
//!
//! Purchases require parental approval, so buying an item creates a
//! pending conversion request and applies no local balance or ownership
//! change. The authoritative outcome is observed by re-fetching the
//! request list (and, transitively, the balance) after the parent
//! resolves it.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::RwLock;

use coincraft_api::models::{
    validate_input, RedemptionRequestCreate, RedemptionRequestRead, RequestStatus, ShopItemRead,
};
use coincraft_api::Backend;
use coincraft_core::cache::CacheKind;
use coincraft_core::error::{ClientError, ClientResult};

use crate::cache::CacheCoordinator;
use crate::reset::{Resettable, ResetRegistry};
use crate::session::SessionManager;

/// Scope key for the global shop catalog.
const CATALOG_SCOPE: &str = "catalog";

/// Scope key for the user's own requests. Shared with the user store's
/// conversion-request slice -- both read the same backend collection.
const SCOPE: &str = "me";

/// Observable state of the shop store.
#[derive(Debug, Clone, Default)]
pub struct ShopState {
    pub items: Vec<ShopItemRead>,
    pub requests: Vec<RedemptionRequestRead>,
}

pub struct ShopStore {
    session: Arc<SessionManager>,
    backend: Arc<dyn Backend>,
    cache: Arc<CacheCoordinator>,
    state: RwLock<ShopState>,
}

impl ShopStore {
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
            state: RwLock::new(ShopState::default()),
        });
        let dyn_store: Arc<dyn Resettable> = store.clone();
        let handle: Weak<dyn Resettable> = Arc::downgrade(&dyn_store);
        resets.register(handle).await;
        store
    }

    pub async fn state(&self) -> ShopState {
        self.state.read().await.clone()
    }

    /// Requests still awaiting a parental decision.
    pub async fn pending_requests(&self) -> Vec<RedemptionRequestRead> {
        self.state
            .read()
            .await
            .requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .cloned()
            .collect()
    }

    pub async fn load_items(&self, force_refresh: bool) -> ClientResult<Vec<ShopItemRead>> {
        let token = self.session.require_token().await?;

        if !force_refresh && self.cache.is_valid(CacheKind::ShopItems, CATALOG_SCOPE).await {
            if let Some(items) = self
                .cache
                .get::<Vec<ShopItemRead>>(CacheKind::ShopItems, CATALOG_SCOPE)
                .await
            {
                self.state.write().await.items = items.clone();
                return Ok(items);
            }
        }

        match self.backend.shop_items(&token).await {
            Ok(items) => {
                self.cache.put(CacheKind::ShopItems, CATALOG_SCOPE, &items).await;
                self.state.write().await.items = items.clone();
                Ok(items)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    /// Ask to buy an item.
    ///
    /// Creates a pending request for the item's price; nothing is owned
    /// and no coins move until a parent approves.
    pub async fn purchase(&self, item_id: &str) -> ClientResult<RedemptionRequestRead> {
        let token = self.session.require_token().await?;

        let item = self
            .state
            .read()
            .await
            .items
            .iter()
            .find(|i| i.id == item_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("Shop item {item_id}")))?;

        if !item.available {
            return Err(ClientError::Rejected(format!(
                "{} is not available",
                item.name
            )));
        }

        let create = RedemptionRequestCreate {
            coins_amount: item.price,
            description: Some(format!("Purchase: {}", item.name)),
        };
        validate_input(&create)?;

        match self.backend.create_conversion_request(&token, &create).await {
            Ok(request) => {
                let mut state = self.state.write().await;
                state.requests.insert(0, request.clone());
                let requests = state.requests.clone();
                drop(state);
                self.cache.put(CacheKind::Redemptions, SCOPE, &requests).await;
                tracing::info!(item = %item.name, coins = item.price, "Purchase request created");
                Ok(request)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    /// Re-fetch the user's requests to observe parental resolutions.
    pub async fn load_requests(
        &self,
        force_refresh: bool,
    ) -> ClientResult<Vec<RedemptionRequestRead>> {
        let token = self.session.require_token().await?;

        if !force_refresh && self.cache.is_valid(CacheKind::Redemptions, SCOPE).await {
            if let Some(requests) = self
                .cache
                .get::<Vec<RedemptionRequestRead>>(CacheKind::Redemptions, SCOPE)
                .await
            {
                self.state.write().await.requests = requests.clone();
                return Ok(requests);
            }
        }

        match self.backend.conversion_requests(&token).await {
            Ok(requests) => {
                self.cache.put(CacheKind::Redemptions, SCOPE, &requests).await;
                self.state.write().await.requests = requests.clone();
                Ok(requests)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    async fn remote_err(&self, err: ClientError) -> ClientError {
        self.session.handle_remote_error(&err).await;
        err
    }
}

#[async_trait]
impl Resettable for ShopStore {
    fn name(&self) -> &'static str {
        "shop"
    }

    async fn reset(&self) -> ClientResult<()> {
        *self.state.write().await = ShopState::default();
        Ok(())
    }
}
