//! The client context: every piece of the session layer wired together
//! once at startup and shared by reference.

use std::sync::Arc;

use coincraft_api::models::RegisterRequest;
use coincraft_api::{ApiConfig, Backend, HttpBackend};
use coincraft_core::error::ClientResult;
use coincraft_core::session::Session;

use crate::cache::CacheCoordinator;
use crate::guard::NavigationGuard;
use crate::reset::ResetRegistry;
use crate::session::SessionManager;
use crate::stores::dashboard::DashboardStore;
use crate::stores::parent::ParentStore;
use crate::stores::shop::ShopStore;
use crate::stores::teacher::TeacherStore;
use crate::stores::user::UserStore;
use crate::vault::{FileVault, Vault, DEFAULT_VAULT_PATH};

/// The assembled session & data-coherence layer.
///
/// Construct one per process and pass it by reference; there is no
/// ambient/global lookup anywhere in the layer.
pub struct Client {
    pub session: Arc<SessionManager>,
    pub guard: NavigationGuard,
    pub cache: Arc<CacheCoordinator>,
    pub resets: Arc<ResetRegistry>,
    pub user: Arc<UserStore>,
    pub parent: Arc<ParentStore>,
    pub teacher: Arc<TeacherStore>,
    pub shop: Arc<ShopStore>,
    pub dashboard: Arc<DashboardStore>,
}

impl Client {
    /// Build against the configured backend with the file-backed vault.
    ///
    /// Honours `.env` files and the `COINCRAFT_API_URL` variable.
    pub async fn from_env() -> ClientResult<Self> {
        dotenvy::dotenv().ok();

        let config = ApiConfig::from_env();
        tracing::info!(base_url = %config.base_url, "Connecting to backend");

        let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&config)?);
        let vault: Arc<dyn Vault> = Arc::new(FileVault::open(DEFAULT_VAULT_PATH)?);
        Ok(Self::assemble(backend, vault).await)
    }

    /// Wire the layer from explicit parts. Tests inject an in-process
    /// backend and an in-memory vault here.
    pub async fn assemble(backend: Arc<dyn Backend>, vault: Arc<dyn Vault>) -> Self {
        let cache = Arc::new(CacheCoordinator::new());
        let resets = Arc::new(ResetRegistry::new(cache.clone(), vault.clone()));
        let session = Arc::new(SessionManager::new(
            backend.clone(),
            vault.clone(),
            resets.clone(),
        ));
        let guard = NavigationGuard::new(session.clone());

        let user = UserStore::new(
            session.clone(),
            backend.clone(),
            cache.clone(),
            vault.clone(),
            &resets,
        )
        .await;
        let parent = ParentStore::new(
            session.clone(),
            backend.clone(),
            cache.clone(),
            vault.clone(),
            &resets,
        )
        .await;
        let teacher =
            TeacherStore::new(session.clone(), backend.clone(), cache.clone(), &resets).await;
        let shop = ShopStore::new(session.clone(), backend.clone(), cache.clone(), &resets).await;
        let dashboard =
            DashboardStore::new(session.clone(), backend.clone(), cache.clone(), &resets).await;

        Self {
            session,
            guard,
            cache,
            resets,
            user,
            parent,
            teacher,
            shop,
            dashboard,
        }
    }

    /// Restore any persisted session, validate it, and hydrate the user
    /// store. Returns whether a live session came back.
    pub async fn start(&self) -> bool {
        let restored = self.session.restore_from_persistence().await;
        self.user.hydrate().await;
        restored
    }

    /// Log in and seed the user store from the fresh identity.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let session = self.session.login(email, password).await?;
        self.user.hydrate().await;
        Ok(session)
    }

    /// Register a new account and seed the user store.
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<Session> {
        let session = self.session.register(request).await?;
        self.user.hydrate().await;
        Ok(session)
    }

    /// End the session and reset every store.
    pub async fn logout(&self) {
        self.session.logout().await;
    }
}
