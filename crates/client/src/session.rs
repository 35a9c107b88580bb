//! The session manager: owns the token and identity, and every transition
//! between logged-in and logged-out.

use std::sync::Arc;

use tokio::sync::RwLock;

use coincraft_api::models::{validate_input, Credentials, RegisterRequest};
use coincraft_api::Backend;
use coincraft_core::error::{ClientError, ClientResult};
use coincraft_core::roles::Role;
use coincraft_core::session::{Session, UserIdentity};

use crate::reset::ResetRegistry;
use crate::vault::{keys, Vault};

/// Owns in-memory session state and synchronizes it with the vault.
///
/// Constructed once at startup and shared by `Arc` with the guard and
/// every domain store. All transitions run through here so the
/// token/identity invariant holds and the vault stays in step.
pub struct SessionManager {
    backend: Arc<dyn Backend>,
    vault: Arc<dyn Vault>,
    resets: Arc<ResetRegistry>,
    state: RwLock<Session>,
}

impl SessionManager {
    pub fn new(
        backend: Arc<dyn Backend>,
        vault: Arc<dyn Vault>,
        resets: Arc<ResetRegistry>,
    ) -> Self {
        Self {
            backend,
            vault,
            resets,
            state: RwLock::new(Session::default()),
        }
    }

    // --- Observers ---

    /// A copy of the current session.
    pub async fn snapshot(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    /// The current role, `None` for an unauthenticated session.
    pub async fn role(&self) -> Option<Role> {
        self.state.read().await.role()
    }

    pub async fn is_parent(&self) -> bool {
        self.role().await == Some(Role::Parent)
    }

    pub async fn is_teacher(&self) -> bool {
        self.role().await == Some(Role::Teacher)
    }

    /// Either child role.
    pub async fn is_child(&self) -> bool {
        self.role().await.is_some_and(|r| r.is_child())
    }

    /// The older-child ("teen") role.
    pub async fn is_teen(&self) -> bool {
        self.role().await.is_some_and(|r| r.is_teen())
    }

    /// The bearer token, or `Unauthorized` when no session is live.
    ///
    /// Domain stores call this at the top of every remote operation.
    pub async fn require_token(&self) -> ClientResult<String> {
        self.state
            .read()
            .await
            .token
            .clone()
            .ok_or_else(|| ClientError::Unauthorized("No session token".to_string()))
    }

    // --- Transitions ---

    /// Authenticate with email and password.
    ///
    /// On any failure the prior session (normally none) is left untouched
    /// and the error is returned for form-level display.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let credentials = Credentials {
            username: email.to_string(),
            password: password.to_string(),
        };

        // 1. Exchange credentials for a token.
        let login = self.backend.login(&credentials).await?;

        // 2. Fetch the user the token belongs to; a token without a
        //    decodable identity is not a usable session.
        let user = self.backend.current_user(&login.access_token).await?;

        // 3. Install and persist the new session.
        let identity = user.into_identity();
        let session = Session::authenticated(login.access_token, identity.clone());
        self.install(session.clone()).await;

        tracing::info!(user_id = %identity.id, role = identity.role.as_str(), "Logged in");
        Ok(session)
    }

    /// Create a new account and log straight into it.
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<Session> {
        validate_input(request)?;

        let response = self.backend.register(request).await?;
        let identity = response.user.into_identity();
        let session = Session::authenticated(response.access_token, identity.clone());
        self.install(session.clone()).await;

        tracing::info!(user_id = %identity.id, role = identity.role.as_str(), "Registered");
        Ok(session)
    }

    /// Restore a persisted session, then validate it against the backend.
    ///
    /// Returns `true` when a live, validated session came back. Any
    /// validation failure -- rejected token, unreachable backend, corrupt
    /// persisted record -- degrades silently to the logged-out state
    /// (fail-closed) and clears the persisted identity.
    pub async fn restore_from_persistence(&self) -> bool {
        let (Some(token), Some(raw_user)) =
            (self.vault.get(keys::TOKEN), self.vault.get(keys::USER))
        else {
            return false;
        };

        let user: UserIdentity = match serde_json::from_str(&raw_user) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Persisted user record is corrupt; discarding session");
                self.logout().await;
                return false;
            }
        };

        // Optimistically consider the session live so the validation call
        // itself can carry the token.
        *self.state.write().await = Session::authenticated(token, user);

        match self.refresh().await {
            Ok(identity) => {
                tracing::info!(user_id = %identity.id, "Restored persisted session");
                true
            }
            Err(err) => {
                tracing::info!(error = %err, "Persisted session failed validation; logging out");
                // An unauthorized refresh has already logged out; every
                // other failure degrades the same way.
                if self.is_authenticated().await {
                    self.logout().await;
                }
                false
            }
        }
    }

    /// Re-fetch the current-user record with the stored token.
    ///
    /// Updates and persists the identity half of the session. A rejected
    /// token ends the session through the logout path.
    pub async fn refresh(&self) -> ClientResult<UserIdentity> {
        let token = self.require_token().await?;

        match self.backend.current_user(&token).await {
            Ok(user) => {
                let mut identity = user.into_identity();
                let mut state = self.state.write().await;
                // The user record carries no balance; keep one learned
                // from an earlier mutation or dashboard load.
                if identity.coins.is_none() {
                    identity.coins = state.user.as_ref().and_then(|u| u.coins);
                }
                state.user = Some(identity.clone());
                drop(state);

                self.persist_user(&identity);
                Ok(identity)
            }
            Err(err) if err.is_unauthorized() => {
                tracing::info!("Backend rejected the session token; logging out");
                self.logout().await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// End the session: best-effort remote invalidation, clear the
    /// in-memory state, and run the reset sweep (stores, cache, vault).
    pub async fn logout(&self) {
        let token = self.state.read().await.token.clone();

        if let Some(token) = token {
            // Failure here is logged, not fatal -- the local session dies
            // either way.
            if let Err(e) = self.backend.logout(&token).await {
                tracing::warn!(error = %e, "Remote logout failed; continuing");
            }
        }

        self.state.write().await.clear();
        self.resets.reset_all().await;

        tracing::info!("Logged out");
    }

    /// Route invalid-token responses from any remote call through the
    /// logout path, per the backend contract that a 401 means the session
    /// is dead.
    pub async fn handle_remote_error(&self, err: &ClientError) {
        if err.is_unauthorized() && self.is_authenticated().await {
            tracing::info!("Remote call returned unauthorized; ending session");
            self.logout().await;
        }
    }

    /// Record a balance learned from a mutation or dashboard response on
    /// the session identity.
    pub async fn record_balance(&self, coins: i64) {
        let identity = {
            let mut state = self.state.write().await;
            state.user.as_mut().map(|user| {
                user.coins = Some(coins);
                user.clone()
            })
        };
        if let Some(identity) = identity {
            self.persist_user(&identity);
        }
    }

    // --- Persistence ---

    async fn install(&self, session: Session) {
        let user = session.user.clone();
        let token = session.token.clone();

        *self.state.write().await = session;

        if let Some(token) = token {
            if let Err(e) = self.vault.put(keys::TOKEN, &token) {
                tracing::warn!(error = %e, "Failed to persist session token");
            }
        }
        if let Some(user) = user {
            self.persist_user(&user);
        }
    }

    fn persist_user(&self, user: &UserIdentity) {
        match serde_json::to_string(user) {
            Ok(raw) => {
                if let Err(e) = self.vault.put(keys::USER, &raw) {
                    tracing::warn!(error = %e, "Failed to persist user record");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize user record"),
        }
    }
}
