//! Parent-side state: children, assigned tasks, and redemption requests
//! awaiting a decision.
//!
//! Credentials of freshly created child accounts are kept in the local
//! vault only, so the parent can read them back during the current
//! session; they are never sent to the server again.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use coincraft_api::models::{
    validate_input, ChildCreate, ChildRead, RedemptionRequestRead, RequestStatus, TaskCreate,
    TaskRead, TaskUpdate, UserRead,
};
use coincraft_api::Backend;
use coincraft_core::cache::CacheKind;
use coincraft_core::error::{ClientError, ClientResult};
use coincraft_core::roles::Role;

use crate::cache::CacheCoordinator;
use crate::optimistic::with_rollback;
use crate::reset::{Resettable, ResetRegistry};
use crate::session::SessionManager;
use crate::vault::{keys, Vault};

/// Scope key for the parent's own children and tasks.
const SCOPE: &str = "me";

/// Scope key for the family-wide redemption request slice.
const FAMILY_SCOPE: &str = "family";

/// Locally cached credentials for a just-created child account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChildCredentials {
    pub password: String,
    pub age: u8,
}

/// Observable state of the parent store.
#[derive(Debug, Clone, Default)]
pub struct ParentState {
    pub children: Vec<ChildRead>,
    pub tasks: Vec<TaskRead>,
    pub redemption_requests: Vec<RedemptionRequestRead>,
}

pub struct ParentStore {
    session: Arc<SessionManager>,
    backend: Arc<dyn Backend>,
    cache: Arc<CacheCoordinator>,
    vault: Arc<dyn Vault>,
    state: RwLock<ParentState>,
}

impl ParentStore {
    /// Build the store and register it with the reset sweep.
    pub async fn new(
        session: Arc<SessionManager>,
        backend: Arc<dyn Backend>,
        cache: Arc<CacheCoordinator>,
        vault: Arc<dyn Vault>,
        resets: &ResetRegistry,
    ) -> Arc<Self> {
        let store = Arc::new(Self {
            session,
            backend,
            cache,
            vault,
            state: RwLock::new(ParentState::default()),
        });
        let dyn_store: Arc<dyn Resettable> = store.clone();
        let handle: Weak<dyn Resettable> = Arc::downgrade(&dyn_store);
        resets.register(handle).await;
        store
    }

    pub async fn state(&self) -> ParentState {
        self.state.read().await.clone()
    }

    /// Token plus the parent's user id; `Forbidden` for any other role.
    async fn require_parent(&self) -> ClientResult<(String, String)> {
        let token = self.session.require_token().await?;
        let session = self.session.snapshot().await;
        match session.user {
            Some(user) if user.role == Role::Parent => Ok((token, user.id)),
            _ => Err(ClientError::Forbidden(
                "Only parents can manage children".to_string(),
            )),
        }
    }

    // --- Children ---

    pub async fn load_children(&self, force_refresh: bool) -> ClientResult<Vec<ChildRead>> {
        let (token, parent_id) = self.require_parent().await?;

        if !force_refresh && self.cache.is_valid(CacheKind::Children, SCOPE).await {
            if let Some(children) = self
                .cache
                .get::<Vec<ChildRead>>(CacheKind::Children, SCOPE)
                .await
            {
                self.state.write().await.children = children.clone();
                return Ok(children);
            }
        }

        match self.backend.children(&token, &parent_id).await {
            Ok(children) => {
                self.cache.put(CacheKind::Children, SCOPE, &children).await;
                self.state.write().await.children = children.clone();
                Ok(children)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    /// Create a child account. The generated credentials are stashed in
    /// the local vault, keyed by child id, for same-session review.
    pub async fn create_child(&self, input: ChildCreate) -> ClientResult<UserRead> {
        validate_input(&input)?;
        let (token, parent_id) = self.require_parent().await?;

        match self.backend.create_child(&token, &parent_id, &input).await {
            Ok(user) => {
                self.stash_credentials(&user.id, &input);

                let child = ChildRead {
                    id: user.id.clone(),
                    name: user.name.clone(),
                    email: user.email.clone(),
                    age: Some(input.age),
                    coins: Some(0),
                    avatar_url: user.avatar_url.clone(),
                    role: user.role,
                    created_at: user.created_at,
                };
                let mut state = self.state.write().await;
                state.children.push(child);
                let children = state.children.clone();
                drop(state);
                self.cache.put(CacheKind::Children, SCOPE, &children).await;
                Ok(user)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    /// Read back the locally stashed credentials for a child, if this
    /// session created the account.
    pub fn child_credentials(&self, child_id: &str) -> Option<StoredChildCredentials> {
        let raw = self.vault.get(keys::CHILD_CREDENTIALS)?;
        let map: HashMap<String, StoredChildCredentials> = serde_json::from_str(&raw).ok()?;
        map.get(child_id).cloned()
    }

    fn stash_credentials(&self, child_id: &str, input: &ChildCreate) {
        let mut map: HashMap<String, StoredChildCredentials> = self
            .vault
            .get(keys::CHILD_CREDENTIALS)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        map.insert(
            child_id.to_string(),
            StoredChildCredentials {
                password: input.password.clone(),
                age: input.age,
            },
        );

        match serde_json::to_string(&map) {
            Ok(raw) => {
                if let Err(e) = self.vault.put(keys::CHILD_CREDENTIALS, &raw) {
                    tracing::warn!(error = %e, "Failed to stash child credentials");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize child credentials"),
        }
    }

    // --- Tasks ---

    pub async fn load_tasks(&self, force_refresh: bool) -> ClientResult<Vec<TaskRead>> {
        let token = self.session.require_token().await?;

        if !force_refresh && self.cache.is_valid(CacheKind::Tasks, SCOPE).await {
            if let Some(tasks) = self.cache.get::<Vec<TaskRead>>(CacheKind::Tasks, SCOPE).await {
                self.state.write().await.tasks = tasks.clone();
                return Ok(tasks);
            }
        }

        match self.backend.tasks(&token).await {
            Ok(tasks) => {
                self.cache.put(CacheKind::Tasks, SCOPE, &tasks).await;
                self.state.write().await.tasks = tasks.clone();
                Ok(tasks)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    pub async fn assign_task(&self, input: TaskCreate) -> ClientResult<TaskRead> {
        validate_input(&input)?;
        let token = self.session.require_token().await?;

        match self.backend.create_task(&token, &input).await {
            Ok(task) => {
                let mut state = self.state.write().await;
                state.tasks.push(task.clone());
                let tasks = state.tasks.clone();
                drop(state);
                self.cache.put(CacheKind::Tasks, SCOPE, &tasks).await;
                Ok(task)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    /// Edit an assignment (reword it, change the reward, reschedule).
    /// The server's record replaces the local one on success.
    pub async fn update_task(&self, task_id: &str, update: TaskUpdate) -> ClientResult<TaskRead> {
        validate_input(&update)?;
        let token = self.session.require_token().await?;

        match self.backend.update_task(&token, task_id, &update).await {
            Ok(task) => {
                let mut state = self.state.write().await;
                if let Some(slot) = state.tasks.iter_mut().find(|t| t.id == task.id) {
                    *slot = task.clone();
                }
                let tasks = state.tasks.clone();
                drop(state);
                self.cache.put(CacheKind::Tasks, SCOPE, &tasks).await;
                Ok(task)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    /// Withdraw an assignment entirely.
    pub async fn delete_task(&self, task_id: &str) -> ClientResult<()> {
        let token = self.session.require_token().await?;

        match self.backend.delete_task(&token, task_id).await {
            Ok(()) => {
                let mut state = self.state.write().await;
                state.tasks.retain(|t| t.id != task_id);
                let tasks = state.tasks.clone();
                drop(state);
                self.cache.put(CacheKind::Tasks, SCOPE, &tasks).await;
                Ok(())
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    // --- Redemption requests ---

    pub async fn load_redemption_requests(
        &self,
        force_refresh: bool,
    ) -> ClientResult<Vec<RedemptionRequestRead>> {
        let (token, parent_id) = self.require_parent().await?;

        if !force_refresh && self.cache.is_valid(CacheKind::Redemptions, FAMILY_SCOPE).await {
            if let Some(requests) = self
                .cache
                .get::<Vec<RedemptionRequestRead>>(CacheKind::Redemptions, FAMILY_SCOPE)
                .await
            {
                self.state.write().await.redemption_requests = requests.clone();
                return Ok(requests);
            }
        }

        match self.backend.parent_redemption_requests(&token, &parent_id).await {
            Ok(requests) => {
                self.cache
                    .put(CacheKind::Redemptions, FAMILY_SCOPE, &requests)
                    .await;
                self.state.write().await.redemption_requests = requests.clone();
                Ok(requests)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    /// Approve a pending request. The status flips optimistically and is
    /// overwritten by (or rolled back to) the server's record.
    pub async fn approve_redemption(
        &self,
        request_id: &str,
    ) -> ClientResult<RedemptionRequestRead> {
        self.resolve_redemption(request_id, RequestStatus::Approved)
            .await
    }

    /// Reject a pending request; same discipline as approval.
    pub async fn reject_redemption(&self, request_id: &str) -> ClientResult<RedemptionRequestRead> {
        self.resolve_redemption(request_id, RequestStatus::Rejected)
            .await
    }

    async fn resolve_redemption(
        &self,
        request_id: &str,
        decision: RequestStatus,
    ) -> ClientResult<RedemptionRequestRead> {
        let (token, _) = self.require_parent().await?;

        {
            let state = self.state.read().await;
            let request = state
                .redemption_requests
                .iter()
                .find(|r| r.id == request_id)
                .ok_or_else(|| ClientError::NotFound(format!("Redemption request {request_id}")))?;
            if request.status != RequestStatus::Pending {
                return Err(ClientError::Rejected(
                    "Request has already been resolved".to_string(),
                ));
            }
        }

        let remote = async {
            match decision {
                RequestStatus::Approved => self.backend.approve_redemption(&token, request_id).await,
                _ => self.backend.reject_redemption(&token, request_id).await,
            }
        };

        let request_id_owned = request_id.to_string();
        let result = with_rollback(
            &self.state,
            |state| {
                if let Some(request) = state
                    .redemption_requests
                    .iter_mut()
                    .find(|r| r.id == request_id_owned)
                {
                    request.status = decision;
                }
            },
            remote,
        )
        .await;

        match result {
            Ok(resolved) => {
                let mut state = self.state.write().await;
                if let Some(slot) = state
                    .redemption_requests
                    .iter_mut()
                    .find(|r| r.id == resolved.id)
                {
                    *slot = resolved.clone();
                }
                let requests = state.redemption_requests.clone();
                drop(state);
                self.cache
                    .put(CacheKind::Redemptions, FAMILY_SCOPE, &requests)
                    .await;
                Ok(resolved)
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
impl Resettable for ParentStore {
    fn name(&self) -> &'static str {
        "parent"
    }

    async fn reset(&self) -> ClientResult<()> {
        *self.state.write().await = ParentState::default();
        Ok(())
    }
}
