//! The signed-in user's own data: profile, goals, transactions, and
//! coin -> money conversion requests.
//!
//! Coin-earning, coin-spending, and goal contributions apply their
//! predicted effect locally before the round trip and roll back on
//! failure; successful responses reconcile the balance with the
//! backend-confirmed total.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use coincraft_api::models::{
    validate_input, GoalContributionOutcome, GoalCreate, GoalRead, GoalUpdate, ProfileUpdate,
    RedemptionRequestCreate, RedemptionRequestRead, TaskRead, TransactionCreate, TransactionKind,
    TransactionRead, UserRead,
};
use coincraft_api::Backend;
use coincraft_core::cache::CacheKind;
use coincraft_core::error::{ClientError, ClientResult};
use coincraft_core::session::UserIdentity;

use crate::cache::CacheCoordinator;
use crate::optimistic::with_rollback;
use crate::reset::{Resettable, ResetRegistry};
use crate::session::SessionManager;
use crate::vault::{keys, Vault};

/// Scope key for the signed-in user's own slices.
const SCOPE: &str = "me";

/// How many transactions the persisted snapshot keeps.
const RECENT_SNAPSHOT_LEN: usize = 10;

/// Observable state of the user store.
#[derive(Debug, Clone, Default)]
pub struct UserState {
    pub profile: Option<UserIdentity>,
    pub goals: Vec<GoalRead>,
    pub tasks: Vec<TaskRead>,
    pub transactions: Vec<TransactionRead>,
    pub conversion_requests: Vec<RedemptionRequestRead>,
}

pub struct UserStore {
    session: Arc<SessionManager>,
    backend: Arc<dyn Backend>,
    cache: Arc<CacheCoordinator>,
    vault: Arc<dyn Vault>,
    state: RwLock<UserState>,
}

impl UserStore {
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
            state: RwLock::new(UserState::default()),
        });
        let dyn_store: Arc<dyn Resettable> = store.clone();
        let handle: Weak<dyn Resettable> = Arc::downgrade(&dyn_store);
        resets.register(handle).await;
        store
    }

    /// A copy of the current state.
    pub async fn state(&self) -> UserState {
        self.state.read().await.clone()
    }

    /// The best-known coin balance, `0` until one is learned.
    ///
    /// Falls back to the session identity's balance (fed by dashboard
    /// loads and mutation reconciliation) when the local profile has not
    /// learned one yet.
    pub async fn balance(&self) -> i64 {
        let local = self
            .state
            .read()
            .await
            .profile
            .as_ref()
            .and_then(|p| p.coins);
        match local {
            Some(coins) => coins,
            None => self
                .session
                .snapshot()
                .await
                .user
                .and_then(|u| u.coins)
                .unwrap_or(0),
        }
    }

    /// Seed the profile from the live session identity, falling back to
    /// the persisted snapshots so a restarted process paints instantly.
    pub async fn hydrate(&self) {
        let mut state = self.state.write().await;

        if let Some(user) = self.session.snapshot().await.user {
            state.profile = Some(user);
        } else if let Some(raw) = self.vault.get(keys::PROFILE_SNAPSHOT) {
            match serde_json::from_str(&raw) {
                Ok(profile) => state.profile = Some(profile),
                Err(e) => tracing::warn!(error = %e, "Discarding corrupt profile snapshot"),
            }
        }

        if state.transactions.is_empty() {
            if let Some(raw) = self.vault.get(keys::RECENT_TRANSACTIONS) {
                match serde_json::from_str(&raw) {
                    Ok(transactions) => state.transactions = transactions,
                    Err(e) => {
                        tracing::warn!(error = %e, "Discarding corrupt transactions snapshot")
                    }
                }
            }
        }
    }

    // --- Goals ---

    /// Load the user's goals, serving the cache while it is fresh.
    pub async fn load_goals(&self, force_refresh: bool) -> ClientResult<Vec<GoalRead>> {
        let token = self.session.require_token().await?;

        if !force_refresh && self.cache.is_valid(CacheKind::Goals, SCOPE).await {
            if let Some(goals) = self.cache.get::<Vec<GoalRead>>(CacheKind::Goals, SCOPE).await {
                self.state.write().await.goals = goals.clone();
                return Ok(goals);
            }
        }

        match self.backend.goals(&token).await {
            Ok(goals) => {
                self.cache.put(CacheKind::Goals, SCOPE, &goals).await;
                self.state.write().await.goals = goals.clone();
                Ok(goals)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    pub async fn create_goal(&self, input: GoalCreate) -> ClientResult<GoalRead> {
        validate_input(&input)?;
        let token = self.session.require_token().await?;

        match self.backend.create_goal(&token, &input).await {
            Ok(goal) => {
                let mut state = self.state.write().await;
                state.goals.push(goal.clone());
                let goals = state.goals.clone();
                drop(state);
                self.cache.put(CacheKind::Goals, SCOPE, &goals).await;
                Ok(goal)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    /// Edit a goal's title, target, icon, or deadline. The server's record
    /// replaces the local one on success.
    pub async fn update_goal(&self, goal_id: &str, update: GoalUpdate) -> ClientResult<GoalRead> {
        validate_input(&update)?;
        let token = self.session.require_token().await?;

        match self.backend.update_goal(&token, goal_id, &update).await {
            Ok(goal) => {
                let mut state = self.state.write().await;
                if let Some(slot) = state.goals.iter_mut().find(|g| g.id == goal.id) {
                    *slot = goal.clone();
                }
                let goals = state.goals.clone();
                drop(state);
                self.cache.put(CacheKind::Goals, SCOPE, &goals).await;
                Ok(goal)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    pub async fn delete_goal(&self, goal_id: &str) -> ClientResult<()> {
        let token = self.session.require_token().await?;

        match self.backend.delete_goal(&token, goal_id).await {
            Ok(()) => {
                let mut state = self.state.write().await;
                state.goals.retain(|g| g.id != goal_id);
                let goals = state.goals.clone();
                drop(state);
                self.cache.put(CacheKind::Goals, SCOPE, &goals).await;
                Ok(())
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    /// Move coins from the balance into a goal.
    ///
    /// Applied optimistically; on success the goal, the recorded
    /// transaction, and the balance are overwritten with the backend's
    /// authoritative values.
    pub async fn contribute_to_goal(
        &self,
        goal_id: &str,
        amount: i64,
    ) -> ClientResult<GoalContributionOutcome> {
        let token = self.session.require_token().await?;

        {
            let state = self.state.read().await;
            if !state.goals.iter().any(|g| g.id == goal_id) {
                return Err(ClientError::NotFound(format!("Goal {goal_id}")));
            }
        }
        let current = self.balance().await;
        if current < amount {
            return Err(ClientError::Rejected("Insufficient coins".to_string()));
        }

        let goal_id_owned = goal_id.to_string();
        let result = with_rollback(
            &self.state,
            |state| {
                if let Some(profile) = state.profile.as_mut() {
                    profile.coins = Some(current - amount);
                }
                if let Some(goal) = state.goals.iter_mut().find(|g| g.id == goal_id_owned) {
                    goal.current_amount += amount;
                    if goal.current_amount >= goal.target_amount {
                        goal.is_completed = true;
                    }
                }
            },
            self.backend.contribute_to_goal(&token, goal_id, amount),
        )
        .await;

        match result {
            Ok(outcome) => {
                self.reconcile_contribution(&outcome).await;
                Ok(outcome)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    /// Overwrite the optimistic state with the server's post-contribution
    /// truth.
    async fn reconcile_contribution(&self, outcome: &GoalContributionOutcome) {
        let mut state = self.state.write().await;
        if let Some(goal) = state.goals.iter_mut().find(|g| g.id == outcome.goal.id) {
            *goal = outcome.goal.clone();
        }
        if let Some(profile) = state.profile.as_mut() {
            profile.coins = Some(outcome.new_coin_balance);
        }
        state.transactions.insert(0, outcome.transaction.clone());
        let goals = state.goals.clone();
        let transactions = state.transactions.clone();
        drop(state);

        self.session.record_balance(outcome.new_coin_balance).await;
        self.cache.put(CacheKind::Goals, SCOPE, &goals).await;
        self.cache
            .put(CacheKind::Transactions, SCOPE, &transactions)
            .await;
        self.persist_snapshots().await;
    }

    // --- Transactions & the coin balance ---

    pub async fn load_transactions(&self, force_refresh: bool) -> ClientResult<Vec<TransactionRead>> {
        let token = self.session.require_token().await?;

        if !force_refresh && self.cache.is_valid(CacheKind::Transactions, SCOPE).await {
            if let Some(transactions) = self
                .cache
                .get::<Vec<TransactionRead>>(CacheKind::Transactions, SCOPE)
                .await
            {
                self.state.write().await.transactions = transactions.clone();
                return Ok(transactions);
            }
        }

        match self.backend.transactions(&token, None, None).await {
            Ok(transactions) => {
                self.cache
                    .put(CacheKind::Transactions, SCOPE, &transactions)
                    .await;
                self.state.write().await.transactions = transactions.clone();
                self.persist_snapshots().await;
                Ok(transactions)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    /// Record earned coins: balance up and a transaction in front,
    /// optimistically, replaced by the server's record on success.
    pub async fn add_coins(
        &self,
        amount: i64,
        description: &str,
        category: Option<&str>,
    ) -> ClientResult<TransactionRead> {
        self.record_transaction(TransactionKind::Earn, amount, description, category)
            .await
    }

    /// Spend coins from the balance. Rejected locally when the balance
    /// cannot cover the amount; otherwise optimistic with rollback.
    pub async fn spend_coins(
        &self,
        amount: i64,
        description: &str,
        category: Option<&str>,
    ) -> ClientResult<TransactionRead> {
        if self.balance().await < amount {
            return Err(ClientError::Rejected("Insufficient coins".to_string()));
        }
        self.record_transaction(TransactionKind::Spend, amount, description, category)
            .await
    }

    async fn record_transaction(
        &self,
        kind: TransactionKind,
        amount: i64,
        description: &str,
        category: Option<&str>,
    ) -> ClientResult<TransactionRead> {
        let token = self.session.require_token().await?;

        let create = TransactionCreate {
            kind,
            amount,
            description: description.to_string(),
            category: category.map(str::to_string),
            reference_id: None,
        };
        validate_input(&create)?;

        let user_id = self
            .state
            .read()
            .await
            .profile
            .as_ref()
            .map(|p| p.id.clone())
            .unwrap_or_default();

        // Provisional local record; swapped for the server's on success.
        let provisional = TransactionRead {
            id: format!("local-{}", Uuid::new_v4()),
            user_id,
            kind,
            amount,
            description: description.to_string(),
            category: category.map(str::to_string),
            reference_id: None,
            created_at: Utc::now(),
        };
        let provisional_id = provisional.id.clone();

        let delta = match kind {
            TransactionKind::Earn => amount,
            TransactionKind::Spend | TransactionKind::Save => -amount,
        };
        let current = self.balance().await;

        let result = with_rollback(
            &self.state,
            |state| {
                if let Some(profile) = state.profile.as_mut() {
                    profile.coins = Some(current + delta);
                }
                state.transactions.insert(0, provisional);
            },
            self.backend.create_transaction(&token, &create),
        )
        .await;

        match result {
            Ok(recorded) => {
                let mut state = self.state.write().await;
                if let Some(slot) = state
                    .transactions
                    .iter_mut()
                    .find(|t| t.id == provisional_id)
                {
                    *slot = recorded.clone();
                }
                let balance = state.profile.as_ref().and_then(|p| p.coins);
                let transactions = state.transactions.clone();
                drop(state);

                if let Some(balance) = balance {
                    self.session.record_balance(balance).await;
                }
                self.cache
                    .put(CacheKind::Transactions, SCOPE, &transactions)
                    .await;
                self.persist_snapshots().await;
                Ok(recorded)
            }
            Err(err) => Err(self.remote_err(err).await),
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

    /// Mark a task done. No coins move here -- the reward is credited by
    /// the backend once the assigner approves, and arrives with the next
    /// refresh.
    pub async fn complete_task(&self, task_id: &str) -> ClientResult<TaskRead> {
        let token = self.session.require_token().await?;

        match self.backend.complete_task(&token, task_id).await {
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

    // --- Conversion requests ---

    pub async fn load_conversion_requests(
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
                self.state.write().await.conversion_requests = requests.clone();
                return Ok(requests);
            }
        }

        match self.backend.conversion_requests(&token).await {
            Ok(requests) => {
                self.cache.put(CacheKind::Redemptions, SCOPE, &requests).await;
                self.state.write().await.conversion_requests = requests.clone();
                Ok(requests)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    /// Ask to convert coins into real money. No local balance change: the
    /// request stays pending until a parent resolves it.
    pub async fn request_conversion(
        &self,
        coins_amount: i64,
        description: Option<&str>,
    ) -> ClientResult<RedemptionRequestRead> {
        let token = self.session.require_token().await?;

        let create = RedemptionRequestCreate {
            coins_amount,
            description: description.map(str::to_string),
        };
        validate_input(&create)?;

        match self.backend.create_conversion_request(&token, &create).await {
            Ok(request) => {
                let mut state = self.state.write().await;
                state.conversion_requests.insert(0, request.clone());
                let requests = state.conversion_requests.clone();
                drop(state);
                self.cache.put(CacheKind::Redemptions, SCOPE, &requests).await;
                Ok(request)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    // --- Profile ---

    pub async fn update_profile(&self, update: ProfileUpdate) -> ClientResult<UserRead> {
        let token = self.session.require_token().await?;
        let user_id = self
            .state
            .read()
            .await
            .profile
            .as_ref()
            .map(|p| p.id.clone())
            .ok_or_else(|| ClientError::Internal("No profile loaded".to_string()))?;

        match self.backend.update_profile(&token, &user_id, &update).await {
            Ok(user) => {
                let mut state = self.state.write().await;
                if let Some(profile) = state.profile.as_mut() {
                    profile.name = user.name.clone();
                    profile.avatar_url = user.avatar_url.clone();
                }
                drop(state);
                self.persist_snapshots().await;
                Ok(user)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    // --- Plumbing ---

    /// Persist the profile and recent-transactions snapshots. Called at
    /// the end of every mutating operation.
    async fn persist_snapshots(&self) {
        let state = self.state.read().await;

        if let Some(profile) = &state.profile {
            match serde_json::to_string(profile) {
                Ok(raw) => {
                    if let Err(e) = self.vault.put(keys::PROFILE_SNAPSHOT, &raw) {
                        tracing::warn!(error = %e, "Failed to persist profile snapshot");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to serialize profile snapshot"),
            }
        }

        let recent: Vec<&TransactionRead> =
            state.transactions.iter().take(RECENT_SNAPSHOT_LEN).collect();
        match serde_json::to_string(&recent) {
            Ok(raw) => {
                if let Err(e) = self.vault.put(keys::RECENT_TRANSACTIONS, &raw) {
                    tracing::warn!(error = %e, "Failed to persist transactions snapshot");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize transactions snapshot"),
        }
    }

    async fn remote_err(&self, err: ClientError) -> ClientError {
        self.session.handle_remote_error(&err).await;
        err
    }
}

#[async_trait]
impl Resettable for UserStore {
    fn name(&self) -> &'static str {
        "user"
    }

    async fn reset(&self) -> ClientResult<()> {
        *self.state.write().await = UserState::default();
        Ok(())
    }
}
