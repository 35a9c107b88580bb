//! Shared test support: an in-process fake backend and client builders.
//!
//! The fake implements [`Backend`] over plain in-memory state, with
//! per-method call counters (for cache assertions) and failure knobs
//! (rejections, revoked tokens, a hung validation call).

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use coincraft_api::models::{
    ChildCreate, ChildRead, ClassCreate, ClassRead, Credentials, DashboardStats, DashboardSummary,
    GoalContributionOutcome, GoalCreate, GoalRead, GoalUpdate, LoginResponse, ProfileUpdate,
    RedemptionRequestCreate, RedemptionRequestRead, RegisterRequest, RegisterResponse,
    RequestStatus, ShopItemRead, StudentRead, TaskCreate, TaskRead, TaskStatus, TaskUpdate,
    TransactionCreate, TransactionKind, TransactionRead, UserRead,
};
use coincraft_api::Backend;
use coincraft_client::vault::MemoryVault;
use coincraft_client::Client;
use coincraft_core::error::{ClientError, ClientResult};
use coincraft_core::roles::Role;

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coincraft_client=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

struct Account {
    password: String,
    user: UserRead,
}

#[derive(Default)]
struct FakeData {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    goals: Vec<GoalRead>,
    transactions: Vec<TransactionRead>,
    tasks: Vec<TaskRead>,
    classes: Vec<ClassRead>,
    students: HashMap<String, Vec<StudentRead>>,
    shop_items: Vec<ShopItemRead>,
    requests: Vec<RedemptionRequestRead>,
    children: Vec<ChildRead>,
    balance: i64,
    next_id: u32,
}

/// In-memory [`Backend`] with failure knobs and call counters.
#[derive(Default)]
pub struct FakeBackend {
    data: Mutex<FakeData>,
    calls: Mutex<HashMap<&'static str, u32>>,
    /// Every `create_transaction` is rejected with "Insufficient coins".
    pub reject_transactions: AtomicBool,
    /// Every `contribute_to_goal` is rejected with "Insufficient coins".
    pub reject_contributions: AtomicBool,
    /// Every authenticated call sees its token as revoked.
    pub revoke_tokens: AtomicBool,
    /// `current_user` never completes (guard timeout scenarios).
    pub hang_current_user: AtomicBool,
    /// Remote `logout` fails with a network error.
    pub fail_logout: AtomicBool,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn data(&self) -> MutexGuard<'_, FakeData> {
        match self.data.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn bump(&self, name: &'static str) {
        let mut calls = match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *calls.entry(name).or_insert(0) += 1;
    }

    /// How many times `name` was called.
    pub fn count(&self, name: &'static str) -> u32 {
        match self.calls.lock() {
            Ok(guard) => guard.get(name).copied().unwrap_or(0),
            Err(poisoned) => poisoned.into_inner().get(name).copied().unwrap_or(0),
        }
    }

    fn next_id(data: &mut FakeData, prefix: &str) -> String {
        data.next_id += 1;
        format!("{prefix}-{}", data.next_id)
    }

    // --- Seeding helpers ---

    pub fn seed_account(&self, role: Role, name: &str, email: &str, password: &str) {
        let mut data = self.data();
        let id = Self::next_id(&mut data, "user");
        data.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: UserRead {
                    id,
                    email: email.to_string(),
                    name: name.to_string(),
                    role,
                    avatar_url: None,
                    is_active: true,
                    created_at: Utc::now(),
                },
            },
        );
    }

    pub fn set_balance(&self, balance: i64) {
        self.data().balance = balance;
    }

    pub fn balance(&self) -> i64 {
        self.data().balance
    }

    pub fn seed_goal(&self, id: &str, title: &str, target: i64, current: i64) {
        let mut data = self.data();
        data.goals.push(GoalRead {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            title: title.to_string(),
            description: None,
            target_amount: target,
            current_amount: current,
            icon: None,
            deadline: None,
            is_completed: current >= target,
            created_at: Utc::now(),
        });
    }

    pub fn seed_shop_item(&self, id: &str, name: &str, price: i64, available: bool) {
        let mut data = self.data();
        data.shop_items.push(ShopItemRead {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("{name} from the shop"),
            price,
            category: "toys".to_string(),
            emoji: None,
            available,
        });
    }

    pub fn seed_class(&self, id: &str, name: &str, students_count: u32) {
        let mut data = self.data();
        data.classes.push(ClassRead {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            teacher_id: "user-1".to_string(),
            age_group: "8-10".to_string(),
            class_code: "ABC123".to_string(),
            is_active: true,
            created_at: Utc::now(),
            students_count: Some(students_count),
            average_performance: None,
        });
    }

    pub fn seed_student(&self, class_id: &str, user_id: &str, name: &str) {
        let mut data = self.data();
        data.students
            .entry(class_id.to_string())
            .or_default()
            .push(StudentRead {
                user_id: user_id.to_string(),
                name: name.to_string(),
                email: format!("{user_id}@school.example"),
                avatar_url: None,
                age: Some(9),
                level: Some(1),
                performance_score: None,
                last_activity_date: None,
            });
    }

    /// A request already resolved (or pending) on the server side.
    pub fn seed_request(&self, id: &str, coins: i64, status: RequestStatus) {
        let mut data = self.data();
        data.requests.push(RedemptionRequestRead {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            coins_amount: coins,
            description: None,
            cash_amount: Some(coins as f64 * 0.10),
            status,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
        });
    }

    fn authed(&self, token: &str) -> ClientResult<UserRead> {
        if self.revoke_tokens.load(Ordering::SeqCst) {
            return Err(ClientError::Unauthorized("Token revoked".to_string()));
        }
        let data = self.data();
        data.tokens
            .get(token)
            .and_then(|email| data.accounts.get(email))
            .map(|account| account.user.clone())
            .ok_or_else(|| ClientError::Unauthorized("Unknown token".to_string()))
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginResponse> {
        self.bump("login");
        let mut data = self.data();
        let account = data
            .accounts
            .get(&credentials.username)
            .filter(|a| a.password == credentials.password)
            .ok_or_else(|| ClientError::Rejected("Invalid username or password".to_string()))?;
        let email = account.user.email.clone();

        let token = Self::next_id(&mut data, "tok");
        data.tokens.insert(token.clone(), email);
        Ok(LoginResponse {
            access_token: token,
            token_type: Some("bearer".to_string()),
        })
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<RegisterResponse> {
        self.bump("register");
        let mut data = self.data();
        if data.accounts.contains_key(&request.email) {
            return Err(ClientError::Rejected(
                "A user with this email already exists".to_string(),
            ));
        }

        let id = Self::next_id(&mut data, "user");
        let user = UserRead {
            id,
            email: request.email.clone(),
            name: request.name.clone(),
            role: request.role,
            avatar_url: request.avatar_url.clone(),
            is_active: true,
            created_at: Utc::now(),
        };
        data.accounts.insert(
            request.email.clone(),
            Account {
                password: request.password.clone(),
                user: user.clone(),
            },
        );

        let token = Self::next_id(&mut data, "tok");
        data.tokens.insert(token.clone(), request.email.clone());
        Ok(RegisterResponse {
            access_token: token,
            user,
        })
    }

    async fn logout(&self, token: &str) -> ClientResult<()> {
        self.bump("logout");
        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(ClientError::Network("backend unreachable".to_string()));
        }
        self.data().tokens.remove(token);
        Ok(())
    }

    async fn current_user(&self, token: &str) -> ClientResult<UserRead> {
        self.bump("current_user");
        if self.hang_current_user.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.authed(token)
    }

    async fn update_profile(
        &self,
        token: &str,
        _user_id: &str,
        update: &ProfileUpdate,
    ) -> ClientResult<UserRead> {
        self.bump("update_profile");
        let user = self.authed(token)?;
        let mut data = self.data();
        let account = data
            .accounts
            .get_mut(&user.email)
            .ok_or_else(|| ClientError::NotFound("User".to_string()))?;
        if let Some(name) = &update.name {
            account.user.name = name.clone();
        }
        if let Some(avatar_url) = &update.avatar_url {
            account.user.avatar_url = Some(avatar_url.clone());
        }
        Ok(account.user.clone())
    }

    async fn create_child(
        &self,
        token: &str,
        _parent_id: &str,
        child: &ChildCreate,
    ) -> ClientResult<UserRead> {
        self.bump("create_child");
        let parent = self.authed(token)?;
        if parent.role != Role::Parent {
            return Err(ClientError::Forbidden(
                "Only parents can create child accounts".to_string(),
            ));
        }

        let mut data = self.data();
        let id = Self::next_id(&mut data, "child");
        let role = if child.age < 13 {
            Role::YoungerChild
        } else {
            Role::OlderChild
        };
        let user = UserRead {
            id: id.clone(),
            email: child.email.clone(),
            name: child.name.clone(),
            role,
            avatar_url: child.avatar_url.clone(),
            is_active: true,
            created_at: Utc::now(),
        };
        data.accounts.insert(
            child.email.clone(),
            Account {
                password: child.password.clone(),
                user: user.clone(),
            },
        );
        data.children.push(ChildRead {
            id,
            name: child.name.clone(),
            email: child.email.clone(),
            age: Some(child.age),
            coins: Some(0),
            avatar_url: child.avatar_url.clone(),
            role,
            created_at: user.created_at,
        });
        Ok(user)
    }

    async fn children(&self, token: &str, _parent_id: &str) -> ClientResult<Vec<ChildRead>> {
        self.bump("children");
        self.authed(token)?;
        Ok(self.data().children.clone())
    }

    async fn goals(&self, token: &str) -> ClientResult<Vec<GoalRead>> {
        self.bump("goals");
        self.authed(token)?;
        Ok(self.data().goals.clone())
    }

    async fn create_goal(&self, token: &str, goal: &GoalCreate) -> ClientResult<GoalRead> {
        self.bump("create_goal");
        let user = self.authed(token)?;
        let mut data = self.data();
        let id = Self::next_id(&mut data, "goal");
        let created = GoalRead {
            id,
            user_id: user.id,
            title: goal.title.clone(),
            description: goal.description.clone(),
            target_amount: goal.target_amount,
            current_amount: 0,
            icon: goal.icon.clone(),
            deadline: goal.deadline,
            is_completed: false,
            created_at: Utc::now(),
        };
        data.goals.push(created.clone());
        Ok(created)
    }

    async fn update_goal(
        &self,
        token: &str,
        goal_id: &str,
        update: &GoalUpdate,
    ) -> ClientResult<GoalRead> {
        self.bump("update_goal");
        self.authed(token)?;
        let mut data = self.data();
        let goal = data
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| ClientError::NotFound("Goal".to_string()))?;
        if let Some(title) = &update.title {
            goal.title = title.clone();
        }
        if let Some(description) = &update.description {
            goal.description = Some(description.clone());
        }
        if let Some(target_amount) = update.target_amount {
            goal.target_amount = target_amount;
            goal.is_completed = goal.current_amount >= target_amount;
        }
        if let Some(icon) = &update.icon {
            goal.icon = Some(icon.clone());
        }
        if let Some(deadline) = update.deadline {
            goal.deadline = Some(deadline);
        }
        Ok(goal.clone())
    }

    async fn delete_goal(&self, token: &str, goal_id: &str) -> ClientResult<()> {
        self.bump("delete_goal");
        self.authed(token)?;
        self.data().goals.retain(|g| g.id != goal_id);
        Ok(())
    }

    async fn contribute_to_goal(
        &self,
        token: &str,
        goal_id: &str,
        amount: i64,
    ) -> ClientResult<GoalContributionOutcome> {
        self.bump("contribute_to_goal");
        let user = self.authed(token)?;
        if self.reject_contributions.load(Ordering::SeqCst) {
            return Err(ClientError::Rejected("Insufficient coins".to_string()));
        }

        let mut data = self.data();
        if data.balance < amount {
            return Err(ClientError::Rejected("Insufficient coins".to_string()));
        }
        data.balance -= amount;
        let balance = data.balance;

        let tx_id = Self::next_id(&mut data, "tx");
        let goal = data
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| ClientError::NotFound("Goal".to_string()))?;
        goal.current_amount += amount;
        if goal.current_amount >= goal.target_amount {
            goal.is_completed = true;
        }
        let goal = goal.clone();

        let transaction = TransactionRead {
            id: tx_id,
            user_id: user.id,
            kind: TransactionKind::Save,
            amount,
            description: format!("Contributed to goal: {}", goal.title),
            category: Some("goal".to_string()),
            reference_id: Some(goal.id.clone()),
            created_at: Utc::now(),
        };
        data.transactions.insert(0, transaction.clone());

        Ok(GoalContributionOutcome {
            goal,
            transaction,
            new_coin_balance: balance,
        })
    }

    async fn transactions(
        &self,
        token: &str,
        kind: Option<TransactionKind>,
        limit: Option<u32>,
    ) -> ClientResult<Vec<TransactionRead>> {
        self.bump("transactions");
        self.authed(token)?;
        let data = self.data();
        let mut transactions: Vec<TransactionRead> = data
            .transactions
            .iter()
            .filter(|t| kind.map_or(true, |k| t.kind == k))
            .cloned()
            .collect();
        if let Some(limit) = limit {
            transactions.truncate(limit as usize);
        }
        Ok(transactions)
    }

    async fn create_transaction(
        &self,
        token: &str,
        transaction: &TransactionCreate,
    ) -> ClientResult<TransactionRead> {
        self.bump("create_transaction");
        let user = self.authed(token)?;
        if self.reject_transactions.load(Ordering::SeqCst) {
            return Err(ClientError::Rejected("Insufficient coins".to_string()));
        }

        let mut data = self.data();
        match transaction.kind {
            TransactionKind::Earn => data.balance += transaction.amount,
            TransactionKind::Spend | TransactionKind::Save => data.balance -= transaction.amount,
        }
        let id = Self::next_id(&mut data, "tx");
        let created = TransactionRead {
            id,
            user_id: user.id,
            kind: transaction.kind,
            amount: transaction.amount,
            description: transaction.description.clone(),
            category: transaction.category.clone(),
            reference_id: transaction.reference_id.clone(),
            created_at: Utc::now(),
        };
        data.transactions.insert(0, created.clone());
        Ok(created)
    }

    async fn tasks(&self, token: &str) -> ClientResult<Vec<TaskRead>> {
        self.bump("tasks");
        self.authed(token)?;
        Ok(self.data().tasks.clone())
    }

    async fn create_task(&self, token: &str, task: &TaskCreate) -> ClientResult<TaskRead> {
        self.bump("create_task");
        let user = self.authed(token)?;
        let mut data = self.data();
        let id = Self::next_id(&mut data, "task");
        let created = TaskRead {
            id,
            assigned_by: user.id,
            assigned_to: task.assigned_to.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            coins_reward: task.coins_reward,
            due_date: task.due_date,
            requires_approval: task.requires_approval,
            status: TaskStatus::Pending,
            completed_at: None,
            created_at: Utc::now(),
        };
        data.tasks.push(created.clone());
        Ok(created)
    }

    async fn update_task(
        &self,
        token: &str,
        task_id: &str,
        update: &TaskUpdate,
    ) -> ClientResult<TaskRead> {
        self.bump("update_task");
        self.authed(token)?;
        let mut data = self.data();
        let task = data
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| ClientError::NotFound("Task".to_string()))?;
        if let Some(title) = &update.title {
            task.title = title.clone();
        }
        if let Some(description) = &update.description {
            task.description = Some(description.clone());
        }
        if let Some(coins_reward) = update.coins_reward {
            task.coins_reward = coins_reward;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        Ok(task.clone())
    }

    async fn complete_task(&self, token: &str, task_id: &str) -> ClientResult<TaskRead> {
        self.bump("complete_task");
        self.authed(token)?;
        let mut data = self.data();
        let task = data
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| ClientError::NotFound("Task".to_string()))?;
        task.status = TaskStatus::Completed;
        task.completed_at = Some(Utc::now());
        Ok(task.clone())
    }

    async fn delete_task(&self, token: &str, task_id: &str) -> ClientResult<()> {
        self.bump("delete_task");
        self.authed(token)?;
        self.data().tasks.retain(|t| t.id != task_id);
        Ok(())
    }

    async fn teacher_classes(&self, token: &str, _teacher_id: &str) -> ClientResult<Vec<ClassRead>> {
        self.bump("teacher_classes");
        self.authed(token)?;
        Ok(self.data().classes.clone())
    }

    async fn create_class(
        &self,
        token: &str,
        teacher_id: &str,
        class: &ClassCreate,
    ) -> ClientResult<ClassRead> {
        self.bump("create_class");
        self.authed(token)?;
        let mut data = self.data();
        let id = Self::next_id(&mut data, "class");
        let created = ClassRead {
            id,
            name: class.name.clone(),
            description: class.description.clone(),
            teacher_id: teacher_id.to_string(),
            age_group: class.age_group.clone(),
            class_code: "NEW123".to_string(),
            is_active: true,
            created_at: Utc::now(),
            students_count: Some(0),
            average_performance: None,
        };
        data.classes.push(created.clone());
        Ok(created)
    }

    async fn class_students(&self, token: &str, class_id: &str) -> ClientResult<Vec<StudentRead>> {
        self.bump("class_students");
        self.authed(token)?;
        Ok(self.data().students.get(class_id).cloned().unwrap_or_default())
    }

    async fn shop_items(&self, token: &str) -> ClientResult<Vec<ShopItemRead>> {
        self.bump("shop_items");
        self.authed(token)?;
        Ok(self.data().shop_items.clone())
    }

    async fn conversion_requests(&self, token: &str) -> ClientResult<Vec<RedemptionRequestRead>> {
        self.bump("conversion_requests");
        self.authed(token)?;
        Ok(self.data().requests.clone())
    }

    async fn create_conversion_request(
        &self,
        token: &str,
        request: &RedemptionRequestCreate,
    ) -> ClientResult<RedemptionRequestRead> {
        self.bump("create_conversion_request");
        let user = self.authed(token)?;
        let mut data = self.data();
        let id = Self::next_id(&mut data, "req");
        let created = RedemptionRequestRead {
            id,
            user_id: user.id,
            coins_amount: request.coins_amount,
            description: request.description.clone(),
            cash_amount: Some(request.coins_amount as f64 * 0.10),
            status: RequestStatus::Pending,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
        };
        data.requests.insert(0, created.clone());
        Ok(created)
    }

    async fn parent_redemption_requests(
        &self,
        token: &str,
        _parent_id: &str,
    ) -> ClientResult<Vec<RedemptionRequestRead>> {
        self.bump("parent_redemption_requests");
        self.authed(token)?;
        Ok(self.data().requests.clone())
    }

    async fn approve_redemption(
        &self,
        token: &str,
        request_id: &str,
    ) -> ClientResult<RedemptionRequestRead> {
        self.bump("approve_redemption");
        let user = self.authed(token)?;
        let mut data = self.data();
        let amount = {
            let request = data
                .requests
                .iter_mut()
                .find(|r| r.id == request_id)
                .ok_or_else(|| ClientError::NotFound("Redemption request".to_string()))?;
            request.status = RequestStatus::Approved;
            request.approved_by = Some(user.id);
            request.approved_at = Some(Utc::now());
            request.coins_amount
        };
        data.balance -= amount;
        let request = data
            .requests
            .iter()
            .find(|r| r.id == request_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Redemption request".to_string()))?;
        Ok(request)
    }

    async fn reject_redemption(
        &self,
        token: &str,
        request_id: &str,
    ) -> ClientResult<RedemptionRequestRead> {
        self.bump("reject_redemption");
        let user = self.authed(token)?;
        let mut data = self.data();
        let request = data
            .requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| ClientError::NotFound("Redemption request".to_string()))?;
        request.status = RequestStatus::Rejected;
        request.approved_by = Some(user.id);
        request.approved_at = Some(Utc::now());
        Ok(request.clone())
    }

    async fn dashboard(&self, token: &str, _role: Role) -> ClientResult<DashboardSummary> {
        self.bump("dashboard");
        let user = self.authed(token)?;
        let data = self.data();
        Ok(DashboardSummary {
            user,
            stats: DashboardStats {
                total_coins: data.balance,
                level: 1,
                streak_days: 0,
                goals_count: data.goals.len() as u32,
                completed_tasks: 0,
            },
            recent_transactions: data.transactions.iter().take(5).cloned().collect(),
            active_goals: data.goals.iter().filter(|g| !g.is_completed).cloned().collect(),
            pending_tasks: data
                .tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Pending)
                .cloned()
                .collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// Client builders
// ---------------------------------------------------------------------------

/// Assemble a client over the fake backend with an in-memory vault.
pub async fn build_client(backend: Arc<FakeBackend>) -> Client {
    Client::assemble(backend, Arc::new(MemoryVault::new())).await
}

/// A logged-in younger-child session with a backend balance of 100.
pub async fn child_client() -> (Client, Arc<FakeBackend>) {
    init_logging();
    let backend = FakeBackend::new();
    backend.seed_account(Role::YoungerChild, "Luna Smith", "luna@example.com", "hunter2secret");
    backend.set_balance(100);

    let client = build_client(backend.clone()).await;
    client
        .login("luna@example.com", "hunter2secret")
        .await
        .expect("seeded login should succeed");
    // Learn the authoritative balance the way the app does, via the
    // dashboard aggregate.
    client
        .dashboard
        .load(false)
        .await
        .expect("dashboard load should succeed");
    (client, backend)
}

/// A logged-in parent session.
pub async fn parent_client() -> (Client, Arc<FakeBackend>) {
    init_logging();
    let backend = FakeBackend::new();
    backend.seed_account(Role::Parent, "Sarah Parent", "sarah@example.com", "hunter2secret");

    let client = build_client(backend.clone()).await;
    client
        .login("sarah@example.com", "hunter2secret")
        .await
        .expect("seeded login should succeed");
    (client, backend)
}

/// A logged-in teacher session.
pub async fn teacher_client() -> (Client, Arc<FakeBackend>) {
    init_logging();
    let backend = FakeBackend::new();
    backend.seed_account(Role::Teacher, "Mrs. Johnson", "teacher@example.com", "hunter2secret");

    let client = build_client(backend.clone()).await;
    client
        .login("teacher@example.com", "hunter2secret")
        .await
        .expect("seeded login should succeed");
    (client, backend)
}
