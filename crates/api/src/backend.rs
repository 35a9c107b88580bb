//! The consumed backend surface as a trait.
//!
//! The session layer owns the bearer token and passes it into every
//! authenticated call, so implementations stay stateless. Integration
//! tests substitute an in-process fake for [`HttpBackend`](crate::http::HttpBackend).

use async_trait::async_trait;

use coincraft_core::error::ClientResult;
use coincraft_core::roles::Role;

use crate::models::{
    ChildCreate, ChildRead, ClassCreate, ClassRead, Credentials, DashboardSummary,
    GoalContributionOutcome, GoalCreate, GoalRead, GoalUpdate, LoginResponse, ProfileUpdate,
    RedemptionRequestCreate, RedemptionRequestRead, RegisterRequest, RegisterResponse,
    ShopItemRead, StudentRead, TaskCreate, TaskRead, TaskUpdate, TransactionCreate,
    TransactionKind, TransactionRead, UserRead,
};

/// Every remote operation the client layer consumes.
#[async_trait]
pub trait Backend: Send + Sync {
    // --- Authentication ---

    /// Exchange credentials for an access token (form-encoded).
    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginResponse>;

    /// Create a new account; returns a token plus the created user.
    async fn register(&self, request: &RegisterRequest) -> ClientResult<RegisterResponse>;

    /// Invalidate the session server-side. Best-effort for JWT backends.
    async fn logout(&self, token: &str) -> ClientResult<()>;

    /// Fetch the user the token belongs to. Doubles as token validation.
    async fn current_user(&self, token: &str) -> ClientResult<UserRead>;

    // --- Users & children ---

    async fn update_profile(
        &self,
        token: &str,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> ClientResult<UserRead>;

    async fn create_child(
        &self,
        token: &str,
        parent_id: &str,
        child: &ChildCreate,
    ) -> ClientResult<UserRead>;

    async fn children(&self, token: &str, parent_id: &str) -> ClientResult<Vec<ChildRead>>;

    // --- Goals ---

    async fn goals(&self, token: &str) -> ClientResult<Vec<GoalRead>>;

    async fn create_goal(&self, token: &str, goal: &GoalCreate) -> ClientResult<GoalRead>;

    async fn update_goal(
        &self,
        token: &str,
        goal_id: &str,
        update: &GoalUpdate,
    ) -> ClientResult<GoalRead>;

    async fn delete_goal(&self, token: &str, goal_id: &str) -> ClientResult<()>;

    /// Move coins into a goal; returns the authoritative post-contribution
    /// state (goal, recorded transaction, new balance).
    async fn contribute_to_goal(
        &self,
        token: &str,
        goal_id: &str,
        amount: i64,
    ) -> ClientResult<GoalContributionOutcome>;

    // --- Transactions ---

    async fn transactions(
        &self,
        token: &str,
        kind: Option<TransactionKind>,
        limit: Option<u32>,
    ) -> ClientResult<Vec<TransactionRead>>;

    async fn create_transaction(
        &self,
        token: &str,
        transaction: &TransactionCreate,
    ) -> ClientResult<TransactionRead>;

    // --- Tasks ---

    async fn tasks(&self, token: &str) -> ClientResult<Vec<TaskRead>>;

    async fn create_task(&self, token: &str, task: &TaskCreate) -> ClientResult<TaskRead>;

    async fn update_task(
        &self,
        token: &str,
        task_id: &str,
        update: &TaskUpdate,
    ) -> ClientResult<TaskRead>;

    async fn complete_task(&self, token: &str, task_id: &str) -> ClientResult<TaskRead>;

    async fn delete_task(&self, token: &str, task_id: &str) -> ClientResult<()>;

    // --- Classes (teacher) ---

    async fn teacher_classes(&self, token: &str, teacher_id: &str) -> ClientResult<Vec<ClassRead>>;

    async fn create_class(
        &self,
        token: &str,
        teacher_id: &str,
        class: &ClassCreate,
    ) -> ClientResult<ClassRead>;

    async fn class_students(&self, token: &str, class_id: &str) -> ClientResult<Vec<StudentRead>>;

    // --- Shop & redemption requests ---

    async fn shop_items(&self, token: &str) -> ClientResult<Vec<ShopItemRead>>;

    /// The caller's own conversion requests, newest first.
    async fn conversion_requests(&self, token: &str) -> ClientResult<Vec<RedemptionRequestRead>>;

    async fn create_conversion_request(
        &self,
        token: &str,
        request: &RedemptionRequestCreate,
    ) -> ClientResult<RedemptionRequestRead>;

    /// Requests from all of a parent's children.
    async fn parent_redemption_requests(
        &self,
        token: &str,
        parent_id: &str,
    ) -> ClientResult<Vec<RedemptionRequestRead>>;

    async fn approve_redemption(
        &self,
        token: &str,
        request_id: &str,
    ) -> ClientResult<RedemptionRequestRead>;

    async fn reject_redemption(
        &self,
        token: &str,
        request_id: &str,
    ) -> ClientResult<RedemptionRequestRead>;

    // --- Dashboard ---

    async fn dashboard(&self, token: &str, role: Role) -> ClientResult<DashboardSummary>;
}
