//! Request and response models mirroring the backend schemas.
//!
//! Field names follow the server's wire format exactly; decoding failures
//! surface as [`ClientError::Validation`] through the transport layer.

use serde::{Deserialize, Serialize};
use validator::Validate;

use coincraft_core::error::ClientError;
use coincraft_core::roles::Role;
use coincraft_core::session::UserIdentity;
use coincraft_core::types::{EntityId, Timestamp};

/// Run client-side validation on an outbound payload before the round trip.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ClientError> {
    input
        .validate()
        .map_err(|e| ClientError::Validation(e.to_string()))
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Credentials for the form-encoded login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    /// The account email; the backend's login form calls it `username`.
    pub username: String,
    pub password: String,
}

/// Response body of `POST /api/auth/jwt/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Request body for `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Response body of `POST /api/auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub access_token: String,
    pub user: UserRead,
}

/// The server's user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRead {
    pub id: EntityId,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Timestamp,
}

fn default_true() -> bool {
    true
}

impl UserRead {
    /// Project the server record onto the in-memory session identity.
    ///
    /// The coin balance lives on the child profile, not the user record;
    /// it is filled in later from dashboard or mutation responses.
    pub fn into_identity(self) -> UserIdentity {
        UserIdentity {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
            coins: None,
            avatar_url: self.avatar_url,
            created_at: self.created_at,
        }
    }
}

/// Partial profile update for `PUT /api/users/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Request body for `POST /api/users/{parent_id}/children`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct ChildCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    /// The backend derives younger/older child from the age.
    #[validate(range(min = 6, max = 18))]
    pub age: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalRead {
    pub id: EntityId,
    pub user_id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub target_amount: i64,
    #[serde(default)]
    pub current_amount: i64,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub deadline: Option<Timestamp>,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct GoalCreate {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub target_amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Timestamp>,
}

/// Partial goal edit for `PUT /api/users/me/goals/{id}`.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct GoalUpdate {
    #[validate(length(min = 1, max = 200))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Timestamp>,
}

/// Response of `POST /api/users/me/goals/{id}/contribute`.
///
/// Carries the authoritative post-contribution state used to reconcile the
/// optimistic local effect.
#[derive(Debug, Clone, Deserialize)]
pub struct GoalContributionOutcome {
    pub goal: GoalRead,
    pub transaction: TransactionRead,
    pub new_coin_balance: i64,
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Earn,
    Spend,
    Save,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRead {
    pub id: EntityId,
    pub user_id: EntityId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: i64,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub reference_id: Option<EntityId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct TransactionCreate {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[validate(range(min = 1))]
    pub amount: i64,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<EntityId>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRead {
    pub id: EntityId,
    pub assigned_by: EntityId,
    pub assigned_to: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub coins_reward: i64,
    #[serde(default)]
    pub due_date: Option<Timestamp>,
    #[serde(default = "default_true")]
    pub requires_approval: bool,
    pub status: TaskStatus,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct TaskCreate {
    pub assigned_to: EntityId,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub coins_reward: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Timestamp>,
    pub requires_approval: bool,
}

/// Partial task edit for `PUT /api/tasks/{id}`.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coins_reward: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

// ---------------------------------------------------------------------------
// Classes (teacher)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRead {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub teacher_id: EntityId,
    pub age_group: String,
    pub class_code: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Timestamp,
    #[serde(default)]
    pub students_count: Option<u32>,
    #[serde(default)]
    pub average_performance: Option<f64>,
}

/// Accepted `age_group` values for class creation.
pub const VALID_AGE_GROUPS: &[&str] = &["8-10", "11-14"];

fn validate_age_group(age_group: &str) -> Result<(), validator::ValidationError> {
    if VALID_AGE_GROUPS.contains(&age_group) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("age_group"))
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct ClassCreate {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(custom(function = validate_age_group))]
    pub age_group: String,
}

/// A student row in a class roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRead {
    pub user_id: EntityId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub level: Option<i32>,
    #[serde(default)]
    pub performance_score: Option<f64>,
    #[serde(default)]
    pub last_activity_date: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Shop & redemption requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopItemRead {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default = "default_true")]
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// A coin -> reward conversion request awaiting parental resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionRequestRead {
    pub id: EntityId,
    pub user_id: EntityId,
    pub coins_amount: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cash_amount: Option<f64>,
    pub status: RequestStatus,
    #[serde(default)]
    pub approved_by: Option<EntityId>,
    #[serde(default)]
    pub approved_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct RedemptionRequestCreate {
    #[validate(range(min = 1))]
    pub coins_amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Dashboard aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_coins: i64,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub streak_days: i32,
    #[serde(default)]
    pub goals_count: u32,
    #[serde(default)]
    pub completed_tasks: u32,
}

/// Role-specific dashboard aggregate from `GET /api/dashboard/{role}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub user: UserRead,
    #[serde(default)]
    pub stats: DashboardStats,
    #[serde(default)]
    pub recent_transactions: Vec<TransactionRead>,
    #[serde(default)]
    pub active_goals: Vec<GoalRead>,
    #[serde(default)]
    pub pending_tasks: Vec<TaskRead>,
}

/// A child row in the parent overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildRead {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub coins: Option<i64>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: Timestamp,
}
