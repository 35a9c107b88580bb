//! HTTP implementation of the [`Backend`] trait.
//!
//! Thin wrapper over `reqwest`: bearer-token injection, the backend's
//! form-encoded login quirk, and status -> error classification. No
//! retries -- transient failures surface as `ClientError::Network` and the
//! caller decides.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use coincraft_core::error::{ClientError, ClientResult};
use coincraft_core::roles::Role;

use crate::backend::Backend;
use crate::config::ApiConfig;
use crate::error::{classify_status, classify_transport};
use crate::models::{
    ChildCreate, ChildRead, ClassCreate, ClassRead, Credentials, DashboardSummary,
    GoalContributionOutcome, GoalCreate, GoalRead, GoalUpdate, LoginResponse, ProfileUpdate,
    RedemptionRequestCreate, RedemptionRequestRead, RegisterRequest, RegisterResponse,
    ShopItemRead, StudentRead, TaskCreate, TaskRead, TaskUpdate, TransactionCreate,
    TransactionKind, TransactionRead, UserRead,
};

/// Error body shape used by the backend (`detail` from FastAPI, `message`
/// from a few custom endpoints).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// `reqwest`-backed [`Backend`] implementation.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client with the configured base URL and request timeout.
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClientError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request and decode the JSON response, classifying failures.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> ClientResult<T> {
        let response = request.send().await.map_err(|e| classify_transport(&e))?;
        let status = response.status();

        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail.or(body.message));
            let err = classify_status(status, detail);
            tracing::warn!(status = %status, error = %err, "Backend request failed");
            return Err(err);
        }

        response.json::<T>().await.map_err(|e| classify_transport(&e))
    }

    fn get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.http.get(self.url(path)).bearer_auth(token)
    }

    fn post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.http.post(self.url(path)).bearer_auth(token)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginResponse> {
        // The auth service takes a login form, not JSON.
        self.execute(
            self.http
                .post(self.url("/api/auth/jwt/login"))
                .form(credentials),
        )
        .await
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<RegisterResponse> {
        self.execute(self.http.post(self.url("/api/auth/register")).json(request))
            .await
    }

    async fn logout(&self, token: &str) -> ClientResult<()> {
        let _: serde_json::Value = self.execute(self.post("/api/auth/jwt/logout", token)).await?;
        Ok(())
    }

    async fn current_user(&self, token: &str) -> ClientResult<UserRead> {
        self.execute(self.get("/api/users/me", token)).await
    }

    async fn update_profile(
        &self,
        token: &str,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> ClientResult<UserRead> {
        self.execute(
            self.http
                .put(self.url(&format!("/api/users/{user_id}")))
                .bearer_auth(token)
                .json(update),
        )
        .await
    }

    async fn create_child(
        &self,
        token: &str,
        parent_id: &str,
        child: &ChildCreate,
    ) -> ClientResult<UserRead> {
        self.execute(
            self.post(&format!("/api/users/{parent_id}/children"), token)
                .json(child),
        )
        .await
    }

    async fn children(&self, token: &str, parent_id: &str) -> ClientResult<Vec<ChildRead>> {
        self.execute(self.get(&format!("/api/users/{parent_id}/children"), token))
            .await
    }

    async fn goals(&self, token: &str) -> ClientResult<Vec<GoalRead>> {
        self.execute(self.get("/api/users/me/goals", token)).await
    }

    async fn create_goal(&self, token: &str, goal: &GoalCreate) -> ClientResult<GoalRead> {
        self.execute(self.post("/api/users/me/goals", token).json(goal))
            .await
    }

    async fn update_goal(
        &self,
        token: &str,
        goal_id: &str,
        update: &GoalUpdate,
    ) -> ClientResult<GoalRead> {
        self.execute(
            self.http
                .put(self.url(&format!("/api/users/me/goals/{goal_id}")))
                .bearer_auth(token)
                .json(update),
        )
        .await
    }

    async fn delete_goal(&self, token: &str, goal_id: &str) -> ClientResult<()> {
        let _: serde_json::Value = self
            .execute(
                self.http
                    .delete(self.url(&format!("/api/users/me/goals/{goal_id}")))
                    .bearer_auth(token),
            )
            .await?;
        Ok(())
    }

    async fn contribute_to_goal(
        &self,
        token: &str,
        goal_id: &str,
        amount: i64,
    ) -> ClientResult<GoalContributionOutcome> {
        self.execute(
            self.post(&format!("/api/users/me/goals/{goal_id}/contribute"), token)
                .json(&serde_json::json!({ "amount": amount })),
        )
        .await
    }

    async fn transactions(
        &self,
        token: &str,
        kind: Option<TransactionKind>,
        limit: Option<u32>,
    ) -> ClientResult<Vec<TransactionRead>> {
        let mut request = self.get("/api/transactions/", token);
        if let Some(kind) = kind {
            // Serialize through serde so the query value matches the enum's
            // wire form.
            let value = serde_json::to_value(kind)
                .map_err(|e| ClientError::Internal(e.to_string()))?;
            if let Some(s) = value.as_str() {
                request = request.query(&[("type", s)]);
            }
        }
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        self.execute(request).await
    }

    async fn create_transaction(
        &self,
        token: &str,
        transaction: &TransactionCreate,
    ) -> ClientResult<TransactionRead> {
        self.execute(self.post("/api/transactions/", token).json(transaction))
            .await
    }

    async fn tasks(&self, token: &str) -> ClientResult<Vec<TaskRead>> {
        self.execute(self.get("/api/tasks/", token)).await
    }

    async fn create_task(&self, token: &str, task: &TaskCreate) -> ClientResult<TaskRead> {
        self.execute(self.post("/api/tasks/", token).json(task)).await
    }

    async fn update_task(
        &self,
        token: &str,
        task_id: &str,
        update: &TaskUpdate,
    ) -> ClientResult<TaskRead> {
        self.execute(
            self.http
                .put(self.url(&format!("/api/tasks/{task_id}")))
                .bearer_auth(token)
                .json(update),
        )
        .await
    }

    async fn complete_task(&self, token: &str, task_id: &str) -> ClientResult<TaskRead> {
        self.execute(self.post(&format!("/api/tasks/{task_id}/complete"), token))
            .await
    }

    async fn delete_task(&self, token: &str, task_id: &str) -> ClientResult<()> {
        let _: serde_json::Value = self
            .execute(
                self.http
                    .delete(self.url(&format!("/api/tasks/{task_id}")))
                    .bearer_auth(token),
            )
            .await?;
        Ok(())
    }

    async fn teacher_classes(&self, token: &str, teacher_id: &str) -> ClientResult<Vec<ClassRead>> {
        self.execute(self.get(&format!("/api/teachers/{teacher_id}/classes"), token))
            .await
    }

    async fn create_class(
        &self,
        token: &str,
        teacher_id: &str,
        class: &ClassCreate,
    ) -> ClientResult<ClassRead> {
        self.execute(
            self.post(&format!("/api/teachers/{teacher_id}/classes"), token)
                .json(class),
        )
        .await
    }

    async fn class_students(&self, token: &str, class_id: &str) -> ClientResult<Vec<StudentRead>> {
        self.execute(self.get(&format!("/api/classes/{class_id}/students"), token))
            .await
    }

    async fn shop_items(&self, token: &str) -> ClientResult<Vec<ShopItemRead>> {
        self.execute(self.get("/api/shop/items", token)).await
    }

    async fn conversion_requests(&self, token: &str) -> ClientResult<Vec<RedemptionRequestRead>> {
        self.execute(self.get("/api/users/me/conversion-requests", token))
            .await
    }

    async fn create_conversion_request(
        &self,
        token: &str,
        request: &RedemptionRequestCreate,
    ) -> ClientResult<RedemptionRequestRead> {
        self.execute(
            self.post("/api/users/me/conversion-requests", token)
                .json(request),
        )
        .await
    }

    async fn parent_redemption_requests(
        &self,
        token: &str,
        parent_id: &str,
    ) -> ClientResult<Vec<RedemptionRequestRead>> {
        self.execute(
            self.get(&format!("/api/parents/{parent_id}/redemption-requests"), token),
        )
        .await
    }

    async fn approve_redemption(
        &self,
        token: &str,
        request_id: &str,
    ) -> ClientResult<RedemptionRequestRead> {
        self.execute(
            self.http
                .put(self.url(&format!("/api/redemption-requests/{request_id}/approve")))
                .bearer_auth(token),
        )
        .await
    }

    async fn reject_redemption(
        &self,
        token: &str,
        request_id: &str,
    ) -> ClientResult<RedemptionRequestRead> {
        self.execute(
            self.http
                .put(self.url(&format!("/api/redemption-requests/{request_id}/reject")))
                .bearer_auth(token),
        )
        .await
    }

    async fn dashboard(&self, token: &str, role: Role) -> ClientResult<DashboardSummary> {
        self.execute(self.get(&format!("/api/dashboard/{}", role.as_str()), token))
            .await
    }
}
