//! Teacher-side state: classes and their student rosters.
//!
//! Rosters are cached per class under a scoped key, so switching between
//! classes inside the TTL costs no round trips.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::RwLock;

use coincraft_api::models::{validate_input, ClassCreate, ClassRead, StudentRead};
use coincraft_api::Backend;
use coincraft_core::cache::CacheKind;
use coincraft_core::error::{ClientError, ClientResult};
use coincraft_core::roles::Role;

use crate::cache::CacheCoordinator;
use crate::reset::{Resettable, ResetRegistry};
use crate::session::SessionManager;

/// Scope key for the teacher's own class list.
const SCOPE: &str = "me";

/// Observable state of the teacher store.
#[derive(Debug, Clone, Default)]
pub struct TeacherState {
    pub classes: Vec<ClassRead>,
    /// Student rosters keyed by class id.
    pub students: HashMap<String, Vec<StudentRead>>,
}

pub struct TeacherStore {
    session: Arc<SessionManager>,
    backend: Arc<dyn Backend>,
    cache: Arc<CacheCoordinator>,
    state: RwLock<TeacherState>,
}

impl TeacherStore {
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
            state: RwLock::new(TeacherState::default()),
        });
        let dyn_store: Arc<dyn Resettable> = store.clone();
        let handle: Weak<dyn Resettable> = Arc::downgrade(&dyn_store);
        resets.register(handle).await;
        store
    }

    pub async fn state(&self) -> TeacherState {
        self.state.read().await.clone()
    }

    pub async fn class_by_id(&self, class_id: &str) -> Option<ClassRead> {
        self.state
            .read()
            .await
            .classes
            .iter()
            .find(|c| c.id == class_id)
            .cloned()
    }

    /// Total students across all loaded classes.
    pub async fn total_students(&self) -> u32 {
        self.state
            .read()
            .await
            .classes
            .iter()
            .map(|c| c.students_count.unwrap_or(0))
            .sum()
    }

    async fn require_teacher(&self) -> ClientResult<(String, String)> {
        let token = self.session.require_token().await?;
        let session = self.session.snapshot().await;
        match session.user {
            Some(user) if user.role == Role::Teacher => Ok((token, user.id)),
            _ => Err(ClientError::Forbidden(
                "Only teachers can manage classes".to_string(),
            )),
        }
    }

    pub async fn load_classes(&self, force_refresh: bool) -> ClientResult<Vec<ClassRead>> {
        let (token, teacher_id) = self.require_teacher().await?;

        if !force_refresh && self.cache.is_valid(CacheKind::Classes, SCOPE).await {
            if let Some(classes) = self
                .cache
                .get::<Vec<ClassRead>>(CacheKind::Classes, SCOPE)
                .await
            {
                self.state.write().await.classes = classes.clone();
                return Ok(classes);
            }
        }

        match self.backend.teacher_classes(&token, &teacher_id).await {
            Ok(classes) => {
                self.cache.put(CacheKind::Classes, SCOPE, &classes).await;
                self.state.write().await.classes = classes.clone();
                Ok(classes)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    pub async fn create_class(&self, input: ClassCreate) -> ClientResult<ClassRead> {
        validate_input(&input)?;
        let (token, teacher_id) = self.require_teacher().await?;

        match self.backend.create_class(&token, &teacher_id, &input).await {
            Ok(class) => {
                let mut state = self.state.write().await;
                state.classes.push(class.clone());
                let classes = state.classes.clone();
                drop(state);
                self.cache.put(CacheKind::Classes, SCOPE, &classes).await;
                Ok(class)
            }
            Err(err) => Err(self.remote_err(err).await),
        }
    }

    /// Load one class's roster, cached under the class id.
    pub async fn load_class_students(
        &self,
        class_id: &str,
        force_refresh: bool,
    ) -> ClientResult<Vec<StudentRead>> {
        let (token, _) = self.require_teacher().await?;

        if !force_refresh && self.cache.is_valid(CacheKind::ClassStudents, class_id).await {
            if let Some(students) = self
                .cache
                .get::<Vec<StudentRead>>(CacheKind::ClassStudents, class_id)
                .await
            {
                self.state
                    .write()
                    .await
                    .students
                    .insert(class_id.to_string(), students.clone());
                return Ok(students);
            }
        }

        match self.backend.class_students(&token, class_id).await {
            Ok(students) => {
                self.cache
                    .put(CacheKind::ClassStudents, class_id, &students)
                    .await;
                self.state
                    .write()
                    .await
                    .students
                    .insert(class_id.to_string(), students.clone());
                Ok(students)
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
impl Resettable for TeacherStore {
    fn name(&self) -> &'static str {
        "teacher"
    }

    async fn reset(&self) -> ClientResult<()> {
        *self.state.write().await = TeacherState::default();
        Ok(())
    }
}
