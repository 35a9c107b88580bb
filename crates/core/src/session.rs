//! Session identity: the (token, user) pair representing the current actor.

use serde::{Deserialize, Serialize};

use crate::roles::Role;
use crate::types::{EntityId, Timestamp};

/// The authenticated user's identity as reported by the backend.
///
/// This is the subset of the server's user record the client keeps in
/// memory and persists across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Coin balance; populated for child roles only.
    #[serde(default)]
    pub coins: Option<i64>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub created_at: Timestamp,
}

/// The (token, identity) pair for the current actor.
///
/// Invariant: the session counts as authenticated exactly when both halves
/// are present. Code that transitions the session must set or clear the
/// two together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserIdentity>,
}

impl Session {
    /// A session with both halves populated.
    pub fn authenticated(token: String, user: UserIdentity) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    /// The current role, or `None` for an unauthenticated session.
    pub fn role(&self) -> Option<Role> {
        if self.is_authenticated() {
            self.user.as_ref().map(|u| u.role)
        } else {
            None
        }
    }

    /// Drop both halves, returning the session to its empty state.
    pub fn clear(&mut self) {
        self.token = None;
        self.user = None;
    }
}
