//! Navigation policies and the allow/redirect decision tree.
//!
//! The guard in the client crate performs the async identity validation;
//! the rules themselves are a pure function of the validated role and the
//! target's declared requirements, evaluated in a fixed order.

use crate::roles::{self, Role};

/// Declared requirements of a navigation target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutePolicy {
    /// Only reachable with an authenticated session.
    pub requires_auth: bool,
    /// Only reachable without one (login/register views).
    pub requires_guest: bool,
    /// When non-empty, the session's role must be in this set. Implies an
    /// authenticated session.
    pub allowed_roles: Vec<Role>,
}

impl RoutePolicy {
    /// No requirements; always allowed.
    pub fn public() -> Self {
        Self::default()
    }

    /// Requires any authenticated session.
    pub fn authenticated() -> Self {
        Self {
            requires_auth: true,
            ..Self::default()
        }
    }

    /// Requires no session (login/register views).
    pub fn guest_only() -> Self {
        Self {
            requires_guest: true,
            ..Self::default()
        }
    }

    /// Requires an authenticated session holding one of `allowed`.
    pub fn for_roles(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            requires_auth: true,
            requires_guest: false,
            allowed_roles: allowed.into_iter().collect(),
        }
    }
}

/// Outcome of evaluating a policy against the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Redirect(&'static str),
}

/// Evaluate the ordered guard rules.
///
/// `role` is the validated role of the current session, `None` for an
/// unauthenticated session or one whose validation failed (fail-closed:
/// the caller maps both cases to `None` before calling in here).
pub fn evaluate(policy: &RoutePolicy, role: Option<Role>) -> NavigationDecision {
    let authenticated = role.is_some();

    // 1. Auth-only route without a session.
    if policy.requires_auth && !authenticated {
        return NavigationDecision::Redirect(roles::LOGIN_PATH);
    }

    // 2. Guest-only route with a live session.
    if policy.requires_guest && authenticated {
        return NavigationDecision::Redirect(roles::landing_path_for(role));
    }

    // 3. Role-gated route outside the allowed set.
    if !policy.allowed_roles.is_empty() {
        let permitted = role.is_some_and(|r| policy.allowed_roles.contains(&r));
        if !permitted {
            return NavigationDecision::Redirect(roles::landing_path_for(role));
        }
    }

    // 4. Nothing objected.
    NavigationDecision::Allow
}
