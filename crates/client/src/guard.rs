//! The navigation guard: validate identity, then run the route rules.

use std::sync::Arc;
use std::time::Duration;

use coincraft_core::routes::{self, NavigationDecision, RoutePolicy};

use crate::session::SessionManager;

/// Default bound on the pre-navigation identity validation. The check is
/// on the critical path of every navigation, so a hung backend must not
/// stall it indefinitely.
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Gates every navigation attempt on the session manager's current truth.
///
/// Holds no state of its own: the decision is a pure function of the
/// validated role and the target's declared requirements.
pub struct NavigationGuard {
    session: Arc<SessionManager>,
    validation_timeout: Duration,
}

impl NavigationGuard {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self::with_timeout(session, DEFAULT_VALIDATION_TIMEOUT)
    }

    pub fn with_timeout(session: Arc<SessionManager>, validation_timeout: Duration) -> Self {
        Self {
            session,
            validation_timeout,
        }
    }

    /// Decide a navigation attempt against `policy`.
    ///
    /// The guard first revalidates the identity so the rules see current
    /// truth rather than a stale cached role. A failed or timed-out
    /// validation is treated as "not authenticated" for this decision
    /// (fail-closed); a denied navigation redirects silently and is never
    /// surfaced as an error.
    pub async fn authorize(&self, policy: &RoutePolicy) -> NavigationDecision {
        let validation =
            tokio::time::timeout(self.validation_timeout, self.session.refresh()).await;

        let role = match validation {
            Ok(Ok(identity)) => Some(identity.role),
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "Navigation validation failed; treating as unauthenticated");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.validation_timeout.as_secs(),
                    "Navigation validation timed out; treating as unauthenticated"
                );
                None
            }
        };

        routes::evaluate(policy, role)
    }
}
