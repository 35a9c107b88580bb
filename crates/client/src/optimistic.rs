//! Snapshot/rollback helper for optimistic mutations.

use std::future::Future;

use tokio::sync::RwLock;

use coincraft_core::error::ClientResult;

/// Apply a predicted local effect, run the remote call, and restore the
/// snapshot verbatim if the call fails.
///
/// The state lock is released while the remote call is in flight; if two
/// mutations on the same state race, the last write wins with no
/// reconciliation (accepted limitation -- callers are expected to sequence
/// mutations on the same field).
///
/// On success the remote outcome is returned untouched; reconciling it
/// back into the store (overwriting the optimistic values with the
/// authoritative ones) is the caller's job.
pub async fn with_rollback<S, T, F, Fut>(
    state: &RwLock<S>,
    apply: F,
    remote: Fut,
) -> ClientResult<T>
where
    S: Clone + Send + Sync,
    F: FnOnce(&mut S),
    Fut: Future<Output = ClientResult<T>>,
{
    let snapshot = {
        let mut guard = state.write().await;
        let snapshot = guard.clone();
        apply(&mut guard);
        snapshot
    };

    match remote.await {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            *state.write().await = snapshot;
            tracing::debug!(error = %err, "Remote call failed; optimistic effect rolled back");
            Err(err)
        }
    }
}
