//! CoinCraft client session & data-coherence layer.
//!
//! Owns the authentication token and identity, gates navigation by role,
//! keeps the per-role domain stores consistent with the backend under a
//! short-TTL cache, and applies optimistic local mutations that roll back
//! on remote failure.
//!
//! Everything hangs off [`Client`], constructed once at process start:
//!
//! - [`session::SessionManager`] -- login/register/restore/refresh/logout
//! - [`guard::NavigationGuard`] -- per-navigation allow/redirect decisions
//! - [`cache::CacheCoordinator`] -- (kind, scope) -> cached load with TTL
//! - [`reset::ResetRegistry`] -- drives every store back to its initial
//!   state on logout
//! - [`stores`] -- the per-role domain stores

pub mod cache;
pub mod client;
pub mod guard;
pub mod optimistic;
pub mod reset;
pub mod session;
pub mod stores;
pub mod vault;

pub use client::Client;
