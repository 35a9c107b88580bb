//! Core domain types and pure logic for the CoinCraft client.
//!
//! This crate has no I/O. Role and landing-path mappings, session identity
//! types, cache freshness math, and navigation rule evaluation are all pure
//! functions over data passed in by the caller, so the stateful layer and
//! its tests can share them.

pub mod cache;
pub mod error;
pub mod roles;
pub mod routes;
pub mod session;
pub mod types;
