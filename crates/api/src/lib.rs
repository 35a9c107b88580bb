//! REST boundary for the CoinCraft backend.
//!
//! [`Backend`] describes every remote operation the client layer consumes;
//! [`HttpBackend`] implements it over HTTP with bearer-token auth. Request
//! and response models mirror the backend schemas. The session layer owns
//! the token and passes it per call, so this crate holds no mutable state.

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod models;

pub use backend::Backend;
pub use config::ApiConfig;
pub use http::HttpBackend;
