//! Per-role domain stores.
//!
//! Each store owns its slice of state behind an `RwLock`, reads through
//! the shared cache coordinator, and registers itself with the reset
//! registry at construction. Cross-store consistency is eventual and
//! restored by re-fetching, never by transactions.

pub mod dashboard;
pub mod parent;
pub mod shop;
pub mod teacher;
pub mod user;
