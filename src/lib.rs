//! Spesa - shared shopping lists with a memory.
//!
//! A standalone REST server for collaborative shopping lists. Every item a
//! user adds feeds a per-user purchase history, which in turn powers
//! "you bought something like this recently" suggestions at the moment of
//! adding.
//!
//! # Highlights
//! - RocksDB embedded storage (no external database)
//! - Session-cookie or header-token authentication
//! - List sharing with per-collaborator edit rights
//! - In-app notifications with best-effort email delivery

pub mod auth;
pub mod config;
pub mod email;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod similarity;
pub mod store;
pub mod validation;

// Re-export dependencies to ensure tests use the same version
pub use chrono;
pub use parking_lot;
pub use uuid;
