//! # liftlog_core
//!
//! Core domain logic for LiftLog: password credentials, opaque bearer
//! tokens, the user repository and the workout aggregate repository.
//!
//! Every repository is a capability trait with a PostgreSQL backend and an
//! in-memory backend (see [`memory`]).

pub mod auth;
pub mod memory;
pub mod migrate;
pub mod models;
pub mod workouts;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
