//! Business logic between handlers and `liftlog_core`.

pub mod auth;
pub mod workouts;
