//! Request handlers.

pub mod health;
pub mod tokens;
pub mod users;
pub mod workouts;
