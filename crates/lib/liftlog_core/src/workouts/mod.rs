//! Workout aggregate persistence.
//!
//! A workout row and its entry rows are written in one transaction. Entry
//! sets are never diffed: an update with entries deletes the old set and
//! inserts the new one. Concurrent updates are last-writer-wins.

pub mod policy;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::workout::{NewWorkout, Workout, WorkoutUpdate};

pub use policy::{EntryPolicy, MAX_EXERCISE_NAME_LEN, MAX_TITLE_LEN, validate_workout_fields};
pub use postgres::PgWorkoutStore;

/// Workout repository errors.
#[derive(Debug, Error)]
pub enum WorkoutError {
    #[error("Workout {0} not found")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

/// Storage for workout aggregates.
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    /// Insert a workout and all of its entries atomically.
    async fn create(&self, workout: NewWorkout) -> Result<Workout, WorkoutError>;

    /// Load a workout with entries sorted by `order_index`.
    async fn get_by_id(&self, id: i64) -> Result<Workout, WorkoutError>;

    /// Owner lookup used for authorization checks.
    async fn get_owner(&self, id: i64) -> Result<i64, WorkoutError>;

    /// Replace mutable fields and, when supplied, the whole entry set.
    async fn update(&self, update: WorkoutUpdate) -> Result<(), WorkoutError>;

    /// Delete a workout; entries go with it.
    async fn delete(&self, id: i64) -> Result<(), WorkoutError>;
}
