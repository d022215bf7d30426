//! Workout operations with ownership enforcement.

use liftlog_core::models::auth::User;
use liftlog_core::models::workout::{NewWorkout, Workout, WorkoutUpdate};
use liftlog_core::workouts::WorkoutStore;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{CreateWorkoutRequest, UpdateWorkoutRequest};

/// Parse a `{id}` path segment. Only positive integers are workout IDs.
pub fn parse_id(raw: &str) -> AppResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::Validation("invalid id parameter".into())),
    }
}

/// Fail with 403 unless `user` owns workout `id`. 404 if it does not exist.
async fn ensure_owner(store: &dyn WorkoutStore, id: i64, user: &User) -> AppResult<()> {
    let owner = store.get_owner(id).await?;
    if owner != user.id {
        warn!(workout_id = id, owner, caller = user.id, "workout access denied");
        return Err(AppError::Forbidden(
            "you do not have permission to modify this workout".into(),
        ));
    }
    Ok(())
}

pub async fn create(
    store: &dyn WorkoutStore,
    user: &User,
    req: CreateWorkoutRequest,
) -> AppResult<Workout> {
    let workout = store
        .create(NewWorkout {
            user_id: user.id,
            title: req.title,
            description: req.description,
            duration_minutes: req.duration_minutes,
            calories_burned: req.calories_burned,
            entries: req.entries,
        })
        .await?;
    info!(
        workout_id = workout.id,
        user_id = user.id,
        entries = workout.entries.len(),
        "workout created"
    );
    Ok(workout)
}

pub async fn get(store: &dyn WorkoutStore, id: i64) -> AppResult<Workout> {
    Ok(store.get_by_id(id).await?)
}

/// Apply a partial update. Fields absent from `patch` keep their stored values;
/// a present `entries` list replaces the whole entry set.
pub async fn update(
    store: &dyn WorkoutStore,
    user: &User,
    id: i64,
    patch: UpdateWorkoutRequest,
) -> AppResult<Workout> {
    ensure_owner(store, id, user).await?;

    let current = store.get_by_id(id).await?;
    store
        .update(WorkoutUpdate {
            id,
            title: patch.title.unwrap_or(current.title),
            description: patch.description.unwrap_or(current.description),
            duration_minutes: patch.duration_minutes.unwrap_or(current.duration_minutes),
            calories_burned: patch.calories_burned.unwrap_or(current.calories_burned),
            entries: patch.entries,
        })
        .await?;

    Ok(store.get_by_id(id).await?)
}

pub async fn delete(store: &dyn WorkoutStore, user: &User, id: i64) -> AppResult<()> {
    ensure_owner(store, id, user).await?;
    store.delete(id).await?;
    info!(workout_id = id, user_id = user.id, "workout deleted");
    Ok(())
}
