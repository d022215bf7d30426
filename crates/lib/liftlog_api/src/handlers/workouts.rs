//! Workout request handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::Identity;
use crate::models::{CreateWorkoutRequest, SuccessResponse, UpdateWorkoutRequest, WorkoutResponse};
use crate::services::workouts;

/// `POST /workouts`
pub async fn create_workout_handler(
    State(state): State<AppState>,
    identity: Identity,
    body: Result<Json<CreateWorkoutRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<WorkoutResponse>)> {
    let user = identity.require_user()?;
    let Json(body) = body?;
    let workout = workouts::create(state.workouts.as_ref(), user, body).await?;
    Ok((StatusCode::CREATED, Json(WorkoutResponse { workout })))
}

/// `GET /workouts/{id}`
pub async fn get_workout_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<WorkoutResponse>> {
    let id = workouts::parse_id(&id)?;
    let workout = workouts::get(state.workouts.as_ref(), id).await?;
    Ok(Json(WorkoutResponse { workout }))
}

/// `PUT /workouts/{id}`: owner only.
pub async fn update_workout_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    body: Result<Json<UpdateWorkoutRequest>, JsonRejection>,
) -> AppResult<Json<WorkoutResponse>> {
    let user = identity.require_user()?;
    let id = workouts::parse_id(&id)?;
    let Json(body) = body?;
    let workout = workouts::update(state.workouts.as_ref(), user, id, body).await?;
    Ok(Json(WorkoutResponse { workout }))
}

/// `DELETE /workouts/{id}`: owner only.
pub async fn delete_workout_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    let user = identity.require_user()?;
    let id = workouts::parse_id(&id)?;
    workouts::delete(state.workouts.as_ref(), user, id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
