//! Account request handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::Identity;
use crate::models::{RegisterRequest, UpdateProfileRequest, UserResponse};
use crate::services::auth;

/// `POST /users`: create an account.
pub async fn register_handler(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<Json<UserResponse>> {
    let Json(body) = body?;
    let user = auth::register(state.users.as_ref(), body).await?;
    Ok(Json(UserResponse { user }))
}

/// `GET /users/me`
pub async fn me_handler(identity: Identity) -> AppResult<Json<UserResponse>> {
    let user = identity
        .user()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("authentication required".into()))?;
    Ok(Json(UserResponse { user }))
}

/// `PATCH /users/me`: update the caller's bio.
pub async fn update_me_handler(
    State(state): State<AppState>,
    identity: Identity,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> AppResult<Json<UserResponse>> {
    let caller = identity.require_user()?;
    let Json(body) = body?;
    let user = auth::update_bio(state.users.as_ref(), caller, body.bio).await?;
    Ok(Json(UserResponse { user }))
}
