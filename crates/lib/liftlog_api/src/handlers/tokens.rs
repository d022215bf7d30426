//! Token request handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::Identity;
use crate::models::{LoginRequest, SuccessResponse, TokenResponse};
use crate::services::auth;

/// `POST /tokens/authentication`: log in with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let Json(body) = body?;
    let token = auth::login(
        state.users.as_ref(),
        state.tokens.as_ref(),
        &state.codec,
        state.config.token_ttl,
        &body,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            auth_token: token.plaintext,
            expiry: token.expiry,
        }),
    ))
}

/// `DELETE /tokens/authentication`: revoke all of the caller's tokens.
pub async fn logout_handler(
    State(state): State<AppState>,
    identity: Identity,
) -> AppResult<Json<SuccessResponse>> {
    let user = identity.require_user()?;
    auth::logout_everywhere(state.tokens.as_ref(), user).await?;
    Ok(Json(SuccessResponse { success: true }))
}
