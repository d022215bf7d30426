//! Account and session flows delegating to `liftlog_core::auth`.

use chrono::Duration;
use liftlog_core::auth::AuthError;
use liftlog_core::auth::password::PasswordCodec;
use liftlog_core::auth::tokens::TokenStore;
use liftlog_core::auth::users::UserStore;
use liftlog_core::models::auth::{IssuedToken, NewUser, TokenScope, User};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{LoginRequest, RegisterRequest};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Create an account. Does not log the caller in.
pub async fn register(users: &dyn UserStore, req: RegisterRequest) -> AppResult<User> {
    let new_user = NewUser {
        username: req.username,
        email: req.email,
        bio: req.bio,
    };
    let user = users.create(new_user, &req.password).await?;
    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Check credentials and issue an authentication token.
///
/// Unknown usernames and wrong passwords produce the same 401.
pub async fn login(
    users: &dyn UserStore,
    tokens: &dyn TokenStore,
    codec: &PasswordCodec,
    ttl: Duration,
    req: &LoginRequest,
) -> AppResult<IssuedToken> {
    let user = match users.find_by_username(&req.username).await {
        Ok(user) => user,
        Err(AuthError::NotFound(_)) => {
            warn!(username = %req.username, "login for unknown user");
            // Same bcrypt work as a real verify, so response time does not reveal the username.
            let _ = codec.hash_blocking(&req.password).await;
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
        Err(e) => return Err(e.into()),
    };

    if !codec.verify_blocking(&user.password_hash, &req.password).await? {
        warn!(user_id = user.id, "login with wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = tokens
        .issue(user.id, ttl, TokenScope::Authentication)
        .await?;
    info!(user_id = user.id, expiry = %token.expiry, "authentication token issued");
    Ok(token)
}

/// Revoke every authentication token of `user`.
pub async fn logout_everywhere(tokens: &dyn TokenStore, user: &User) -> AppResult<()> {
    tokens
        .revoke_all(user.id, TokenScope::Authentication)
        .await?;
    info!(user_id = user.id, "logged out everywhere");
    Ok(())
}

/// Replace the caller's bio and return the stored record.
pub async fn update_bio(users: &dyn UserStore, user: &User, bio: String) -> AppResult<User> {
    let mut updated = user.clone();
    updated.bio = bio;
    users.update(&updated).await?;
    Ok(users.find_by_id(user.id).await?)
}
