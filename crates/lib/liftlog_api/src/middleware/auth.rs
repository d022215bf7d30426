//! Authentication middleware: resolves the bearer token to an `Identity`.
//!
//! Requests without an `Authorization` header proceed as `Identity::Anonymous`;
//! handlers decide whether that is acceptable. A header that is present but
//! malformed, unknown or expired short-circuits with 401.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderValue,
        header::{AUTHORIZATION, VARY},
        request::Parts,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use liftlog_core::auth::AuthError;
use liftlog_core::models::auth::{TokenScope, User};
use tracing::{debug, error};

use crate::AppState;
use crate::error::{AppError, AppResult};

/// Caller identity, stored in request extensions by [`authenticate`].
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    Authenticated(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(user) => Some(user),
        }
    }

    /// The caller, or a 400 for anonymous requests to mutating endpoints.
    pub fn require_user(&self) -> AppResult<&User> {
        self.user()
            .ok_or_else(|| AppError::Validation("you must be logged in".into()))
    }
}

/// Extract the token from `Bearer <token>`. Anything else is malformed.
fn bearer_token(value: &HeaderValue) -> Option<&str> {
    let value = value.to_str().ok()?;
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

async fn resolve_identity(state: &AppState, header: Option<HeaderValue>) -> AppResult<Identity> {
    let Some(value) = header else {
        return Ok(Identity::Anonymous);
    };

    let token = bearer_token(&value).ok_or_else(|| {
        debug!("malformed authorization header");
        AppError::Unauthorized("invalid or missing authentication token".into())
    })?;

    match state
        .users
        .resolve_by_token(TokenScope::Authentication, token)
        .await
    {
        Ok(user) => {
            debug!(user_id = user.id, "request authenticated");
            Ok(Identity::Authenticated(user))
        }
        Err(AuthError::NotFound(_)) => {
            debug!("unknown or expired token");
            Err(AppError::Unauthorized("invalid or expired token".into()))
        }
        Err(e) => {
            error!(error = %e, "token resolution failed");
            Err(AppError::Unauthorized("invalid or expired token".into()))
        }
    }
}

/// Axum middleware: resolves `Authorization: Bearer <token>` and injects
/// `Identity` into request extensions. Every response carries `Vary: Authorization`.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request.headers().get(AUTHORIZATION).cloned();
    let mut response = match resolve_identity(&state, header).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    };
    response
        .headers_mut()
        .append(VARY, HeaderValue::from_static("Authorization"));
    response
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Identity>().cloned().ok_or_else(|| {
            error!("identity missing from request extensions; authenticate middleware not installed");
            AppError::Internal("missing identity".into())
        })
    }
}
