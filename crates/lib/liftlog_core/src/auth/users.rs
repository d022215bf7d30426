//! User repository.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use sqlx::PgPool;

use super::AuthError;
use super::password::{PasswordCodec, PasswordHash};
use super::tokens::TokenStore;
use crate::models::auth::{NewUser, TokenScope, User};

/// Maximum username length in characters.
pub const MAX_USERNAME_LEN: usize = 50;

/// bcrypt only looks at the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Check registration input before anything is hashed or stored.
pub fn validate_new_user(user: &NewUser, password: &str) -> Result<(), AuthError> {
    if user.username.is_empty() {
        return Err(AuthError::ValidationError("username is required".into()));
    }
    if user.username.chars().count() > MAX_USERNAME_LEN {
        return Err(AuthError::ValidationError(format!(
            "username cannot be longer than {MAX_USERNAME_LEN} characters"
        )));
    }
    if user.email.is_empty() {
        return Err(AuthError::ValidationError("email is required".into()));
    }
    if !EMAIL_PATTERN.is_match(&user.email) {
        return Err(AuthError::ValidationError("invalid email provided".into()));
    }
    if password.is_empty() {
        return Err(AuthError::ValidationError("password is required".into()));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::ValidationError(format!(
            "password cannot be longer than {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

/// Storage for user identities.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Validate, hash the password and persist a new user.
    async fn create(&self, new_user: NewUser, password: &str) -> Result<User, AuthError>;

    async fn find_by_username(&self, username: &str) -> Result<User, AuthError>;

    async fn find_by_id(&self, id: i64) -> Result<User, AuthError>;

    /// Persist the mutable profile fields (bio). Username and email are keys and stay fixed.
    async fn update(&self, user: &User) -> Result<(), AuthError>;

    /// Resolve a bearer token to the user that owns it.
    async fn resolve_by_token(&self, scope: TokenScope, plaintext: &str)
    -> Result<User, AuthError>;
}

/// Database row for `users`.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    bio: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: PasswordHash::from_stored(row.password_hash),
            bio: row.bio,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Describe which key a unique violation hit.
pub(crate) fn conflict_message(constraint: Option<&str>) -> String {
    match constraint {
        Some(c) if c.contains("email") => "email already registered".into(),
        Some(c) if c.contains("username") => "username already taken".into(),
        _ => "user already exists".into(),
    }
}

/// PostgreSQL-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
    codec: PasswordCodec,
    tokens: Arc<dyn TokenStore>,
}

impl PgUserStore {
    pub fn new(pool: PgPool, codec: PasswordCodec, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            pool,
            codec,
            tokens,
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, bio, created_at, updated_at";

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser, password: &str) -> Result<User, AuthError> {
        validate_new_user(&new_user, password)?;
        let hash = self.codec.hash_blocking(password).await?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, email, password_hash, bio) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(hash.as_str())
        .bind(new_user.bio.as_deref().unwrap_or_default())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AuthError::from_unique(e, conflict_message))?;

        Ok(row.into())
    }

    async fn find_by_username(&self, username: &str) -> Result<User, AuthError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(User::from)
        .ok_or_else(|| AuthError::NotFound(format!("user '{username}'")))
    }

    async fn find_by_id(&self, id: i64) -> Result<User, AuthError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::from)
            .ok_or_else(|| AuthError::NotFound(format!("user {id}")))
    }

    async fn update(&self, user: &User) -> Result<(), AuthError> {
        let result =
            sqlx::query("UPDATE users SET bio = $1, updated_at = now() WHERE id = $2")
                .bind(&user.bio)
                .bind(user.id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(format!("user {}", user.id)));
        }
        Ok(())
    }

    async fn resolve_by_token(
        &self,
        scope: TokenScope,
        plaintext: &str,
    ) -> Result<User, AuthError> {
        let user_id = self.tokens.resolve(scope, plaintext).await?;
        self.find_by_id(user_id).await
    }
}
