//! Opaque bearer tokens.
//!
//! Tokens are random strings handed to the client once. Only a SHA-256
//! fingerprint is persisted, so a leaked `tokens` table yields nothing that
//! can be presented as a bearer credential.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::debug;

use super::AuthError;
use crate::models::auth::{IssuedToken, TokenRecord, TokenScope};

/// Length of a generated token. 64 alphanumerics carry ~381 bits of entropy.
pub const TOKEN_LENGTH: usize = 64;

/// Generate a random token (64 alphanumeric chars).
pub fn generate_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// SHA-256 fingerprint of a token, hex encoded, for storage and lookup.
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Issue, resolve and revoke bearer tokens.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Create and persist a token for `user_id` valid for `ttl`.
    async fn issue(
        &self,
        user_id: i64,
        ttl: Duration,
        scope: TokenScope,
    ) -> Result<IssuedToken, AuthError>;

    /// Resolve a presented plaintext to its user ID.
    ///
    /// Unknown, expired and wrong-scope tokens all yield `AuthError::NotFound`.
    async fn resolve(&self, scope: TokenScope, plaintext: &str) -> Result<i64, AuthError>;

    /// Delete every token of `scope` belonging to `user_id`.
    async fn revoke_all(&self, user_id: i64, scope: TokenScope) -> Result<(), AuthError>;
}

/// Build the token handed back by `issue`, before it is persisted.
pub(crate) fn new_token(user_id: i64, ttl: Duration, scope: TokenScope) -> (IssuedToken, String) {
    let plaintext = generate_token();
    let hash = fingerprint(&plaintext);
    let token = IssuedToken {
        plaintext,
        user_id,
        expiry: Utc::now() + ttl,
        scope,
    };
    (token, hash)
}

/// PostgreSQL-backed token store.
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn issue(
        &self,
        user_id: i64,
        ttl: Duration,
        scope: TokenScope,
    ) -> Result<IssuedToken, AuthError> {
        let (token, hash) = new_token(user_id, ttl, scope);

        sqlx::query(
            "INSERT INTO tokens (fingerprint, user_id, expiry, scope) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&hash)
        .bind(user_id)
        .bind(token.expiry)
        .bind(scope.as_str())
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    async fn resolve(&self, scope: TokenScope, plaintext: &str) -> Result<i64, AuthError> {
        let hash = fingerprint(plaintext);

        let record = sqlx::query_as::<_, TokenRecord>(
            "SELECT fingerprint, user_id, expiry, scope FROM tokens \
             WHERE fingerprint = $1 AND scope = $2 AND expiry > now()",
        )
        .bind(&hash)
        .bind(scope.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AuthError::NotFound("token".into()))?;

        Ok(record.user_id)
    }

    async fn revoke_all(&self, user_id: i64, scope: TokenScope) -> Result<(), AuthError> {
        let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1 AND scope = $2")
            .bind(user_id)
            .bind(scope.as_str())
            .execute(&self.pool)
            .await?;
        debug!(user_id, %scope, revoked = result.rows_affected(), "revoked tokens");
        Ok(())
    }
}
