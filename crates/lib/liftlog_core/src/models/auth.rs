//! Authentication domain models.
//!
//! These are internal domain models. `User` serializes straight into API
//! responses, so the credential hash is excluded from its serde output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::password::PasswordHash;

/// Domain user.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: PasswordHash,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input for the user repository.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Token scope, matching the `scope` column of the `tokens` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    /// Bearer tokens handed out by the login endpoint.
    Authentication,
}

impl TokenScope {
    /// Database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Authentication => "authentication",
        }
    }
}

impl std::fmt::Display for TokenScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly issued token. The only place the plaintext ever exists.
#[derive(Clone, Serialize)]
pub struct IssuedToken {
    pub plaintext: String,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    pub scope: TokenScope,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("plaintext", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Token record stored in the database (fingerprint only).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TokenRecord {
    pub fingerprint: String,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    pub scope: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_text_matches_column_value() {
        assert_eq!("authentication", TokenScope::Authentication.as_str());
        assert_eq!("authentication", TokenScope::Authentication.to_string());
    }

    #[test]
    fn issued_token_debug_hides_plaintext() {
        let token = IssuedToken {
            plaintext: "s3cr3t-plaintext".into(),
            user_id: 7,
            expiry: Utc::now(),
            scope: TokenScope::Authentication,
        };
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("s3cr3t-plaintext"));
        assert!(rendered.contains("redacted"));
    }
}
