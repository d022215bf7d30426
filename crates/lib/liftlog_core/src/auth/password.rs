//! Password hashing via bcrypt.

use super::AuthError;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// A bcrypt hash as stored in `users.password_hash`.
///
/// Never serialized and redacted from `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a hash loaded from storage.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Salted bcrypt hashing with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordCodec {
    cost: u32,
}

impl Default for PasswordCodec {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

impl PasswordCodec {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<PasswordHash, AuthError> {
        bcrypt::hash(password, self.cost)
            .map(PasswordHash)
            .map_err(|e| AuthError::Encoding(format!("bcrypt hash: {e}")))
    }

    /// Verify a password against a stored hash.
    ///
    /// A wrong password is `Ok(false)`; only an unreadable hash is an error.
    pub fn verify(&self, hash: &PasswordHash, password: &str) -> Result<bool, AuthError> {
        if hash.is_empty() {
            return Err(AuthError::Verification("no credential stored".into()));
        }
        bcrypt::verify(password, hash.as_str())
            .map_err(|e| AuthError::Verification(format!("bcrypt verify: {e}")))
    }

    /// `hash` on the blocking pool.
    pub async fn hash_blocking(&self, password: &str) -> Result<PasswordHash, AuthError> {
        let codec = *self;
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || codec.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hash task: {e}")))?
    }

    /// `verify` on the blocking pool.
    pub async fn verify_blocking(
        &self,
        hash: &PasswordHash,
        password: &str,
    ) -> Result<bool, AuthError> {
        let codec = *self;
        let hash = hash.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || codec.verify(&hash, &password))
            .await
            .map_err(|e| AuthError::Internal(format!("verify task: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lowest cost bcrypt accepts; keeps the suite fast.
    const TEST_COST: u32 = 4;

    fn codec() -> PasswordCodec {
        PasswordCodec::new(TEST_COST)
    }

    #[test]
    fn hash_then_verify_round_trips() {
        let codec = codec();
        let hash = codec.hash("secret123").unwrap();
        assert!(codec.verify(&hash, "secret123").unwrap());
    }

    #[test]
    fn wrong_password_is_false_not_error() {
        let codec = codec();
        let hash = codec.hash("secret123").unwrap();
        assert!(!codec.verify(&hash, "wrong").unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let codec = codec();
        let a = codec.hash("secret123").unwrap();
        let b = codec.hash("secret123").unwrap();
        assert_ne!(a, b);
        assert!(codec.verify(&a, "secret123").unwrap());
        assert!(codec.verify(&b, "secret123").unwrap());
    }

    #[test]
    fn corrupt_hash_is_verification_error() {
        let codec = codec();
        let err = codec
            .verify(&PasswordHash::from_stored("not-a-bcrypt-hash"), "secret123")
            .unwrap_err();
        assert!(matches!(err, AuthError::Verification(_)));
    }

    #[test]
    fn empty_hash_is_verification_error() {
        let err = codec()
            .verify(&PasswordHash::default(), "secret123")
            .unwrap_err();
        assert!(matches!(err, AuthError::Verification(_)));
    }

    #[test]
    fn invalid_cost_is_encoding_error() {
        let err = PasswordCodec::new(1).hash("secret123").unwrap_err();
        assert!(matches!(err, AuthError::Encoding(_)));
    }

    #[test]
    fn debug_output_is_redacted() {
        let hash = codec().hash("secret123").unwrap();
        assert_eq!("PasswordHash(<redacted>)", format!("{hash:?}"));
    }

    #[tokio::test]
    async fn blocking_wrappers_agree_with_sync_api() {
        let codec = codec();
        let hash = codec.hash_blocking("secret123").await.unwrap();
        assert!(codec.verify_blocking(&hash, "secret123").await.unwrap());
        assert!(!codec.verify_blocking(&hash, "nope").await.unwrap());
    }
}
