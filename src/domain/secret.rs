//! Salted slow hashing for every secret the marketplace stores.
//!
//! Passwords and checkout handoff codes go through the same Argon2id
//! configuration: a fresh random salt per call, and verification through
//! the PHC string so the salt and parameters travel with the digest.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::{AppError, AppResult};

/// Argon2id digest in PHC string form.
#[derive(Clone)]
pub struct SecretHash {
    hash: String,
}

// Never print digests
impl std::fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretHash")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl SecretHash {
    /// Hash a plaintext secret with a per-call random salt.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Secret hash failed: {}", e)))?;
        Ok(Self {
            hash: hash.to_string(),
        })
    }

    /// Wrap a digest loaded from storage.
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    /// Get the digest for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the digest.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plaintext candidate. Malformed digests never verify.
    pub fn verify(&self, plain_text: &str) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => Self::argon2()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored secret hash is malformed");
                false
            }
        }
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl From<SecretHash> for String {
    fn from(secret: SecretHash) -> Self {
        secret.hash
    }
}

impl PartialEq for SecretHash {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for SecretHash {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let secret = SecretHash::new("482913").unwrap();
        assert!(secret.verify("482913"));
        assert!(!secret.verify("482914"));
    }

    #[test]
    fn test_same_secret_different_salts() {
        let a = SecretHash::new("123456").unwrap();
        let b = SecretHash::new("123456").unwrap();
        assert_ne!(a.as_str(), b.as_str());
        assert!(a.verify("123456"));
        assert!(b.verify("123456"));
    }

    #[test]
    fn test_digest_is_argon2id_phc() {
        let secret = SecretHash::new("654321").unwrap();
        assert!(secret.as_str().starts_with("$argon2id$"));
        assert!(!secret.as_str().contains("654321"));
    }

    #[test]
    fn test_malformed_digest_never_verifies() {
        let secret = SecretHash::from_hash("not-a-phc-string".to_string());
        assert!(!secret.verify("anything"));
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretHash::new("999999").unwrap();
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains("argon2"));
    }
}
