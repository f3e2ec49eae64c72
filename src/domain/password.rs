//! Password value object.
//!
//! Applies the password policy on top of [`SecretHash`].

use once_cell::sync::Lazy;

use super::secret::SecretHash;
use crate::config::MIN_PASSWORD_LENGTH;
use crate::errors::{AppError, AppResult};

/// Real digest used to burn the same verification time when a login names
/// an unknown email.
static DUMMY_PASSWORD: Lazy<Option<SecretHash>> =
    Lazy::new(|| SecretHash::new("dummy-password-for-timing").ok());

/// Hashed password. Compared by digest, never printed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Password {
    secret: SecretHash,
}

impl Password {
    /// Create a new password by hashing the plain text.
    ///
    /// # Errors
    /// Returns validation error if password is shorter than the policy allows.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        if plain_text.chars().count() < MIN_PASSWORD_LENGTH as usize {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        Ok(Self {
            secret: SecretHash::new(plain_text)?,
        })
    }

    /// Create a Password from an existing hash (from storage).
    pub fn from_hash(hash: String) -> Self {
        Self {
            secret: SecretHash::from_hash(hash),
        }
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        self.secret.as_str()
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.secret.into_string()
    }

    /// Verify a plain text password against this hash.
    pub fn verify(&self, plain_text: &str) -> bool {
        self.secret.verify(plain_text)
    }

    /// Spend one verification against a throwaway digest. Always false.
    pub fn verify_dummy(plain_text: &str) -> bool {
        if let Some(dummy) = DUMMY_PASSWORD.as_ref() {
            let _ = dummy.verify(plain_text);
        }
        false
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let plain = "SecurePassword123!";
        let password = Password::new(plain).unwrap();

        assert!(password.verify(plain));
        assert!(!password.verify("WrongPassword123"));
    }

    #[test]
    fn test_password_from_hash() {
        let plain = "TestPassword123";
        let password = Password::new(plain).unwrap();
        let restored = Password::from_hash(password.as_str().to_string());
        assert!(restored.verify(plain));
    }

    #[test]
    fn test_password_too_short() {
        assert!(matches!(Password::new("short"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_password_minimum_length() {
        assert!(Password::new("12345678").is_ok());
    }

    #[test]
    fn test_dummy_never_matches() {
        assert!(!Password::verify_dummy("dummy-password-for-timing"));
    }
}
