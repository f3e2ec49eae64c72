//! Checkout handoff codes.
//!
//! A code is drawn uniformly from 100000..=999999, shown to the buyer once
//! and stored only as a [`SecretHash`].

use rand::{rngs::OsRng, Rng};

use super::secret::SecretHash;
use crate::config::{OTP_LENGTH, OTP_MAX, OTP_MIN};
use crate::errors::AppResult;

/// Plaintext six-digit handoff code. Redacted in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimeCode(String);

impl std::fmt::Debug for OneTimeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OneTimeCode([REDACTED])")
    }
}

impl OneTimeCode {
    /// Draw a fresh code from the operating system RNG.
    pub fn generate() -> Self {
        let value: u32 = OsRng.gen_range(OTP_MIN..=OTP_MAX);
        Self(value.to_string())
    }

    /// Salted slow digest for storage.
    pub fn hash(&self) -> AppResult<SecretHash> {
        SecretHash::new(&self.0)
    }

    /// Plaintext, for the one-time checkout response only.
    pub fn into_plain(self) -> String {
        self.0
    }

    /// Whether a submitted candidate even has the shape of a code.
    pub fn is_well_formed(candidate: &str) -> bool {
        candidate.len() == OTP_LENGTH && candidate.bytes().all(|b| b.is_ascii_digit())
    }
}
