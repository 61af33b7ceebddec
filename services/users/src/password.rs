//! Password hashing with argon2
//!
//! Every hash gets a fresh random salt, so hashing the same secret twice
//! yields two different PHC strings that both verify.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
    password_hash::SaltString,
};
use thiserror::Error;

/// Errors produced while hashing
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must not be empty")]
    EmptyInput,

    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Adaptive one-way hasher for user secrets
#[derive(Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Hasher with an explicit argon2id cost.
    ///
    /// `memory_kib` is the memory cost in KiB, `iterations` the time cost.
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext secret into a PHC string.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        if plaintext.is_empty() {
            return Err(PasswordError::EmptyInput);
        }

        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Check a plaintext secret against a stored PHC string.
    ///
    /// A malformed stored hash verifies as `false`. The cost parameters are
    /// taken from the stored hash, not from this hasher.
    pub fn verify(&self, hash: &str, plaintext: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> PasswordHasher {
    PasswordHasher::with_params(8, 1, 1).expect("valid test params")
}
