/// Password Hashing and Verification
///
/// bcrypt behind a small trait so the auth service can be driven with a
/// cheaper cost in tests. Strength rules are enforced by the request
/// validators, not here.

use bcrypt::{hash, verify, DEFAULT_COST};

/// Raised only when the bcrypt primitive itself fails (bad cost, rng failure).
/// Callers treat it as an internal error, never as a validation problem.
#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(#[from] bcrypt::BcryptError);

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// `false` on a mismatch and on a malformed hash alike.
    fn check_password(&self, password: &str, password_hash: &str) -> bool;
}

pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        Ok(hash(password, self.cost)?)
    }

    fn check_password(&self, password: &str, password_hash: &str) -> bool {
        verify(password, password_hash).unwrap_or(false)
    }
}
