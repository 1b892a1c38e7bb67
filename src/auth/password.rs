//! Password Hashing
//! Mission: Salted, adaptive one-way hashes for vendor credentials

use anyhow::{Context, Result};
use bcrypt::{hash, verify};

/// bcrypt's accepted work factor range
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// bcrypt hasher with a configurable work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password; the generated salt is embedded in the digest
    pub fn hash(&self, password: &str) -> Result<String> {
        hash(password, self.cost).context("Failed to hash password")
    }

    /// Check a password against a stored digest. A malformed digest never matches.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        verify(password, digest).unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
