//! Token Revocation
//! Mission: Make logged-out tokens stop working before they expire
//!
//! Entries are keyed by the token's `jti` and remembered until the token's own
//! expiry, after which signature validation rejects it anyway. The list is
//! process-local and does not survive a restart.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

#[derive(Default)]
pub struct RevocationList {
    revoked: Mutex<HashMap<String, i64>>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny `jti` until `expires_at` (unix seconds)
    pub fn revoke(&self, jti: &str, expires_at: i64) {
        self.revoked.lock().insert(jti.to_string(), expires_at);
        debug!("Revoked token {} (expires at {})", jti, expires_at);
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.lock().contains_key(jti)
    }

    /// Drop entries whose tokens have expired; returns how many were removed
    pub fn prune(&self) -> usize {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.lock();
        let before = revoked.len();
        revoked.retain(|_, expires_at| *expires_at > now);
        before - revoked.len()
    }

    pub fn len(&self) -> usize {
        self.revoked.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
