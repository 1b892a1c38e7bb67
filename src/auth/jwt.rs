//! JWT Token Handler
//! Mission: Generate and validate vendor bearer tokens securely
//!
//! New tokens are always signed with the current secret. Verification also
//! accepts the configured previous secrets so a secret can be rotated without
//! logging every vendor out at once.

use crate::auth::models::{AuthenticatedVendor, Claims};
use crate::auth::revocation::RevocationList;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Why a token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Signature verified but `exp` is in the past
    Expired,
    /// Bad format, bad signature, or bad claims
    Invalid,
    /// Signature and expiry fine, but the token was revoked
    Revoked,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token expired"),
            TokenError::Invalid => write!(f, "Invalid token"),
            TokenError::Revoked => write!(f, "Token revoked"),
        }
    }
}

impl std::error::Error for TokenError {}

/// JWT Handler for token operations
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_keys: Vec<DecodingKey>,
    ttl: Duration,
    revocations: RevocationList,
}

impl JwtHandler {
    /// Create a handler signing with `secret`, 24-hour tokens, no previous secrets
    pub fn new(secret: &str) -> Result<Self> {
        Self::with_rotation(secret, &[], Duration::hours(24))
    }

    /// Create a handler that also verifies tokens signed with `previous_secrets`
    pub fn with_rotation(secret: &str, previous_secrets: &[String], ttl: Duration) -> Result<Self> {
        if secret.is_empty() {
            bail!("JWT signing secret must not be empty");
        }
        if ttl <= Duration::zero() {
            bail!("Token lifetime must be positive");
        }

        let decoding_keys = std::iter::once(secret)
            .chain(previous_secrets.iter().map(String::as_str))
            .filter(|s| !s.is_empty())
            .map(|s| DecodingKey::from_secret(s.as_bytes()))
            .collect();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_keys,
            ttl,
            revocations: RevocationList::new(),
        })
    }

    /// Generate a token for a vendor; returns the token and its lifetime in seconds
    pub fn generate_token(&self, vendor_id: Uuid) -> Result<(String, i64)> {
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .context("Invalid timestamp")?;
        let token = self.generate_token_expiring_at(vendor_id, expires_at)?;
        Ok((token, self.ttl.num_seconds()))
    }

    /// Generate a token with an explicit expiry instant (which may be in the past)
    pub fn generate_token_expiring_at(
        &self,
        vendor_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<String> {
        let claims = Claims {
            sub: vendor_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        };

        debug!("Generating JWT for vendor {}, expires at {}", vendor_id, expires_at);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to generate JWT")
    }

    /// Validate a token and resolve the vendor it was issued to
    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedVendor, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let mut claims = None;
        for key in &self.decoding_keys {
            match decode::<Claims>(token, key, &validation) {
                Ok(data) => {
                    claims = Some(data.claims);
                    break;
                }
                // Expiry is only checked once the signature has verified
                Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                    return Err(TokenError::Expired);
                }
                Err(_) => continue,
            }
        }

        let claims = claims.ok_or(TokenError::Invalid)?;
        let vendor_id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::Invalid)?;

        if self.revocations.is_revoked(&claims.jti) {
            return Err(TokenError::Revoked);
        }

        debug!("Validated JWT for vendor {}", vendor_id);

        Ok(AuthenticatedVendor {
            vendor_id,
            token_id: claims.jti,
            expires_at: claims.exp,
        })
    }

    /// Revoke a previously validated token for the rest of its lifetime
    pub fn revoke(&self, principal: &AuthenticatedVendor) {
        self.revocations.revoke(&principal.token_id, principal.expires_at);
    }

    /// Forget revocations whose tokens have expired anyway
    pub fn prune_revocations(&self) -> usize {
        self.revocations.prune()
    }
}
