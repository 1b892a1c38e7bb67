//! Authentication Models
//! Mission: Define vendor identity and token data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vendor account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub name: String,
    pub business_name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (vendor_id)
    pub jti: String, // token id, the revocation handle
    pub iat: i64,
    pub exp: i64, // expiration timestamp
}

/// The principal resolved from a verified bearer token.
///
/// Inserted into request extensions by the auth middleware; every scoped
/// handler takes its vendor identity from here and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedVendor {
    pub vendor_id: Uuid,
    pub token_id: String,
    pub expires_at: i64,
}

/// Registration request body
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub business_name: String,
    pub phone: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token response for register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64, // seconds until expiration
    pub vendor: VendorProfile,
}

/// Vendor profile (sanitized)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VendorProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub business_name: String,
    pub phone: String,
}

impl VendorProfile {
    pub fn from_vendor(vendor: &Vendor) -> Self {
        Self {
            id: vendor.id.to_string(),
            email: vendor.email.clone(),
            name: vendor.name.clone(),
            business_name: vendor.business_name.clone(),
            phone: vendor.phone.clone(),
        }
    }
}

/// Lower-cased, trimmed login key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal shape check: one '@', something before it, a dotted domain after it
pub fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
