//! Authentication API Endpoints
//! Mission: Registration, login, logout and the vendor profile

use crate::api::{error::ApiError, extract::JsonBody};
use crate::auth::{
    jwt::JwtHandler,
    models::{
        is_plausible_email, AuthResponse, AuthenticatedVendor, LoginRequest, RegisterRequest,
        Vendor, VendorProfile,
    },
    vendor_store::{VendorStore, VendorStoreError},
};
use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub vendors: Arc<VendorStore>,
    pub jwt_handler: Arc<JwtHandler>,
}

impl AuthState {
    pub fn new(vendors: Arc<VendorStore>, jwt_handler: Arc<JwtHandler>) -> Self {
        Self {
            vendors,
            jwt_handler,
        }
    }

    fn issue(&self, vendor: &Vendor) -> Result<AuthResponse, ApiError> {
        let (access_token, expires_in) = self.jwt_handler.generate_token(vendor.id)?;
        Ok(AuthResponse {
            access_token,
            token_type: "bearer",
            expires_in,
            vendor: VendorProfile::from_vendor(vendor),
        })
    }
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    validate_registration(&payload)?;
    info!("📝 Registration attempt: {}", payload.email.trim());

    let vendors = state.vendors.clone();
    let vendor = run_blocking(move || vendors.register(&payload)).await?;

    Ok(Json(state.issue(&vendor)?))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    info!("🔐 Login attempt: {}", payload.email.trim());

    let vendors = state.vendors.clone();
    let email = payload.email.clone();
    let vendor = run_blocking(move || vendors.verify(&payload.email, &payload.password))
        .await
        .map_err(|e| {
            if matches!(e, ApiError::InvalidCredentials) {
                warn!("❌ Failed login attempt: {}", email.trim());
            }
            e
        })?;

    info!("✅ Login successful: {} ({})", vendor.email, vendor.id);
    Ok(Json(state.issue(&vendor)?))
}

/// Logout endpoint - POST /api/auth/logout
///
/// Revokes the presented token; it is rejected from now until it would have
/// expired anyway.
pub async fn logout(
    State(state): State<AuthState>,
    Extension(principal): Extension<AuthenticatedVendor>,
) -> Json<Value> {
    state.jwt_handler.revoke(&principal);
    info!("👋 Logout: vendor {}", principal.vendor_id);
    Json(json!({ "message": "Logged out successfully" }))
}

/// Current vendor profile - GET /api/vendor/profile
pub async fn get_profile(
    State(state): State<AuthState>,
    Extension(principal): Extension<AuthenticatedVendor>,
) -> Result<Json<VendorProfile>, ApiError> {
    let vendor = state.vendors.fetch_by_id(principal.vendor_id)?;
    Ok(Json(VendorProfile::from_vendor(&vendor)))
}

fn validate_registration(request: &RegisterRequest) -> Result<(), ApiError> {
    if !is_plausible_email(request.email.trim()) {
        return Err(ApiError::Validation("email is not a valid address".to_string()));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if request.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".to_string()));
    }
    if request.business_name.trim().is_empty() {
        return Err(ApiError::Validation("business_name must not be empty".to_string()));
    }
    Ok(())
}

/// bcrypt is deliberately slow; keep it off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, VendorStoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Credential task failed: {}", e)))?
        .map_err(ApiError::from)
}
