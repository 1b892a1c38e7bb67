use crate::auth::middleware::AuthError;
use crate::auth::vendor_store::VendorStoreError;
use crate::catalog::CatalogError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Every handler failure the API can surface.
///
/// Messages are short and fixed; internal causes are logged, never returned.
#[derive(Debug)]
pub enum ApiError {
    DuplicateEmail,
    InvalidCredentials,
    Unauthenticated(AuthError),
    NotFound(&'static str),
    Validation(String),
    PreconditionFailed(String),
    PayloadTooLarge,
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DuplicateEmail => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PreconditionFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a body extractor rejection. Oversized bodies keep their 413;
    /// anything else is a malformed request.
    pub fn from_rejection(status: StatusCode, body_text: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::Validation(body_text)
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthenticated(err)
    }
}

impl From<VendorStoreError> for ApiError {
    fn from(err: VendorStoreError) -> Self {
        match err {
            VendorStoreError::DuplicateEmail => ApiError::DuplicateEmail,
            VendorStoreError::InvalidCredentials => ApiError::InvalidCredentials,
            VendorStoreError::NotFound => ApiError::NotFound("Vendor"),
            VendorStoreError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ProductNotFound => ApiError::NotFound("Product"),
            CatalogError::NoProducts => {
                ApiError::PreconditionFailed(CatalogError::NoProducts.to_string())
            }
            CatalogError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Unauthenticated(auth) => return auth.into_response(),
            ApiError::DuplicateEmail => "Email already registered".to_string(),
            ApiError::InvalidCredentials => "Invalid credentials".to_string(),
            ApiError::NotFound(resource) => format!("{} not found", resource),
            ApiError::Validation(msg) | ApiError::PreconditionFailed(msg) => msg,
            ApiError::PayloadTooLarge => "Request body too large".to_string(),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                "Internal server error".to_string()
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}
