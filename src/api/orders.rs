//! Order Endpoints

use crate::api::error::ApiError;
use crate::api::routes::AppState;
use crate::auth::models::AuthenticatedVendor;
use crate::catalog::OrderView;
use axum::{extract::State, Extension, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SampleOrdersResponse {
    pub message: String,
    pub count: usize,
}

/// GET /api/orders - orders against the caller's products, newest first
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedVendor>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(
        state.catalog.list_orders_for_vendor(principal.vendor_id)?,
    ))
}

/// POST /api/generate-sample-orders
pub async fn generate_sample_orders(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedVendor>,
) -> Result<Json<SampleOrdersResponse>, ApiError> {
    let orders = {
        let mut rng = rand::thread_rng();
        state
            .catalog
            .generate_sample_orders(principal.vendor_id, &mut rng)?
    };

    Ok(Json(SampleOrdersResponse {
        message: format!("Generated {} sample orders successfully", orders.len()),
        count: orders.len(),
    }))
}
