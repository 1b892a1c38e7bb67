//! Product Endpoints
//! Mission: Vendor-scoped product CRUD with image attachments
//!
//! Product bodies arrive as forms: multipart when images are attached,
//! urlencoded otherwise. Both are read into the same `ProductForm`.

use crate::api::error::ApiError;
use crate::api::routes::AppState;
use crate::auth::models::AuthenticatedVendor;
use crate::catalog::{NewProduct, Product, ProductPatch};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::header::CONTENT_TYPE,
    Extension, Form, Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

const IMAGES_FIELD: &str = "images";

/// An uploaded file part
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Text fields and image parts of a product form
#[derive(Debug, Default)]
pub struct ProductForm {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

#[async_trait]
impl<S> FromRequest<S> for ProductForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
            return Ok(Self {
                fields,
                files: Vec::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;

        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == IMAGES_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
                // Browsers send an empty, unnamed part when no file is picked
                if !file_name.is_empty() {
                    form.files.push(UploadedFile { file_name, bytes });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }
}

impl ProductForm {
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// All fields required
    pub fn new_product(&self) -> Result<NewProduct, ApiError> {
        Ok(NewProduct {
            name: self.required("name")?.to_string(),
            price: self.parsed("price")?.ok_or_else(|| missing("price"))?,
            description: self.required("description")?.to_string(),
            quantity: self.parsed("quantity")?.ok_or_else(|| missing("quantity"))?,
            category: self.required("category")?.to_string(),
        })
    }

    /// Only the fields present; images are attached by the caller
    pub fn patch(&self) -> Result<ProductPatch, ApiError> {
        Ok(ProductPatch {
            name: self.fields.get("name").cloned(),
            price: self.parsed("price")?,
            description: self.fields.get("description").cloned(),
            quantity: self.parsed("quantity")?,
            category: self.fields.get("category").cloned(),
            images: None,
        })
    }

    fn required(&self, key: &'static str) -> Result<&str, ApiError> {
        self.fields
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| missing(key))
    }

    fn parsed<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ApiError> {
        self.fields
            .get(key)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|_| ApiError::Validation(format!("{} must be a number", key)))
            })
            .transpose()
    }
}

fn missing(key: &str) -> ApiError {
    ApiError::Validation(format!("{} is required", key))
}

/// Malformed ids cannot name an existing product
fn parse_product_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Product"))
}

async fn store_images(state: &AppState, files: &[UploadedFile]) -> Result<Vec<String>, ApiError> {
    let mut saved = Vec::with_capacity(files.len());
    for file in files {
        match state.uploads.save(&file.file_name, &file.bytes).await {
            Ok(path) => saved.push(path),
            Err(e) => {
                state.uploads.remove_all(&saved).await;
                return Err(e.into());
            }
        }
    }
    Ok(saved)
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedVendor>,
    form: ProductForm,
) -> Result<Json<Product>, ApiError> {
    let fields = form.new_product()?;
    fields.validate().map_err(ApiError::Validation)?;

    let images = store_images(&state, form.files()).await?;
    match state
        .catalog
        .create_product(principal.vendor_id, &fields, images.clone())
    {
        Ok(product) => Ok(Json(product)),
        Err(e) => {
            state.uploads.remove_all(&images).await;
            Err(e.into())
        }
    }
}

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedVendor>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.list_products(principal.vendor_id)?))
}

/// GET /api/products/:id
pub async fn get_product(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedVendor>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    Ok(Json(
        state.catalog.get_product(principal.vendor_id, product_id)?,
    ))
}

/// PUT /api/products/:id
///
/// Partial update. Attached images replace the existing list.
pub async fn update_product(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedVendor>,
    Path(product_id): Path<String>,
    form: ProductForm,
) -> Result<Json<Product>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    let mut patch = form.patch()?;
    patch.validate().map_err(ApiError::Validation)?;

    // Don't write files for a product the caller cannot see
    state.catalog.get_product(principal.vendor_id, product_id)?;

    let new_images = if form.files().is_empty() {
        None
    } else {
        Some(store_images(&state, form.files()).await?)
    };
    patch.images = new_images.clone();

    match state
        .catalog
        .update_product(principal.vendor_id, product_id, &patch)
    {
        Ok(update) => {
            state.uploads.remove_all(&update.replaced_images).await;
            Ok(Json(update.product))
        }
        Err(e) => {
            if let Some(images) = &new_images {
                state.uploads.remove_all(images).await;
            }
            Err(e.into())
        }
    }
}

/// DELETE /api/products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedVendor>,
    Path(product_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    let deleted = state
        .catalog
        .delete_product(principal.vendor_id, product_id)?;
    state.uploads.remove_all(&deleted.images).await;

    info!("Removed {} image(s) with product {}", deleted.images.len(), deleted.id);
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}
