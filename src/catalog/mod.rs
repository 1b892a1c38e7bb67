//! Catalog Module
//! Mission: Vendor-scoped products and orders
//!
//! Every read and write in this module takes the vendor id resolved from the
//! caller's token and folds it into the query predicate. A product owned by
//! another vendor is reported exactly like a product that does not exist.

pub mod models;
pub mod sample_orders;
pub mod store;

pub use models::{NewProduct, Order, OrderStatus, OrderView, Product, ProductPatch};
pub use store::{CatalogStore, ProductUpdate};

use std::fmt;

/// Catalog errors
#[derive(Debug)]
pub enum CatalogError {
    /// Absent, or owned by someone else
    ProductNotFound,
    /// Sample orders need at least one product
    NoProducts,
    Internal(anyhow::Error),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::ProductNotFound => write!(f, "Product not found"),
            CatalogError::NoProducts => write!(f, "No products found. Add some products first."),
            CatalogError::Internal(e) => write!(f, "Catalog store failure: {:#}", e),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        CatalogError::Internal(err)
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        CatalogError::Internal(err.into())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Internal(err.into())
    }
}
