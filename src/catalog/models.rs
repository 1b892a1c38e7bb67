//! Catalog Models
//! Mission: Products, orders and the read-time order view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product owned by exactly one vendor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub quantity: i64,
    pub category: String,
    pub images: Vec<String>, // "/uploads/<name>", first is primary
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Client-supplied fields for a new product. The owner is never part of this.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub quantity: i64,
    pub category: String,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_price(self.price)?;
        validate_quantity(self.quantity)?;
        validate_category(&self.category)
    }
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub category: Option<String>,
    /// Replaces the whole image list when present
    pub images: Option<Vec<String>>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
        }
        if let Some(category) = &self.category {
            validate_category(category)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name must not be empty".to_string());
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<(), String> {
    if category.trim().is_empty() {
        return Err("category must not be empty".to_string());
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() || price < 0.0 {
        return Err("price must be a non-negative number".to_string());
    }
    Ok(())
}

fn validate_quantity(quantity: i64) -> Result<(), String> {
    if quantity < 0 {
        return Err("quantity must be a non-negative integer".to_string());
    }
    Ok(())
}

/// Order lifecycle states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

/// An order placed against a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub total_price: f64,
    pub customer_name: String,
    pub customer_email: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Order enriched with product display fields resolved at read time
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub product_name: String,
    pub product_image: Option<String>,
}

impl OrderView {
    pub fn new(order: Order, product: &Product) -> Self {
        Self {
            product_name: product.name.clone(),
            product_image: product.primary_image().map(str::to_string),
            order,
        }
    }
}
