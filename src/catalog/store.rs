//! Catalog Storage
//! Mission: Vendor-scoped product and order persistence in SQLite
//!
//! Ownership is part of every statement's WHERE clause. Updates and deletes
//! are single conditional statements (`... WHERE id = ? AND vendor_id = ?`),
//! so there is no gap between checking ownership and mutating the row.
//! Concurrent updates by the owner are last-write-wins.

use crate::catalog::models::{NewProduct, Order, OrderStatus, OrderView, Product, ProductPatch};
use crate::catalog::{sample_orders, CatalogError};
use crate::db::{decode_ts, decode_uuid, encode_ts, Database};
use anyhow::Context;
use chrono::Utc;
use rand::Rng;
use rusqlite::{params, types::Type, OptionalExtension, Row};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "id, vendor_id, name, price, description, quantity, category, \
                               images_json, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, vendor_id, product_id, quantity, total_price, customer_name, \
                             customer_email, status, created_at";

/// Result of a product update
#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub product: Product,
    /// Image paths the update displaced; empty unless new images were supplied
    pub replaced_images: Vec<String>,
}

/// Product and order storage
#[derive(Clone)]
pub struct CatalogStore {
    db: Database,
}

impl CatalogStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All products owned by `vendor_id`, oldest first
    pub fn list_products(&self, vendor_id: Uuid) -> Result<Vec<Product>, CatalogError> {
        let conn = self.db.lock();
        let sql = format!(
            "SELECT {} FROM products WHERE vendor_id = ?1 ORDER BY created_at ASC, id ASC",
            PRODUCT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map(params![vendor_id.to_string()], product_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    /// Create a product owned by `vendor_id`
    pub fn create_product(
        &self,
        vendor_id: Uuid,
        fields: &NewProduct,
        images: Vec<String>,
    ) -> Result<Product, CatalogError> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            vendor_id,
            name: fields.name.trim().to_string(),
            price: fields.price,
            description: fields.description.clone(),
            quantity: fields.quantity,
            category: fields.category.trim().to_string(),
            images,
            created_at: now,
            updated_at: now,
        };

        let conn = self.db.lock();
        conn.execute(
            "INSERT INTO products (id, vendor_id, name, price, description, quantity, category,
                                   images_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                product.id.to_string(),
                product.vendor_id.to_string(),
                product.name,
                product.price,
                product.description,
                product.quantity,
                product.category,
                serde_json::to_string(&product.images)?,
                encode_ts(&product.created_at),
                encode_ts(&product.updated_at),
            ],
        )
        .context("Failed to insert product")?;

        info!(
            "🆕 Product created: {} ({}) for vendor {}",
            product.name, product.id, vendor_id
        );
        Ok(product)
    }

    /// One product, if it exists and belongs to `vendor_id`
    pub fn get_product(&self, vendor_id: Uuid, product_id: Uuid) -> Result<Product, CatalogError> {
        let conn = self.db.lock();
        let sql = format!(
            "SELECT {} FROM products WHERE id = ?1 AND vendor_id = ?2",
            PRODUCT_COLUMNS
        );
        conn.query_row(
            &sql,
            params![product_id.to_string(), vendor_id.to_string()],
            product_from_row,
        )
        .optional()?
        .ok_or(CatalogError::ProductNotFound)
    }

    /// Apply a partial update to a product owned by `vendor_id`.
    ///
    /// Unsupplied fields keep their values; `updated_at` is always refreshed.
    /// The displaced image list is read in the same transaction as the write.
    pub fn update_product(
        &self,
        vendor_id: Uuid,
        product_id: Uuid,
        patch: &ProductPatch,
    ) -> Result<ProductUpdate, CatalogError> {
        let images_json = patch
            .images
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut conn = self.db.lock();
        let tx = conn.transaction().context("Failed to begin product update")?;

        let previous_images: String = tx
            .query_row(
                "SELECT images_json FROM products WHERE id = ?1 AND vendor_id = ?2",
                params![product_id.to_string(), vendor_id.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(CatalogError::ProductNotFound)?;

        let sql = format!(
            "UPDATE products SET
                 name = COALESCE(?3, name),
                 price = COALESCE(?4, price),
                 description = COALESCE(?5, description),
                 quantity = COALESCE(?6, quantity),
                 category = COALESCE(?7, category),
                 images_json = COALESCE(?8, images_json),
                 updated_at = ?9
             WHERE id = ?1 AND vendor_id = ?2
             RETURNING {}",
            PRODUCT_COLUMNS
        );
        let updated = tx
            .query_row(
                &sql,
                params![
                    product_id.to_string(),
                    vendor_id.to_string(),
                    patch.name.as_deref().map(str::trim),
                    patch.price,
                    patch.description,
                    patch.quantity,
                    patch.category.as_deref().map(str::trim),
                    images_json,
                    encode_ts(&Utc::now()),
                ],
                product_from_row,
            )
            .optional()?
            .ok_or(CatalogError::ProductNotFound)?;
        tx.commit().context("Failed to commit product update")?;

        let replaced_images = if patch.images.is_some() {
            serde_json::from_str(&previous_images)?
        } else {
            Vec::new()
        };

        info!("✏️  Product updated: {} for vendor {}", product_id, vendor_id);
        Ok(ProductUpdate {
            product: updated,
            replaced_images,
        })
    }

    /// Delete a product owned by `vendor_id`; returns the removed row
    pub fn delete_product(&self, vendor_id: Uuid, product_id: Uuid) -> Result<Product, CatalogError> {
        let conn = self.db.lock();
        let sql = format!(
            "DELETE FROM products WHERE id = ?1 AND vendor_id = ?2 RETURNING {}",
            PRODUCT_COLUMNS
        );
        let deleted = conn
            .query_row(
                &sql,
                params![product_id.to_string(), vendor_id.to_string()],
                product_from_row,
            )
            .optional()?
            .ok_or(CatalogError::ProductNotFound)?;

        info!("🗑️  Product deleted: {} for vendor {}", product_id, vendor_id);
        Ok(deleted)
    }

    /// Orders against the vendor's products, newest first, with product display fields.
    ///
    /// Resolved through the vendor's products rather than the order's own
    /// vendor column, then joined in memory.
    pub fn list_orders_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<OrderView>, CatalogError> {
        let products: HashMap<Uuid, Product> = self
            .list_products(vendor_id)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        if products.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.db.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM orders \
             WHERE product_id IN (SELECT id FROM products WHERE vendor_id = ?1) \
             ORDER BY created_at DESC, id ASC",
            ORDER_COLUMNS
        ))?;
        let orders = stmt
            .query_map(params![vendor_id.to_string()], order_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let views = orders
            .into_iter()
            .filter_map(|order| {
                let product = products.get(&order.product_id)?;
                Some(OrderView::new(order, product))
            })
            .collect::<Vec<_>>();

        debug!("Resolved {} orders for vendor {}", views.len(), vendor_id);
        Ok(views)
    }

    /// Insert a batch of orders in one transaction: all rows or none
    pub fn insert_orders(&self, orders: &[Order]) -> Result<usize, CatalogError> {
        let mut conn = self.db.lock();
        let tx = conn.transaction().context("Failed to begin order batch")?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO orders ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                ORDER_COLUMNS
            ))?;
            for order in orders {
                stmt.execute(params![
                    order.id.to_string(),
                    order.vendor_id.to_string(),
                    order.product_id.to_string(),
                    order.quantity,
                    order.total_price,
                    order.customer_name,
                    order.customer_email,
                    order.status.as_str(),
                    encode_ts(&order.created_at),
                ])?;
            }
        }
        tx.commit().context("Failed to commit order batch")?;
        Ok(orders.len())
    }

    /// Generate and persist a batch of sample orders for the vendor's products
    pub fn generate_sample_orders<R: Rng + ?Sized>(
        &self,
        vendor_id: Uuid,
        rng: &mut R,
    ) -> Result<Vec<Order>, CatalogError> {
        let products = self.list_products(vendor_id)?;
        let orders = sample_orders::generate(vendor_id, &products, Utc::now(), rng)?;
        self.insert_orders(&orders)?;

        info!(
            "🧪 Generated {} sample orders for vendor {}",
            orders.len(),
            vendor_id
        );
        Ok(orders)
    }
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    let images_json: String = row.get(7)?;
    let images = serde_json::from_str(&images_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(Product {
        id: decode_uuid(0, &row.get::<_, String>(0)?)?,
        vendor_id: decode_uuid(1, &row.get::<_, String>(1)?)?,
        name: row.get(2)?,
        price: row.get(3)?,
        description: row.get(4)?,
        quantity: row.get(5)?,
        category: row.get(6)?,
        images,
        created_at: decode_ts(8, &row.get::<_, String>(8)?)?,
        updated_at: decode_ts(9, &row.get::<_, String>(9)?)?,
    })
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    let status_str: String = row.get(7)?;
    let status = OrderStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            Type::Text,
            format!("unknown order status: {}", status_str).into(),
        )
    })?;

    Ok(Order {
        id: decode_uuid(0, &row.get::<_, String>(0)?)?,
        vendor_id: decode_uuid(1, &row.get::<_, String>(1)?)?,
        product_id: decode_uuid(2, &row.get::<_, String>(2)?)?,
        quantity: row.get(3)?,
        total_price: row.get(4)?,
        customer_name: row.get(5)?,
        customer_email: row.get(6)?,
        status,
        created_at: decode_ts(8, &row.get::<_, String>(8)?)?,
    })
}
