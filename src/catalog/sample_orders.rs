//! Sample Order Generator
//! Mission: Give a vendor with products something to look at on the orders page

use crate::catalog::models::{Order, OrderStatus, Product};
use crate::catalog::CatalogError;
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

pub const MIN_ORDERS: usize = 10;
pub const MAX_ORDERS: usize = 15;
pub const MAX_QUANTITY: i64 = 5;
pub const MAX_AGE_DAYS: i64 = 30;

pub const CUSTOMERS: [(&str, &str); 8] = [
    ("John Doe", "john@example.com"),
    ("Jane Smith", "jane@example.com"),
    ("Mike Johnson", "mike@example.com"),
    ("Sarah Wilson", "sarah@example.com"),
    ("David Brown", "david@example.com"),
    ("Emma Davis", "emma@example.com"),
    ("Chris Taylor", "chris@example.com"),
    ("Lisa Anderson", "lisa@example.com"),
];

/// Build 10-15 random orders against `products`, all stamped with `vendor_id`.
///
/// Nothing is persisted here; an empty product list is an error so the caller
/// never writes a partial or empty batch.
pub fn generate<R: Rng + ?Sized>(
    vendor_id: Uuid,
    products: &[Product],
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<Order>, CatalogError> {
    if products.is_empty() {
        return Err(CatalogError::NoProducts);
    }

    let count = rng.gen_range(MIN_ORDERS..=MAX_ORDERS);
    let mut orders = Vec::with_capacity(count);

    for _ in 0..count {
        let product = products.choose(rng).ok_or(CatalogError::NoProducts)?;
        let (customer_name, customer_email) = CUSTOMERS[rng.gen_range(0..CUSTOMERS.len())];
        let quantity = rng.gen_range(1..=MAX_QUANTITY);
        let status = OrderStatus::ALL[rng.gen_range(0..OrderStatus::ALL.len())];
        let age = Duration::days(rng.gen_range(0..=MAX_AGE_DAYS));

        orders.push(Order {
            id: Uuid::new_v4(),
            vendor_id,
            product_id: product.id,
            quantity,
            total_price: product.price * quantity as f64,
            customer_name: customer_name.to_string(),
            customer_email: customer_email.to_string(),
            status,
            created_at: now - age,
        });
    }

    Ok(orders)
}
