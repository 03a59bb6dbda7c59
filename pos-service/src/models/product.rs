//! Product catalog model for pos-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Catalog product with tracked stock.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub price: Decimal,
    pub cost: Option<Decimal>,
    pub stock: i32,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub user_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub price: Decimal,
    pub cost: Option<Decimal>,
    pub stock: i32,
    pub barcode: Option<String>,
    pub description: Option<String>,
}

/// Input for updating a product. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub stock: Option<i32>,
    pub barcode: Option<String>,
    pub description: Option<String>,
}
