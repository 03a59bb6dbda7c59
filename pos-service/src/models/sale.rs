//! Sale model for pos-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Sale status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Active,
    Reverted,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Active => "active",
            SaleStatus::Reverted => "reverted",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "reverted" => SaleStatus::Reverted,
            _ => SaleStatus::Active,
        }
    }
}

/// Sale record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub sale_id: Uuid,
    pub user_id: Uuid,
    pub sold_utc: DateTime<Utc>,
    pub payment_method: String,
    pub total: Decimal,
    pub status: String,
    pub reverted_utc: Option<DateTime<Utc>>,
}

/// One line of a sale. `product_id` is null for untracked free-text items;
/// display name and unit price are captured at sale time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub sale_item_id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Option<Uuid>,
    pub display_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub sort_order: i32,
}

/// Sale with its line items resolved.
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Input for recording a sale.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub items: Vec<NewSaleItem>,
    pub payment_method: String,
    pub total: Decimal,
}

/// Input for one sale line: a catalog reference or a free-text name.
#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub product_id: Option<Uuid>,
    pub name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
}
