use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{CashDay, SaleWithItems};

/// One requested sale line: a catalog product or a free-text item.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemRequest {
    pub product: Option<Uuid>,
    pub name: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[validate(length(min = 1, message = "A sale needs at least one product"))]
    pub products: Vec<SaleItemRequest>,
    pub total: Decimal,
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub payment_method: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleResponse {
    pub message: String,
    pub sale: SaleWithItems,
    pub daily_cash: CashDay,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertSaleResponse {
    pub message: String,
    pub sale: SaleWithItems,
}
