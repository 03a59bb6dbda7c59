use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{CashDay, ExtraExpense, SupplierPayment};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CloseCashRequest {
    #[serde(default)]
    pub extra_expenses: Vec<ExtraExpense>,
    #[serde(default)]
    pub supplier_payments: Vec<SupplierPayment>,
    pub final_real: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseCashResponse {
    pub message: String,
    pub data: CashDay,
}
