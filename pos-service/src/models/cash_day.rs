//! Daily cash register model for pos-service.
//!
//! One record per owner per calendar day. The record stays `open` while
//! sales accrete into it and becomes immutable once `closed`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::SaleWithItems;

/// Register status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashDayStatus {
    Open,
    Closed,
}

impl CashDayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashDayStatus::Open => "open",
            CashDayStatus::Closed => "closed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "closed" => CashDayStatus::Closed,
            _ => CashDayStatus::Open,
        }
    }
}

/// A cash outflow recorded at close time that is not a supplier payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraExpense {
    pub description: String,
    pub amount: Decimal,
}

/// A supplier payment recorded at close time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPayment {
    pub method: String,
    pub total: Decimal,
}

/// The per-day register record. Closing fields stay null until close-out.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CashDay {
    pub cash_day_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "date")]
    pub day: NaiveDate,
    pub total_sales_amount: Decimal,
    pub total_operations: i32,
    pub status: String,
    pub extra_expenses: Option<Json<Vec<ExtraExpense>>>,
    pub supplier_payments: Option<Json<Vec<SupplierPayment>>>,
    pub total_out: Option<Decimal>,
    pub final_expected: Option<Decimal>,
    pub final_real: Option<Decimal>,
    pub difference: Option<Decimal>,
    pub created_utc: DateTime<Utc>,
    pub closed_utc: Option<DateTime<Utc>>,
}

/// Register with its sales resolved to line-item detail.
#[derive(Debug, Clone, Serialize)]
pub struct CashDayWithSales {
    #[serde(flatten)]
    pub cash_day: CashDay,
    pub sales: Vec<SaleWithItems>,
}

/// Projection returned by the closed-day listing.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ClosedDaySummary {
    #[serde(rename = "date")]
    pub day: NaiveDate,
    pub total_sales_amount: Decimal,
    pub total_out: Option<Decimal>,
    pub final_expected: Option<Decimal>,
    pub final_real: Option<Decimal>,
    pub difference: Option<Decimal>,
}

/// Close-out figures derived from the day's takings and outflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseTotals {
    pub total_out: Decimal,
    pub final_expected: Decimal,
    pub final_real: Decimal,
    pub difference: Decimal,
}

/// Compute the close-out figures. When the operator does not declare a
/// counted amount, the expected amount is taken as counted and the
/// difference is zero.
pub fn compute_close(
    total_sales_amount: Decimal,
    extra_expenses: &[ExtraExpense],
    supplier_payments: &[SupplierPayment],
    final_real: Option<Decimal>,
) -> CloseTotals {
    let expenses: Decimal = extra_expenses.iter().map(|e| e.amount).sum();
    let payments: Decimal = supplier_payments.iter().map(|p| p.total).sum();
    let total_out = expenses + payments;
    let final_expected = total_sales_amount - total_out;
    let real = final_real.unwrap_or(final_expected);

    CloseTotals {
        total_out,
        final_expected,
        final_real: real,
        difference: real - final_expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn expense(amount: &str) -> ExtraExpense {
        ExtraExpense {
            description: "misc".to_string(),
            amount: dec(amount),
        }
    }

    fn payment(total: &str) -> SupplierPayment {
        SupplierPayment {
            method: "cash".to_string(),
            total: dec(total),
        }
    }

    #[test]
    fn close_without_declared_count_balances_to_zero() {
        let totals = compute_close(dec("10000"), &[expense("1500")], &[payment("2000")], None);

        assert_eq!(totals.total_out, dec("3500"));
        assert_eq!(totals.final_expected, dec("6500"));
        assert_eq!(totals.final_real, dec("6500"));
        assert_eq!(totals.difference, Decimal::ZERO);
    }

    #[test]
    fn declared_count_below_expected_yields_negative_difference() {
        let totals = compute_close(
            dec("10000"),
            &[expense("1500")],
            &[payment("2000")],
            Some(dec("6000")),
        );

        assert_eq!(totals.final_expected, dec("6500"));
        assert_eq!(totals.final_real, dec("6000"));
        assert_eq!(totals.difference, dec("-500"));
    }

    #[test]
    fn close_with_no_outflows_expects_full_takings() {
        let totals = compute_close(dec("1234.56"), &[], &[], None);

        assert_eq!(totals.total_out, Decimal::ZERO);
        assert_eq!(totals.final_expected, dec("1234.56"));
        assert_eq!(totals.difference, Decimal::ZERO);
    }

    #[test]
    fn outflows_can_exceed_takings() {
        let totals = compute_close(dec("100"), &[expense("150")], &[], None);

        assert_eq!(totals.final_expected, dec("-50"));
        assert_eq!(totals.final_real, dec("-50"));
        assert_eq!(totals.difference, Decimal::ZERO);
    }
}
