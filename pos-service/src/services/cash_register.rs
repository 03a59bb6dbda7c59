//! Daily cash register workflow for pos-service.
//!
//! Owns the lifecycle of the per-day register record: lazy creation,
//! accretion of new sales, compensating reversal, close-out and history.
//! Every multi-step mutation runs in a single transaction, and the day row
//! is locked with `FOR UPDATE` so concurrent sales cannot lose updates.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use pos_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::{
    compute_close, CashDay, CashDayStatus, CashDayWithSales, ClosedDaySummary, ExtraExpense,
    NewSale, Sale, SaleItem, SaleStatus, SaleWithItems, SupplierPayment,
};
use crate::services::metrics::{CASH_DAYS_CLOSED_TOTAL, DB_QUERY_DURATION, SALES_REVERTED_TOTAL, SALES_TOTAL};
use crate::services::Database;

const CASH_DAY_COLUMNS: &str = "cash_day_id, user_id, day, total_sales_amount, total_operations, \
     status, extra_expenses, supplier_payments, total_out, final_expected, final_real, \
     difference, created_utc, closed_utc";

/// Daily cash register service.
#[derive(Clone)]
pub struct CashRegister {
    db: Database,
    utc_offset: Duration,
}

impl CashRegister {
    pub fn new(db: Database, utc_offset_minutes: i64) -> Self {
        Self {
            db,
            utc_offset: Duration::minutes(utc_offset_minutes),
        }
    }

    /// The calendar day register operations belong to right now.
    pub fn business_today(&self) -> NaiveDate {
        business_day(Utc::now(), self.utc_offset)
    }

    // -------------------------------------------------------------------------
    // Register Retrieval
    // -------------------------------------------------------------------------

    /// Get today's register, creating it if absent.
    ///
    /// Creation backfills the register from the day's active sales, so a
    /// register opened late in the day still reflects everything sold.
    /// Subsequent calls return the stored record without re-scanning.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_or_create_today(&self, user_id: Uuid) -> Result<CashDayWithSales, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_or_create_today"])
            .start_timer();

        let day = self.business_today();

        if let Some(existing) = self.fetch_day(user_id, day).await? {
            timer.observe_duration();
            return self.with_sales(existing).await;
        }

        let mut tx = self.begin().await?;
        let created = match self.create_day_in_tx(&mut tx, user_id, day).await {
            Ok(created) => {
                tx.commit().await.map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
                })?;
                created
            }
            Err(e) => {
                tx.rollback().await.ok();
                return Err(e);
            }
        };

        timer.observe_duration();

        // `None` means a concurrent request created the row first.
        let cash_day = match created {
            Some(cash_day) => cash_day,
            None => self.fetch_day(user_id, day).await?.ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!("Daily cash record vanished after creation"))
            })?,
        };

        self.with_sales(cash_day).await
    }

    /// Fetch the register for an explicit date, with sales resolved.
    #[instrument(skip(self), fields(user_id = %user_id, day = %day))]
    pub async fn day_by_date(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> Result<CashDayWithSales, AppError> {
        let cash_day = self.fetch_day(user_id, day).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("No daily cash record found for that date"))
        })?;

        self.with_sales(cash_day).await
    }

    /// List closed registers, most recent day first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn closed_days(&self, user_id: Uuid) -> Result<Vec<ClosedDaySummary>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["closed_days"])
            .start_timer();

        let days = sqlx::query_as::<_, ClosedDaySummary>(
            r#"
            SELECT day, total_sales_amount, total_out, final_expected, final_real, difference
            FROM cash_days
            WHERE user_id = $1 AND status = 'closed'
            ORDER BY day DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list closed days: {}", e)))?;

        timer.observe_duration();

        Ok(days)
    }

    // -------------------------------------------------------------------------
    // Sale Accretion
    // -------------------------------------------------------------------------

    /// Record a sale and fold it into today's register.
    ///
    /// Stock decrements, the sale write and the register update commit as
    /// one unit; any line-item failure rolls everything back.
    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn record_sale(
        &self,
        user_id: Uuid,
        input: &NewSale,
    ) -> Result<(SaleWithItems, CashDay), AppError> {
        if input.items.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "A sale needs at least one line item"
            )));
        }
        for item in &input.items {
            if item.quantity < 1 {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Line item quantities must be at least 1"
                )));
            }
            if item.product_id.is_none() && item.name.as_deref().unwrap_or("").is_empty() {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Each line item needs a product reference or a name"
                )));
            }
        }
        let computed: Decimal = input
            .items
            .iter()
            .map(|i| Decimal::from(i.quantity) * i.unit_price)
            .sum();
        if computed != input.total {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Sale total {} does not match the line items ({})",
                input.total,
                computed
            )));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_sale"])
            .start_timer();

        let day = self.business_today();
        let mut tx = self.begin().await?;
        let result = match self.record_sale_in_tx(&mut tx, user_id, input, day).await {
            Ok(result) => {
                tx.commit().await.map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
                })?;
                result
            }
            Err(e) => {
                tx.rollback().await.ok();
                return Err(e);
            }
        };

        timer.observe_duration();

        SALES_TOTAL
            .with_label_values(&[result.0.sale.payment_method.as_str()])
            .inc();

        info!(
            sale_id = %result.0.sale.sale_id,
            total = %result.0.sale.total,
            operations = result.1.total_operations,
            "Sale recorded"
        );

        Ok(result)
    }

    // -------------------------------------------------------------------------
    // Sale Reversal
    // -------------------------------------------------------------------------

    /// Revert an active sale: restore stock, flip its status and retract its
    /// contribution from the day's register.
    ///
    /// Returns the reverted sale and the adjusted register, or `None` when no
    /// register was linked to the sale (the reversal still stands).
    #[instrument(skip(self), fields(user_id = %user_id, sale_id = %sale_id))]
    pub async fn revert_sale(
        &self,
        user_id: Uuid,
        sale_id: Uuid,
    ) -> Result<(SaleWithItems, Option<CashDay>), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["revert_sale"])
            .start_timer();

        let mut tx = self.begin().await?;
        let result = match self.revert_sale_in_tx(&mut tx, user_id, sale_id).await {
            Ok(result) => {
                tx.commit().await.map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
                })?;
                result
            }
            Err(e) => {
                tx.rollback().await.ok();
                return Err(e);
            }
        };

        timer.observe_duration();

        let adjusted = if result.1.is_some() { "yes" } else { "no" };
        SALES_REVERTED_TOTAL.with_label_values(&[adjusted]).inc();

        info!(sale_id = %sale_id, ledger_adjusted = adjusted, "Sale reverted");

        Ok(result)
    }

    // -------------------------------------------------------------------------
    // Close-Out
    // -------------------------------------------------------------------------

    /// Close today's register, computing the expected-vs-counted difference.
    /// One-way: a closed register never reopens.
    #[instrument(skip(self, extra_expenses, supplier_payments), fields(user_id = %user_id))]
    pub async fn close_today(
        &self,
        user_id: Uuid,
        extra_expenses: Vec<ExtraExpense>,
        supplier_payments: Vec<SupplierPayment>,
        final_real: Option<Decimal>,
    ) -> Result<CashDay, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["close_today"])
            .start_timer();

        let day = self.business_today();
        let mut tx = self.begin().await?;
        let closed = match self
            .close_day_in_tx(&mut tx, user_id, day, extra_expenses, supplier_payments, final_real)
            .await
        {
            Ok(closed) => {
                tx.commit().await.map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
                })?;
                closed
            }
            Err(e) => {
                tx.rollback().await.ok();
                return Err(e);
            }
        };

        timer.observe_duration();

        let outcome = match closed.difference {
            Some(d) if d > Decimal::ZERO => "over",
            Some(d) if d < Decimal::ZERO => "short",
            _ => "balanced",
        };
        CASH_DAYS_CLOSED_TOTAL.with_label_values(&[outcome]).inc();

        info!(
            day = %closed.day,
            final_expected = ?closed.final_expected,
            difference = ?closed.difference,
            "Daily cash register closed"
        );

        Ok(closed)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, AppError> {
        self.db.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })
    }

    async fn fetch_day(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> Result<Option<CashDay>, AppError> {
        sqlx::query_as::<_, CashDay>(&format!(
            "SELECT {CASH_DAY_COLUMNS} FROM cash_days WHERE user_id = $1 AND day = $2"
        ))
        .bind(user_id)
        .bind(day)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch daily cash record: {}", e))
        })
    }

    /// Lock the day row for this transaction, creating it empty when absent.
    async fn lock_or_create_day(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        user_id: Uuid,
        day: NaiveDate,
    ) -> Result<CashDay, AppError> {
        sqlx::query(
            r#"
            INSERT INTO cash_days (cash_day_id, user_id, day)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, day) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(day)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create daily cash record: {}", e))
        })?;

        sqlx::query_as::<_, CashDay>(&format!(
            "SELECT {CASH_DAY_COLUMNS} FROM cash_days WHERE user_id = $1 AND day = $2 FOR UPDATE"
        ))
        .bind(user_id)
        .bind(day)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to lock daily cash record: {}", e))
        })
    }

    /// Create the day row seeded from the day's active sales. Returns `None`
    /// when another request created it concurrently.
    async fn create_day_in_tx(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        user_id: Uuid,
        day: NaiveDate,
    ) -> Result<Option<CashDay>, AppError> {
        let (start, end) = day_bounds_utc(day, self.utc_offset);
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT sale_id, user_id, sold_utc, payment_method, total, status, reverted_utc
            FROM sales
            WHERE user_id = $1 AND status = 'active' AND sold_utc >= $2 AND sold_utc < $3
            ORDER BY sold_utc
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to scan sales: {}", e)))?;

        let total_sales_amount: Decimal = sales.iter().map(|s| s.total).sum();
        let total_operations = sales.len() as i32;

        let inserted = sqlx::query_as::<_, CashDay>(&format!(
            r#"
            INSERT INTO cash_days (cash_day_id, user_id, day, total_sales_amount, total_operations)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, day) DO NOTHING
            RETURNING {CASH_DAY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(day)
        .bind(total_sales_amount)
        .bind(total_operations)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create daily cash record: {}", e))
        })?;

        let Some(cash_day) = inserted else {
            return Ok(None);
        };

        for (position, sale) in sales.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cash_day_sales (cash_day_id, sale_id, position)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(cash_day.cash_day_id)
            .bind(sale.sale_id)
            .bind(position as i32)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to link sale to day: {}", e))
            })?;
        }

        info!(
            day = %day,
            total_sales_amount = %cash_day.total_sales_amount,
            total_operations = cash_day.total_operations,
            "Daily cash record created"
        );

        Ok(Some(cash_day))
    }

    async fn record_sale_in_tx(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        user_id: Uuid,
        input: &NewSale,
        day: NaiveDate,
    ) -> Result<(SaleWithItems, CashDay), AppError> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (sale_id, user_id, payment_method, total)
            VALUES ($1, $2, $3, $4)
            RETURNING sale_id, user_id, sold_utc, payment_method, total, status, reverted_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&input.payment_method)
        .bind(input.total)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create sale: {}", e)))?;

        let mut items = Vec::with_capacity(input.items.len());
        for (sort_order, item) in input.items.iter().enumerate() {
            let display_name = match item.product_id {
                Some(product_id) => {
                    let product: Option<(String, i32)> = sqlx::query_as(
                        r#"
                        SELECT name, stock FROM products
                        WHERE product_id = $1 AND user_id = $2
                        FOR UPDATE
                        "#,
                    )
                    .bind(product_id)
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!("Failed to load product: {}", e))
                    })?;

                    let (name, stock) = product.ok_or_else(|| {
                        AppError::BadRequest(anyhow::anyhow!(
                            "Line item references an unknown product"
                        ))
                    })?;

                    if stock < item.quantity {
                        return Err(AppError::BadRequest(anyhow::anyhow!(
                            "Insufficient stock for '{}'",
                            name
                        )));
                    }

                    sqlx::query(
                        r#"
                        UPDATE products
                        SET stock = stock - $3, updated_utc = NOW()
                        WHERE product_id = $1 AND user_id = $2
                        "#,
                    )
                    .bind(product_id)
                    .bind(user_id)
                    .bind(item.quantity)
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!("Failed to adjust stock: {}", e))
                    })?;

                    item.name.clone().filter(|n| !n.is_empty()).unwrap_or(name)
                }
                None => item.name.clone().unwrap_or_default(),
            };

            let sale_item = sqlx::query_as::<_, SaleItem>(
                r#"
                INSERT INTO sale_items (sale_item_id, sale_id, user_id, product_id, display_name, quantity, unit_price, sort_order)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING sale_item_id, sale_id, product_id, display_name, quantity, unit_price, sort_order
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(sale.sale_id)
            .bind(user_id)
            .bind(item.product_id)
            .bind(&display_name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(sort_order as i32)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to create sale item: {}", e))
            })?;

            items.push(sale_item);
        }

        let cash_day = self.lock_or_create_day(tx, user_id, day).await?;
        if cash_day.status == CashDayStatus::Closed.as_str() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "The daily cash register for today is already closed"
            )));
        }

        let updated = sqlx::query_as::<_, CashDay>(&format!(
            r#"
            UPDATE cash_days
            SET total_sales_amount = total_sales_amount + $2,
                total_operations = total_operations + 1
            WHERE cash_day_id = $1
            RETURNING {CASH_DAY_COLUMNS}
            "#
        ))
        .bind(cash_day.cash_day_id)
        .bind(sale.total)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update daily cash record: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO cash_day_sales (cash_day_id, sale_id, position)
            VALUES ($1, $2, COALESCE((SELECT MAX(position) + 1 FROM cash_day_sales WHERE cash_day_id = $1), 0))
            "#,
        )
        .bind(cash_day.cash_day_id)
        .bind(sale.sale_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to link sale to day: {}", e))
        })?;

        Ok((SaleWithItems { sale, items }, updated))
    }

    async fn revert_sale_in_tx(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        user_id: Uuid,
        sale_id: Uuid,
    ) -> Result<(SaleWithItems, Option<CashDay>), AppError> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT sale_id, user_id, sold_utc, payment_method, total, status, reverted_utc
            FROM sales
            WHERE sale_id = $1 AND user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(sale_id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load sale: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sale not found")))?;

        if sale.status == SaleStatus::Reverted.as_str() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Sale has already been reverted"
            )));
        }

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT sale_item_id, sale_id, product_id, display_name, quantity, unit_price, sort_order
            FROM sale_items
            WHERE sale_id = $1
            ORDER BY sort_order
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load sale items: {}", e)))?;

        for item in &items {
            let Some(product_id) = item.product_id else {
                continue;
            };
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock + $3, updated_utc = NOW()
                WHERE product_id = $1 AND user_id = $2
                "#,
            )
            .bind(product_id)
            .bind(user_id)
            .bind(item.quantity)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to restore stock: {}", e))
            })?;

            if result.rows_affected() == 0 {
                warn!(product_id = %product_id, "Product missing during reversal; stock not restored");
            }
        }

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales
            SET status = 'reverted', reverted_utc = NOW()
            WHERE sale_id = $1
            RETURNING sale_id, user_id, sold_utc, payment_method, total, status, reverted_utc
            "#,
        )
        .bind(sale_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to revert sale: {}", e)))?;

        let linked = sqlx::query_as::<_, CashDay>(&format!(
            r#"
            SELECT {columns}
            FROM cash_days cd
            JOIN cash_day_sales cds ON cds.cash_day_id = cd.cash_day_id
            WHERE cds.sale_id = $1
            FOR UPDATE OF cd
            "#,
            columns = cash_day_columns_prefixed("cd")
        ))
        .bind(sale_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load daily cash record: {}", e))
        })?;

        let adjusted = match linked {
            None => {
                warn!(sale_id = %sale_id, "No daily cash record linked to sale; totals not adjusted");
                None
            }
            Some(cash_day) => {
                if cash_day.status == CashDayStatus::Closed.as_str() {
                    return Err(AppError::Conflict(anyhow::anyhow!(
                        "The daily cash register for that day is already closed"
                    )));
                }

                let new_total = (cash_day.total_sales_amount - sale.total).max(Decimal::ZERO);
                let new_operations = (cash_day.total_operations - 1).max(0);

                let updated = sqlx::query_as::<_, CashDay>(&format!(
                    r#"
                    UPDATE cash_days
                    SET total_sales_amount = $2, total_operations = $3
                    WHERE cash_day_id = $1
                    RETURNING {CASH_DAY_COLUMNS}
                    "#
                ))
                .bind(cash_day.cash_day_id)
                .bind(new_total)
                .bind(new_operations)
                .fetch_one(&mut **tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!(
                        "Failed to update daily cash record: {}",
                        e
                    ))
                })?;

                sqlx::query(
                    r#"
                    DELETE FROM cash_day_sales
                    WHERE cash_day_id = $1 AND sale_id = $2
                    "#,
                )
                .bind(cash_day.cash_day_id)
                .bind(sale_id)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to unlink sale: {}", e))
                })?;

                Some(updated)
            }
        };

        Ok((SaleWithItems { sale, items }, adjusted))
    }

    async fn close_day_in_tx(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        user_id: Uuid,
        day: NaiveDate,
        extra_expenses: Vec<ExtraExpense>,
        supplier_payments: Vec<SupplierPayment>,
        final_real: Option<Decimal>,
    ) -> Result<CashDay, AppError> {
        let cash_day = sqlx::query_as::<_, CashDay>(&format!(
            "SELECT {CASH_DAY_COLUMNS} FROM cash_days WHERE user_id = $1 AND day = $2 FOR UPDATE"
        ))
        .bind(user_id)
        .bind(day)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load daily cash record: {}", e))
        })?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("No daily cash register exists for today"))
        })?;

        if cash_day.status == CashDayStatus::Closed.as_str() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "The daily cash register for today has already been closed"
            )));
        }

        let totals = compute_close(
            cash_day.total_sales_amount,
            &extra_expenses,
            &supplier_payments,
            final_real,
        );

        let closed = sqlx::query_as::<_, CashDay>(&format!(
            r#"
            UPDATE cash_days
            SET status = 'closed',
                extra_expenses = $2,
                supplier_payments = $3,
                total_out = $4,
                final_expected = $5,
                final_real = $6,
                difference = $7,
                closed_utc = NOW()
            WHERE cash_day_id = $1
            RETURNING {CASH_DAY_COLUMNS}
            "#
        ))
        .bind(cash_day.cash_day_id)
        .bind(sqlx::types::Json(&extra_expenses))
        .bind(sqlx::types::Json(&supplier_payments))
        .bind(totals.total_out)
        .bind(totals.final_expected)
        .bind(totals.final_real)
        .bind(totals.difference)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to close daily cash record: {}", e))
        })?;

        Ok(closed)
    }

    /// Resolve the register's sales in accretion order.
    async fn with_sales(&self, cash_day: CashDay) -> Result<CashDayWithSales, AppError> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT s.sale_id, s.user_id, s.sold_utc, s.payment_method, s.total, s.status, s.reverted_utc
            FROM sales s
            JOIN cash_day_sales cds ON cds.sale_id = s.sale_id
            WHERE cds.cash_day_id = $1
            ORDER BY cds.position
            "#,
        )
        .bind(cash_day.cash_day_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load day sales: {}", e)))?;

        let sales = self.db.attach_items(sales).await?;

        Ok(CashDayWithSales { cash_day, sales })
    }
}

fn cash_day_columns_prefixed(alias: &str) -> String {
    CASH_DAY_COLUMNS
        .split(',')
        .map(|column| format!("{}.{}", alias, column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The calendar day a UTC instant belongs to under the configured offset.
fn business_day(now: DateTime<Utc>, utc_offset: Duration) -> NaiveDate {
    (now + utc_offset).date_naive()
}

/// UTC half-open window [start, end) covering one business day.
fn day_bounds_utc(day: NaiveDate, utc_offset: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc() - utc_offset;
    (start, start + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn business_day_shifts_with_negative_offset() {
        // 01:00 UTC is still the previous evening at UTC-3.
        let instant = Utc.with_ymd_and_hms(2026, 8, 5, 1, 0, 0).unwrap();
        let day = business_day(instant, Duration::minutes(-180));
        assert_eq!(day, NaiveDate::from_ymd_opt(2026, 8, 4).unwrap());
    }

    #[test]
    fn business_day_matches_utc_with_zero_offset() {
        let instant = Utc.with_ymd_and_hms(2026, 8, 5, 23, 59, 59).unwrap();
        let day = business_day(instant, Duration::zero());
        assert_eq!(day, NaiveDate::from_ymd_opt(2026, 8, 5).unwrap());
    }

    #[test]
    fn day_bounds_cover_exactly_one_day() {
        let day = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
        let (start, end) = day_bounds_utc(day, Duration::minutes(-180));

        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 4, 3, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 8, 5, 3, 0, 0).unwrap());
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn instants_within_bounds_map_back_to_the_same_day() {
        let offset = Duration::minutes(-180);
        let day = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
        let (start, end) = day_bounds_utc(day, offset);

        assert_eq!(business_day(start, offset), day);
        assert_eq!(business_day(end - Duration::seconds(1), offset), day);
        assert_ne!(business_day(end, offset), day);
    }
}
