use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use pos_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::sale::{CreateSaleRequest, CreateSaleResponse, RevertSaleResponse},
    middleware::AuthUser,
    models::{NewSale, NewSaleItem},
    utils::ValidatedJson,
    AppState,
};

pub async fn list_sales(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let sales = state.db.list_sales(user.0.user_id()?).await?;
    Ok(Json(sales))
}

pub async fn get_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let sale = state
        .db
        .get_sale(user.0.user_id()?, sale_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sale not found")))?;

    Ok(Json(sale))
}

/// Record a sale and fold it into today's register.
pub async fn create_sale(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateSaleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = NewSale {
        items: req
            .products
            .into_iter()
            .map(|p| NewSaleItem {
                product_id: p.product,
                name: p.name,
                quantity: p.quantity,
                unit_price: p.price,
            })
            .collect(),
        payment_method: req.payment_method,
        total: req.total,
    };

    let (sale, daily_cash) = state.cash.record_sale(user.0.user_id()?, &input).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSaleResponse {
            message: "Sale recorded".to_string(),
            sale,
            daily_cash,
        }),
    ))
}

/// Revert a sale, restoring stock and retracting its register contribution.
pub async fn revert_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (sale, adjusted) = state.cash.revert_sale(user.0.user_id()?, sale_id).await?;

    let message = if adjusted.is_some() {
        "Sale reverted".to_string()
    } else {
        "Sale reverted; no daily cash record was linked to this sale".to_string()
    };

    Ok(Json(RevertSaleResponse { message, sale }))
}
