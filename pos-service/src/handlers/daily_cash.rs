use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use pos_core::error::AppError;

use crate::{
    dtos::daily_cash::{CloseCashRequest, CloseCashResponse},
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

/// Get today's register, creating it if absent.
pub async fn today(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let day = state.cash.get_or_create_today(user.0.user_id()?).await?;
    Ok(Json(day))
}

/// List closed registers, most recent day first.
pub async fn closed_days(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let days = state.cash.closed_days(user.0.user_id()?).await?;
    Ok(Json(days))
}

/// Fetch the register for an explicit ISO-8601 date.
pub async fn by_date(
    State(state): State<AppState>,
    user: AuthUser,
    Path(date): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let day = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid date: {}", date)))?;

    let record = state.cash.day_by_date(user.0.user_id()?, day).await?;
    Ok(Json(record))
}

/// Close today's register.
pub async fn close(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CloseCashRequest>,
) -> Result<impl IntoResponse, AppError> {
    let closed = state
        .cash
        .close_today(
            user.0.user_id()?,
            req.extra_expenses,
            req.supplier_payments,
            req.final_real,
        )
        .await?;

    Ok(Json(CloseCashResponse {
        message: "Daily cash register closed".to_string(),
        data: closed,
    }))
}
