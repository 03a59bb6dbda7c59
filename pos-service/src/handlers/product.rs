use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use pos_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::product::{CreateProductRequest, UpdateProductRequest},
    middleware::AuthUser,
    models::{CreateProduct, UpdateProduct},
    utils::ValidatedJson,
    AppState,
};

pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let products = state.db.list_products(user.0.user_id()?).await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = state
        .db
        .get_product(user.0.user_id()?, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.0.require_admin()?;

    let product = state
        .db
        .create_product(&CreateProduct {
            user_id: user.0.user_id()?,
            name: req.name,
            category: req.category,
            price: req.price,
            cost: req.cost,
            stock: req.stock,
            barcode: req.barcode,
            description: req.description,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.0.require_admin()?;

    let product = state
        .db
        .update_product(
            user.0.user_id()?,
            product_id,
            &UpdateProduct {
                name: req.name,
                category: req.category,
                price: req.price,
                cost: req.cost,
                stock: req.stock,
                barcode: req.barcode,
                description: req.description,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    user.0.require_admin()?;

    let deleted = state.db.delete_product(user.0.user_id()?, product_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Product not found")));
    }

    Ok(Json(serde_json::json!({ "message": "Product deleted" })))
}
