use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use pos_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::supplier::{CreateSupplierRequest, UpdateSupplierRequest},
    middleware::AuthUser,
    models::{CreateSupplier, UpdateSupplier},
    utils::ValidatedJson,
    AppState,
};

pub async fn list_suppliers(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let suppliers = state.db.list_suppliers(user.0.user_id()?).await?;
    Ok(Json(suppliers))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateSupplierRequest>,
) -> Result<impl IntoResponse, AppError> {
    let supplier = state
        .db
        .create_supplier(&CreateSupplier {
            user_id: user.0.user_id()?,
            name: req.name,
            contact_name: req.contact_name,
            phone: req.phone,
            email: req.email,
            notes: req.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    user: AuthUser,
    Path(supplier_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateSupplierRequest>,
) -> Result<impl IntoResponse, AppError> {
    let supplier = state
        .db
        .update_supplier(
            user.0.user_id()?,
            supplier_id,
            &UpdateSupplier {
                name: req.name,
                contact_name: req.contact_name,
                phone: req.phone,
                email: req.email,
                notes: req.notes,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Supplier not found")))?;

    Ok(Json(supplier))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    user: AuthUser,
    Path(supplier_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state
        .db
        .delete_supplier(user.0.user_id()?, supplier_id)
        .await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Supplier not found")));
    }

    Ok(Json(serde_json::json!({ "message": "Supplier deleted" })))
}
