use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use pos_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::client::{CreateClientRequest, UpdateClientRequest},
    middleware::AuthUser,
    models::{CreateClient, UpdateClient},
    utils::ValidatedJson,
    AppState,
};

pub async fn list_clients(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let clients = state.db.list_clients(user.0.user_id()?).await?;
    Ok(Json(clients))
}

pub async fn create_client(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateClientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let client = state
        .db
        .create_client(&CreateClient {
            user_id: user.0.user_id()?,
            name: req.name,
            email: req.email,
            phone: req.phone,
            notes: req.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    user: AuthUser,
    Path(client_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateClientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let client = state
        .db
        .update_client(
            user.0.user_id()?,
            client_id,
            &UpdateClient {
                name: req.name,
                email: req.email,
                phone: req.phone,
                notes: req.notes,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client not found")))?;

    Ok(Json(client))
}

pub async fn delete_client(
    State(state): State<AppState>,
    user: AuthUser,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_client(user.0.user_id()?, client_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Client not found")));
    }

    Ok(Json(serde_json::json!({ "message": "Client deleted" })))
}
