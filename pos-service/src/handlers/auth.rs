use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use pos_core::error::AppError;

use crate::{
    dtos::auth::{AuthResponse, LoginRequest, RegisterRequest},
    middleware::AuthUser,
    models::{CreateUser, UserRole},
    utils::{hash_password, verify_password, Password, PasswordHashString, ValidatedJson},
    AppState,
};

/// Create an account and issue an access token.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let password_hash = hash_password(&Password::new(req.password))
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Password hashing failed: {}", e)))?;

    // The business owner registering the account defaults to admin.
    let role = match req.role.as_deref() {
        None | Some("admin") => UserRole::Admin,
        Some("employee") => UserRole::Employee,
        Some(other) => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unknown role: {}",
                other
            )))
        }
    };

    let user = state
        .db
        .create_user(&CreateUser {
            name: req.name,
            email: req.email.to_lowercase(),
            password_hash: password_hash.into_string(),
            role,
        })
        .await?;

    let token = state.jwt.generate_access_token(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.sanitized(),
        }),
    ))
}

/// Exchange credentials for an access token.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .db
        .find_user_by_email(&req.email.to_lowercase())
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid email or password")))?;

    verify_password(
        &Password::new(req.password),
        &PasswordHashString::new(user.password_hash.clone()),
    )
    .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid email or password")))?;

    let token = state.jwt.generate_access_token(&user)?;

    Ok(Json(AuthResponse {
        token,
        user: user.sanitized(),
    }))
}

/// Return the authenticated user's profile.
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .db
        .find_user_by_id(user.0.user_id()?)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(user.sanitized()))
}
