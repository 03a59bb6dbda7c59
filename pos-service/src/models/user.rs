//! User account model for pos-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account role. Admins manage the catalog; employees only sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Employee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Employee => "employee",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "employee" => UserRole::Employee,
            _ => UserRole::Admin,
        }
    }
}

/// Account record. Never serialized directly; use [`User::sanitized`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_utc: DateTime<Utc>,
}

/// Account projection safe to return to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_utc: DateTime<Utc>,
}

impl User {
    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser {
            user_id: self.user_id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            created_utc: self.created_utc,
        }
    }

    pub fn role(&self) -> UserRole {
        UserRole::from_string(&self.role)
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}
