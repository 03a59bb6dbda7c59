//! Request/response payloads for pos-service.

pub mod auth;
pub mod client;
pub mod daily_cash;
pub mod product;
pub mod sale;
pub mod supplier;

use serde::Serialize;

/// Minimal error payload used by the auth middleware and extractors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
