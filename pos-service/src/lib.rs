pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Json, Router,
};
use pos_core::error::AppError;
use pos_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::PosConfig;
use crate::services::{CashRegister, Database, JwtService};

#[derive(Clone)]
pub struct AppState {
    pub config: PosConfig,
    pub db: Database,
    pub jwt: JwtService,
    pub cash: CashRegister,
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users/me", get(handlers::auth::me))
        .route(
            "/products",
            get(handlers::product::list_products).post(handlers::product::create_product),
        )
        .route(
            "/products/:id",
            get(handlers::product::get_product)
                .put(handlers::product::update_product)
                .delete(handlers::product::delete_product),
        )
        .route(
            "/clients",
            get(handlers::client::list_clients).post(handlers::client::create_client),
        )
        .route(
            "/clients/:id",
            put(handlers::client::update_client).delete(handlers::client::delete_client),
        )
        .route(
            "/suppliers",
            get(handlers::supplier::list_suppliers).post(handlers::supplier::create_supplier),
        )
        .route(
            "/suppliers/:id",
            put(handlers::supplier::update_supplier).delete(handlers::supplier::delete_supplier),
        )
        .route(
            "/sales",
            get(handlers::sale::list_sales).post(handlers::sale::create_sale),
        )
        .route("/sales/:id", get(handlers::sale::get_sale))
        .route("/sales/:id/revert", post(handlers::sale::revert_sale))
        .route("/daily-cash/today", get(handlers::daily_cash::today))
        .route("/daily-cash/days", get(handlers::daily_cash::closed_days))
        .route("/daily-cash/close", post(handlers::daily_cash::close))
        .route("/daily-cash/:date", get(handlers::daily_cash::by_date))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .merge(protected)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .filter_map(|origin| match origin.parse::<HeaderValue>() {
                            Ok(value) => Some(value),
                            Err(e) => {
                                tracing::error!("Invalid CORS origin '{}': {}", origin, e);
                                None
                            }
                        })
                        .collect::<Vec<HeaderValue>>(),
                )
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

/// Service health check
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "checks": {
            "postgres": "up"
        }
    })))
}

/// Readiness check endpoint for orchestration probes.
pub async fn readiness_check(State(state): State<AppState>) -> Result<(), AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        e
    })
}
