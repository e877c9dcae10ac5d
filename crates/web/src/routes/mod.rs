//! HTTP route handlers for Order Desk.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                           - Liveness check
//! GET  /health/ready                     - Readiness check (database)
//! GET  /                                 - Redirect to /sales-orders
//!
//! # Credentials
//! GET  /credentials                      - Credential list
//! GET  /credentials/new                  - New credential form
//! POST /credentials                      - Create credential
//! GET  /credentials/{id}/edit            - Edit credential form
//! POST /credentials/{id}                 - Update credential
//! POST /credentials/{id}/select          - Make credential the selected one
//! POST /credentials/{id}/test            - Test login
//! POST /credentials/{id}/delete          - Delete credential
//!
//! # Sales orders (selected credential)
//! GET  /sales-orders                     - Cached order list
//! POST /sales-orders/refresh             - Pull orders from the ERP
//! GET  /sales-orders/new                 - Create form
//! POST /sales-orders                     - Create order
//! GET  /sales-orders/{type}/{nbr}        - Order details
//! GET  /sales-orders/{type}/{nbr}/edit   - Edit form
//! POST /sales-orders/{type}/{nbr}        - Update order
//! GET  /sales-orders/{type}/{nbr}/delete - Delete confirmation
//! POST /sales-orders/{type}/{nbr}/delete - Delete order
//! ```

pub mod credentials;
pub mod sales_orders;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Redirect,
    routing::get,
};
use serde::Deserialize;

use crate::state::AppState;

/// `?success=` / `?error=` flash codes carried across redirects.
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Build the application router (without middleware layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/", get(|| async { Redirect::to("/sales-orders") }))
        .merge(credentials::router())
        .merge(sales_orders::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
