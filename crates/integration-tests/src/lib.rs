//! Integration tests for Order Desk.
//!
//! # Running Tests
//!
//! ```bash
//! # Database tests (migrations are applied automatically)
//! ORDER_DESK_TEST_DATABASE_URL=postgres://localhost/order_desk_test \
//!     cargo test -p order-desk-integration-tests -- --ignored --test-threads=1
//!
//! # Page tests also need a running server
//! ORDER_DESK_BASE_URL=http://localhost:3002 \
//!     cargo test -p order-desk-integration-tests --test pages -- --ignored
//! ```
//!
//! Database tests truncate the Order Desk tables, so point them at a
//! throwaway database and run them on one thread.
//!
//! # Test Categories
//!
//! - `credentials` - Credential repository against `PostgreSQL`
//! - `sales_order_cache` - Cache repository against `PostgreSQL`
//! - `sync_flow` - Sync service against `PostgreSQL` and a mock ERP
//! - `pages` - HTTP pages of a running server

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use order_desk_web::db::{self, CredentialParams, CredentialRepository};
use order_desk_web::models::ErpCredential;
use secrecy::ExposeSecret;
use sqlx::PgPool;

/// Base URL of a running Order Desk server.
#[must_use]
pub fn base_url() -> String {
    std::env::var("ORDER_DESK_BASE_URL").unwrap_or_else(|_| "http://localhost:3002".to_string())
}

/// Connect to the test database, apply migrations and empty every table.
pub async fn test_pool() -> PgPool {
    let url = order_desk_web::config::get_database_url("ORDER_DESK_TEST_DATABASE_URL")
        .expect("ORDER_DESK_TEST_DATABASE_URL or DATABASE_URL must be set");
    let pool = PgPool::connect(url.expose_secret())
        .await
        .expect("Failed to connect to test database");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    sqlx::query("TRUNCATE sales_order_lines, sales_orders, erp_credentials RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to reset tables");
    pool
}

/// Credential form values pointing at `base_url`.
#[must_use]
pub fn credential_params<'a>(name: &'a str, base_url: &'a str) -> CredentialParams<'a> {
    CredentialParams {
        name,
        base_url,
        username: "admin",
        password: "123",
        company: "Company",
        branch: None,
        endpoint_name: "Default",
        endpoint_version: "20.200.001",
    }
}

/// Insert a credential and return it.
pub async fn create_credential(pool: &PgPool, name: &str, base_url: &str) -> ErpCredential {
    CredentialRepository::new(pool)
        .create(&credential_params(name, base_url))
        .await
        .expect("Failed to create credential")
}
