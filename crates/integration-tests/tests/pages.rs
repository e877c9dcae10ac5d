//! Page tests against a running Order Desk server.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The server running (cargo run -p order-desk-web)
//!
//! They only read pages and submit forms that fail validation, so they leave
//! the database untouched.

#![allow(clippy::unwrap_used)]

use order_desk_integration_tests::base_url;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};

fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_health_endpoints() {
    let base = base_url();

    let resp = client().get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client()
        .get(format!("{base}/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_root_redirects_to_sales_orders() {
    let resp = client()
        .get(format!("{}/", base_url()))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/sales-orders");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_credentials_page_renders() {
    let resp = client()
        .get(format!("{}/credentials", base_url()))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("ERP credentials"));
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_sales_orders_page_renders_or_asks_for_credential() {
    let resp = client()
        .get(format!("{}/sales-orders", base_url()))
        .send()
        .await
        .unwrap();

    match resp.status() {
        StatusCode::OK => {
            let body = resp.text().await.unwrap();
            assert!(body.contains("Sales orders"));
        }
        StatusCode::SEE_OTHER => {
            assert_eq!(
                resp.headers()["location"],
                "/credentials?error=no_credential"
            );
        }
        other => panic!("unexpected status {other}"),
    }
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_invalid_credential_form_is_rejected() {
    let resp = client()
        .post(format!("{}/credentials", base_url()))
        .form(&[
            ("name", "Broken"),
            ("base_url", "not a url"),
            ("username", "admin"),
            ("password", "123"),
            ("company", "Company"),
            ("endpoint_name", "Default"),
            ("endpoint_version", "20.200.001"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Site URL is not a valid URL"));
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_unknown_order_type_in_path_is_not_found() {
    let resp = client()
        .get(format!("{}/sales-orders/S%2FO/000123", base_url()))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
