//! Integration tests for the sales order cache.
//!
//! These tests require a `PostgreSQL` database in
//! `ORDER_DESK_TEST_DATABASE_URL` and must run on one thread.

#![allow(clippy::unwrap_used)]

use chrono::{NaiveDate, TimeZone, Utc};
use order_desk_core::{OrderStatus, OrderType, SalesOrderKey};
use order_desk_integration_tests::{create_credential, test_pool};
use order_desk_web::db::{CacheFilter, SalesOrderCache};
use order_desk_web::models::{CachedSalesOrder, CachedSalesOrderLine};
use rust_decimal::Decimal;

fn order(order_type: &str, nbr: &str, customer: &str, day: u32) -> CachedSalesOrder {
    CachedSalesOrder {
        key: SalesOrderKey::parse(order_type, nbr).unwrap(),
        erp_id: None,
        customer_id: customer.to_string(),
        customer_order: None,
        description: Some(format!("Order for {customer}")),
        status: OrderStatus::Open,
        hold: false,
        order_date: NaiveDate::from_ymd_opt(2026, 3, day),
        requested_on: None,
        currency_id: Some("USD".to_string()),
        order_total: Decimal::new(1000, 2),
        ordered_qty: Decimal::from(2),
        last_modified: Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).single(),
        lines: Vec::new(),
    }
}

fn line(line_nbr: i32, item: &str) -> CachedSalesOrderLine {
    CachedSalesOrderLine {
        line_nbr,
        erp_id: None,
        inventory_id: item.to_string(),
        description: None,
        warehouse_id: Some("WHOLESALE".to_string()),
        uom: Some("EA".to_string()),
        quantity: Decimal::ONE,
        unit_price: Decimal::new(500, 2),
        extended_price: Decimal::new(500, 2),
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDER_DESK_TEST_DATABASE_URL)"]
async fn test_upsert_replaces_lines() {
    let pool = test_pool().await;
    let credential = create_credential(&pool, "Demo", "https://erp.example.com").await;
    let cache = SalesOrderCache::new(&pool);

    let mut so = order("SO", "000001", "ABARTENDE", 2);
    so.lines = vec![line(2, "AALEGO500"), line(1, "CONGRILL")];
    let first_id = cache.upsert(credential.id, &so).await.unwrap();

    let stored = cache.get(credential.id, &so.key).await.unwrap().unwrap();
    assert_eq!(stored.id, first_id);
    let numbers: Vec<i32> = stored.order.lines.iter().map(|l| l.line_nbr).collect();
    assert_eq!(numbers, vec![1, 2]);

    so.lines = vec![line(1, "CONGRILL")];
    so.status = OrderStatus::Completed;
    let second_id = cache.upsert(credential.id, &so).await.unwrap();
    assert_eq!(second_id, first_id);

    let stored = cache.get(credential.id, &so.key).await.unwrap().unwrap();
    assert_eq!(stored.order.status, OrderStatus::Completed);
    assert_eq!(stored.order.lines.len(), 1);
    assert_eq!(stored.order.lines[0].inventory_id, "CONGRILL");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDER_DESK_TEST_DATABASE_URL)"]
async fn test_list_filters_and_scopes_by_credential() {
    let pool = test_pool().await;
    let demo = create_credential(&pool, "Demo", "https://erp.example.com").await;
    let other = create_credential(&pool, "Other", "https://other.example.com").await;
    let cache = SalesOrderCache::new(&pool);

    let mut quote = order("QT", "000010", "COFFEESHOP", 5);
    quote.status = OrderStatus::OnHold;
    cache.upsert(demo.id, &order("SO", "000001", "ABARTENDE", 2)).await.unwrap();
    cache.upsert(demo.id, &quote).await.unwrap();
    cache.upsert(other.id, &order("SO", "000001", "ELSEWHERE", 3)).await.unwrap();

    let all = cache.list(demo.id, &CacheFilter::default()).await.unwrap();
    let keys: Vec<String> = all.iter().map(|s| s.order.key.to_string()).collect();
    assert_eq!(keys, vec!["QT 000010", "SO 000001"]);

    let quotes = cache
        .list(
            demo.id,
            &CacheFilter {
                order_type: Some(OrderType::Quote),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(quotes.len(), 1);

    let on_hold = cache
        .list(
            demo.id,
            &CacheFilter {
                status: Some(OrderStatus::OnHold),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(on_hold.len(), 1);
    assert_eq!(on_hold[0].order.customer_id, "COFFEESHOP");

    let searched = cache
        .list(
            demo.id,
            &CacheFilter {
                search: Some("bartende".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].order.key.order_nbr, "000001");

    let other_orders = cache.list(other.id, &CacheFilter::default()).await.unwrap();
    assert_eq!(other_orders.len(), 1);
    assert_eq!(other_orders[0].order.customer_id, "ELSEWHERE");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDER_DESK_TEST_DATABASE_URL)"]
async fn test_search_treats_wildcards_literally() {
    let pool = test_pool().await;
    let credential = create_credential(&pool, "Demo", "https://erp.example.com").await;
    let cache = SalesOrderCache::new(&pool);

    cache
        .upsert(credential.id, &order("SO", "000001", "ABARTENDE", 2))
        .await
        .unwrap();

    let found = cache
        .list(
            credential.id,
            &CacheFilter {
                search: Some("%".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDER_DESK_TEST_DATABASE_URL)"]
async fn test_snapshot_apply_and_remove() {
    let pool = test_pool().await;
    let credential = create_credential(&pool, "Demo", "https://erp.example.com").await;
    let cache = SalesOrderCache::new(&pool);

    let kept = order("SO", "000001", "ABARTENDE", 2);
    let dropped = order("SO", "000002", "COFFEESHOP", 3);
    cache
        .apply(credential.id, &[kept.clone(), dropped.clone()], &[])
        .await
        .unwrap();

    let snapshot = cache.snapshot(credential.id).await.unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.get(&kept.key), Some(&kept.last_modified));

    let added = order("SO", "000003", "DINER", 4);
    cache
        .apply(credential.id, &[added.clone()], &[dropped.key.clone()])
        .await
        .unwrap();

    let snapshot = cache.snapshot(credential.id).await.unwrap();
    assert!(snapshot.contains_key(&kept.key));
    assert!(snapshot.contains_key(&added.key));
    assert!(!snapshot.contains_key(&dropped.key));

    assert!(cache.remove(credential.id, &kept.key).await.unwrap());
    assert!(!cache.remove(credential.id, &kept.key).await.unwrap());
    assert!(cache.get(credential.id, &kept.key).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDER_DESK_TEST_DATABASE_URL)"]
async fn test_deleting_credential_drops_its_orders() {
    let pool = test_pool().await;
    let credential = create_credential(&pool, "Demo", "https://erp.example.com").await;
    let cache = SalesOrderCache::new(&pool);

    let so = order("SO", "000001", "ABARTENDE", 2);
    cache.upsert(credential.id, &so).await.unwrap();

    order_desk_web::db::CredentialRepository::new(&pool)
        .delete(credential.id)
        .await
        .unwrap();

    assert!(cache.get(credential.id, &so.key).await.unwrap().is_none());
}
