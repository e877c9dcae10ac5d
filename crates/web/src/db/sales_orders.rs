//! Local sales order cache.
//!
//! Rows are partitioned by credential so that switching the selected site
//! never shows another site's orders. Every write replaces an order's lines
//! wholesale; the ERP is the source of truth for line numbering.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use order_desk_core::{CredentialId, OrderStatus, OrderType, SalesOrderId, SalesOrderKey};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;
use uuid::Uuid;

use super::RepositoryError;
use crate::models::{CachedSalesOrder, CachedSalesOrderLine, StoredSalesOrder};

/// Upper bound on rows returned by [`SalesOrderCache::list`].
pub const MAX_LIST_LIMIT: i64 = 500;

// =============================================================================
// Types
// =============================================================================

/// Filters for the cached order list.
#[derive(Debug, Clone, Default)]
pub struct CacheFilter {
    /// Only orders in this status.
    pub status: Option<OrderStatus>,
    /// Only orders of this type.
    pub order_type: Option<OrderType>,
    /// Case-insensitive match on order number, customer or description.
    pub search: Option<String>,
    /// Maximum rows; clamped to [`MAX_LIST_LIMIT`].
    pub limit: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct SalesOrderRow {
    id: i32,
    credential_id: i32,
    erp_id: Option<Uuid>,
    order_type: String,
    order_nbr: String,
    customer_id: String,
    customer_order: Option<String>,
    description: Option<String>,
    status: String,
    hold: bool,
    order_date: Option<NaiveDate>,
    requested_on: Option<NaiveDate>,
    currency_id: Option<String>,
    order_total: Decimal,
    ordered_qty: Decimal,
    erp_last_modified: Option<DateTime<Utc>>,
    synced_at: DateTime<Utc>,
}

impl SalesOrderRow {
    fn into_stored(
        self,
        lines: Vec<CachedSalesOrderLine>,
    ) -> Result<StoredSalesOrder, RepositoryError> {
        let key = SalesOrderKey::parse(&self.order_type, &self.order_nbr).map_err(|e| {
            RepositoryError::DataCorruption(format!("sales order {}: {e}", self.id))
        })?;

        Ok(StoredSalesOrder {
            id: SalesOrderId::new(self.id),
            credential_id: CredentialId::new(self.credential_id),
            synced_at: self.synced_at,
            order: CachedSalesOrder {
                key,
                erp_id: self.erp_id,
                customer_id: self.customer_id,
                customer_order: self.customer_order,
                description: self.description,
                status: OrderStatus::from_erp_str(&self.status),
                hold: self.hold,
                order_date: self.order_date,
                requested_on: self.requested_on,
                currency_id: self.currency_id,
                order_total: self.order_total,
                ordered_qty: self.ordered_qty,
                last_modified: self.erp_last_modified,
                lines,
            },
        })
    }
}

#[derive(sqlx::FromRow)]
struct SalesOrderLineRow {
    line_nbr: i32,
    erp_id: Option<Uuid>,
    inventory_id: String,
    description: Option<String>,
    warehouse_id: Option<String>,
    uom: Option<String>,
    quantity: Decimal,
    unit_price: Decimal,
    extended_price: Decimal,
}

impl From<SalesOrderLineRow> for CachedSalesOrderLine {
    fn from(row: SalesOrderLineRow) -> Self {
        Self {
            line_nbr: row.line_nbr,
            erp_id: row.erp_id,
            inventory_id: row.inventory_id,
            description: row.description,
            warehouse_id: row.warehouse_id,
            uom: row.uom,
            quantity: row.quantity,
            unit_price: row.unit_price,
            extended_price: row.extended_price,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    id: i32,
    order_type: String,
    order_nbr: String,
    erp_last_modified: Option<DateTime<Utc>>,
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the cached sales orders of one database.
pub struct SalesOrderCache<'a> {
    pool: &'a PgPool,
}

impl<'a> SalesOrderCache<'a> {
    /// Create a new cache repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List cached order headers, newest order date first.
    ///
    /// Lines are not loaded; `order.lines` is empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored key no longer
    /// parses, or `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        credential_id: CredentialId,
        filter: &CacheFilter,
    ) -> Result<Vec<StoredSalesOrder>, RepositoryError> {
        let limit = filter.limit.unwrap_or(MAX_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let rows = sqlx::query_as::<_, SalesOrderRow>(
            r"
            SELECT id, credential_id, erp_id, order_type, order_nbr, customer_id,
                   customer_order, description, status, hold, order_date,
                   requested_on, currency_id, order_total, ordered_qty,
                   erp_last_modified, synced_at
            FROM sales_orders
            WHERE credential_id = $1
              AND ($2::TEXT IS NULL OR status = $2)
              AND ($3::TEXT IS NULL OR order_type = $3)
              AND ($4::TEXT IS NULL
                   OR order_nbr ILIKE $4
                   OR customer_id ILIKE $4
                   OR COALESCE(description, '') ILIKE $4
                   OR COALESCE(customer_order, '') ILIKE $4)
            ORDER BY order_date DESC NULLS LAST, order_type, order_nbr DESC
            LIMIT $5
            ",
        )
        .bind(credential_id)
        .bind(filter.status.as_ref().map(OrderStatus::as_erp_str))
        .bind(filter.order_type.as_ref().map(OrderType::code))
        .bind(search)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.into_stored(Vec::new()))
            .collect()
    }

    /// Get one cached order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn get(
        &self,
        credential_id: CredentialId,
        key: &SalesOrderKey,
    ) -> Result<Option<StoredSalesOrder>, RepositoryError> {
        let row = sqlx::query_as::<_, SalesOrderRow>(
            r"
            SELECT id, credential_id, erp_id, order_type, order_nbr, customer_id,
                   customer_order, description, status, hold, order_date,
                   requested_on, currency_id, order_total, ordered_qty,
                   erp_last_modified, synced_at
            FROM sales_orders
            WHERE credential_id = $1 AND order_type = $2 AND order_nbr = $3
            ",
        )
        .bind(credential_id)
        .bind(key.order_type.code())
        .bind(&key.order_nbr)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, SalesOrderLineRow>(
            r"
            SELECT line_nbr, erp_id, inventory_id, description, warehouse_id,
                   uom, quantity, unit_price, extended_price
            FROM sales_order_lines
            WHERE sales_order_id = $1
            ORDER BY line_nbr
            ",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?;

        row.into_stored(lines.into_iter().map(Into::into).collect())
            .map(Some)
    }

    /// Insert or update an order by key and replace its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails; nothing is
    /// written in that case.
    #[instrument(skip(self, order), fields(key = %order.key))]
    pub async fn upsert(
        &self,
        credential_id: CredentialId,
        order: &CachedSalesOrder,
    ) -> Result<SalesOrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let id = upsert_order(&mut *tx, credential_id, order).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Remove an order from the cache. Returns whether a row existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn remove(
        &self,
        credential_id: CredentialId,
        key: &SalesOrderKey,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM sales_orders
            WHERE credential_id = $1 AND order_type = $2 AND order_nbr = $3
            ",
        )
        .bind(credential_id)
        .bind(key.order_type.code())
        .bind(&key.order_nbr)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Key to ERP last-modified map of every cached order.
    ///
    /// Rows whose key no longer parses are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn snapshot(
        &self,
        credential_id: CredentialId,
    ) -> Result<HashMap<SalesOrderKey, Option<DateTime<Utc>>>, RepositoryError> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            r"
            SELECT id, order_type, order_nbr, erp_last_modified
            FROM sales_orders
            WHERE credential_id = $1
            ",
        )
        .bind(credential_id)
        .fetch_all(self.pool)
        .await?;

        let mut snapshot = HashMap::with_capacity(rows.len());
        for row in rows {
            match SalesOrderKey::parse(&row.order_type, &row.order_nbr) {
                Ok(key) => {
                    snapshot.insert(key, row.erp_last_modified);
                }
                Err(e) => {
                    tracing::warn!(sales_order_id = row.id, error = %e, "Skipping cached order with invalid key");
                }
            }
        }
        Ok(snapshot)
    }

    /// Apply the writes of a reconciliation in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the cache
    /// is left unchanged in that case.
    #[instrument(skip_all, fields(credential_id = %credential_id, upserts = upserts.len(), removals = removals.len()))]
    pub async fn apply(
        &self,
        credential_id: CredentialId,
        upserts: &[CachedSalesOrder],
        removals: &[SalesOrderKey],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for order in upserts {
            upsert_order(&mut *tx, credential_id, order).await?;
        }

        for key in removals {
            sqlx::query(
                r"
                DELETE FROM sales_orders
                WHERE credential_id = $1 AND order_type = $2 AND order_nbr = $3
                ",
            )
            .bind(credential_id)
            .bind(key.order_type.code())
            .bind(&key.order_nbr)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn upsert_order(
    conn: &mut PgConnection,
    credential_id: CredentialId,
    order: &CachedSalesOrder,
) -> Result<SalesOrderId, RepositoryError> {
    let id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO sales_orders (
            credential_id, erp_id, order_type, order_nbr, customer_id,
            customer_order, description, status, hold, order_date,
            requested_on, currency_id, order_total, ordered_qty,
            erp_last_modified, synced_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, NOW())
        ON CONFLICT (credential_id, order_type, order_nbr) DO UPDATE SET
            erp_id = EXCLUDED.erp_id,
            customer_id = EXCLUDED.customer_id,
            customer_order = EXCLUDED.customer_order,
            description = EXCLUDED.description,
            status = EXCLUDED.status,
            hold = EXCLUDED.hold,
            order_date = EXCLUDED.order_date,
            requested_on = EXCLUDED.requested_on,
            currency_id = EXCLUDED.currency_id,
            order_total = EXCLUDED.order_total,
            ordered_qty = EXCLUDED.ordered_qty,
            erp_last_modified = EXCLUDED.erp_last_modified,
            synced_at = NOW()
        RETURNING id
        ",
    )
    .bind(credential_id)
    .bind(order.erp_id)
    .bind(order.key.order_type.code())
    .bind(&order.key.order_nbr)
    .bind(&order.customer_id)
    .bind(&order.customer_order)
    .bind(&order.description)
    .bind(order.status.as_erp_str())
    .bind(order.hold)
    .bind(order.order_date)
    .bind(order.requested_on)
    .bind(&order.currency_id)
    .bind(order.order_total)
    .bind(order.ordered_qty)
    .bind(order.last_modified)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM sales_order_lines WHERE sales_order_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    for line in &order.lines {
        sqlx::query(
            r"
            INSERT INTO sales_order_lines (
                sales_order_id, line_nbr, erp_id, inventory_id, description,
                warehouse_id, uom, quantity, unit_price, extended_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(id)
        .bind(line.line_nbr)
        .bind(line.erp_id)
        .bind(&line.inventory_id)
        .bind(&line.description)
        .bind(&line.warehouse_id)
        .bind(&line.uom)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.extended_price)
        .execute(&mut *conn)
        .await?;
    }

    Ok(SalesOrderId::new(id))
}
