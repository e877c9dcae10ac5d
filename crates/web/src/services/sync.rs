//! Sales order synchronization between the ERP and the local cache.
//!
//! Every operation follows the same chain:
//!
//! ```text
//! selected credential -> login -> ERP call -> convert -> cache write -> logout
//! ```
//!
//! The ERP is authoritative. The cache is only written from entities the ERP
//! returned, and rows are removed when the ERP says an order is gone.

use std::future::Future;

use chrono::{DateTime, Utc};
use order_desk_core::{OrderType, SalesOrderKey};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use super::reconcile::{RemoteListing, reconcile};
use crate::db::{CredentialRepository, RepositoryError, SalesOrderCache};
use crate::erp::conversions::{to_cached_order, to_entity};
use crate::erp::{ConversionError, ErpClient, ErpError, ErpSession, ListOptions};
use crate::models::{CachedSalesOrder, ErpCredential, SalesOrderInput};

/// Upper bound on pages fetched by one refresh.
const MAX_REFRESH_PAGES: u32 = 200;

/// Errors from synchronization operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No credential is marked as selected.
    #[error("no ERP credential is selected")]
    NoCredentialSelected,

    /// The ERP does not have this order.
    #[error("sales order {0} not found")]
    NotFound(SalesOrderKey),

    /// The submitted order failed local checks.
    #[error("invalid sales order: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error(transparent)]
    Erp(#[from] ErpError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result of [`SalesOrderSync::details`].
#[derive(Debug, Clone)]
pub enum OrderDetails {
    /// Fetched from the ERP just now.
    Fresh(CachedSalesOrder),
    /// The ERP could not be reached; this is the cached copy.
    Stale {
        order: CachedSalesOrder,
        synced_at: DateTime<Utc>,
        reason: String,
    },
}

impl OrderDetails {
    /// The order, fresh or not.
    #[must_use]
    pub const fn order(&self) -> &CachedSalesOrder {
        match self {
            Self::Fresh(order) | Self::Stale { order, .. } => order,
        }
    }
}

/// Counts reported by [`SalesOrderSync::refresh`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
    /// ERP records that could not be converted.
    pub skipped: usize,
    /// Whether the listing covered every order (removals only happen then).
    pub complete: bool,
}

/// Sales order operations against the selected credential.
pub struct SalesOrderSync<'a> {
    pool: &'a PgPool,
    erp: &'a ErpClient,
    page_size: u32,
}

impl<'a> SalesOrderSync<'a> {
    /// Create a sync service. `page_size` is the `$top` used by refreshes.
    #[must_use]
    pub const fn new(pool: &'a PgPool, erp: &'a ErpClient, page_size: u32) -> Self {
        Self {
            pool,
            erp,
            page_size,
        }
    }

    /// The credential the sales order pages work with.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NoCredentialSelected` if none is selected.
    pub async fn selected_credential(&self) -> Result<ErpCredential, SyncError> {
        CredentialRepository::new(self.pool)
            .get_selected()
            .await?
            .ok_or(SyncError::NoCredentialSelected)
    }

    /// Log in, run `op`, and log out whether or not `op` succeeded.
    ///
    /// # Errors
    ///
    /// Returns the login error, or whatever `op` returns.
    pub async fn with_session<T, F, Fut>(
        &self,
        credential: &ErpCredential,
        op: F,
    ) -> Result<T, SyncError>
    where
        F: FnOnce(ErpSession) -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let session = self.erp.login(credential).await?;
        let result = op(session.clone()).await;
        session.logout().await;
        result
    }

    /// Create an order in the ERP and cache the saved copy.
    ///
    /// Returns the key the ERP assigned.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Invalid` for local validation failures or when a
    /// typed order number already exists, `SyncError::Erp` for ERP failures.
    #[instrument(skip(self, input), fields(order_type = %input.order_type))]
    pub async fn create(&self, input: &SalesOrderInput) -> Result<SalesOrderKey, SyncError> {
        let errors = input.validate();
        if !errors.is_empty() {
            return Err(SyncError::Invalid(errors));
        }

        let typed_key = match input.order_nbr.as_deref().map(str::trim) {
            Some(nbr) if !nbr.is_empty() => Some(
                SalesOrderKey::parse(&input.order_type, nbr)
                    .map_err(|e| SyncError::Invalid(vec![e.to_string()]))?,
            ),
            _ => None,
        };

        let credential = self.selected_credential().await?;
        let entity = to_entity(input, None);

        let saved = self
            .with_session(&credential, |session| async move {
                if let Some(key) = &typed_key
                    && session.get_sales_order(key, false).await?.is_some()
                {
                    return Err(SyncError::Invalid(vec![format!(
                        "Sales order {key} already exists"
                    )]));
                }
                Ok(session.put_sales_order(&entity).await?)
            })
            .await?;

        let order = to_cached_order(&saved)?;
        SalesOrderCache::new(self.pool)
            .upsert(credential.id, &order)
            .await?;

        tracing::info!(key = %order.key, "Created sales order");
        Ok(order.key)
    }

    /// Fetch an order from the ERP and refresh its cache row.
    ///
    /// Falls back to the cached copy when the ERP cannot be reached.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotFound` if the ERP does not have the order (its
    /// cache row is removed), or `SyncError::Erp` if the ERP fails and no
    /// cached copy exists.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn details(&self, key: &SalesOrderKey) -> Result<OrderDetails, SyncError> {
        let credential = self.selected_credential().await?;
        let cache = SalesOrderCache::new(self.pool);

        let fetched = self
            .with_session(&credential, |session| async move {
                Ok(session.get_sales_order(key, true).await?)
            })
            .await;

        match fetched {
            Ok(Some(entity)) => {
                let order = to_cached_order(&entity)?;
                cache.upsert(credential.id, &order).await?;
                Ok(OrderDetails::Fresh(order))
            }
            Ok(None) => {
                if cache.remove(credential.id, key).await? {
                    tracing::info!("Removed cached order the ERP no longer has");
                }
                Err(SyncError::NotFound(key.clone()))
            }
            Err(SyncError::Erp(e)) if e.is_unreachable() => {
                match cache.get(credential.id, key).await? {
                    Some(stored) => {
                        tracing::warn!(error = %e, "ERP unreachable, showing cached order");
                        Ok(OrderDetails::Stale {
                            order: stored.order,
                            synced_at: stored.synced_at,
                            reason: e.to_string(),
                        })
                    }
                    None => Err(SyncError::Erp(e)),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Update an existing order and refresh its cache row.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotFound` if the ERP does not have the order,
    /// `SyncError::Invalid` if the input is invalid or the order can no longer
    /// be edited, `SyncError::Erp` for ERP failures.
    #[instrument(skip(self, input), fields(key = %key))]
    pub async fn update(
        &self,
        key: &SalesOrderKey,
        input: &SalesOrderInput,
    ) -> Result<CachedSalesOrder, SyncError> {
        let errors = input.validate();
        if !errors.is_empty() {
            return Err(SyncError::Invalid(errors));
        }

        let credential = self.selected_credential().await?;
        let cache = SalesOrderCache::new(self.pool);
        let entity = to_entity(input, Some(key));

        let saved = self
            .with_session(&credential, |session| async move {
                let Some(current) = session.get_sales_order(key, false).await? else {
                    return Ok(None);
                };
                let current = to_cached_order(&current)?;
                if !current.status.is_editable() {
                    return Err(SyncError::Invalid(vec![format!(
                        "Orders in status {} cannot be edited",
                        current.status
                    )]));
                }
                Ok(Some(session.put_sales_order(&entity).await?))
            })
            .await?;

        let Some(saved) = saved else {
            cache.remove(credential.id, key).await?;
            return Err(SyncError::NotFound(key.clone()));
        };

        let order = to_cached_order(&saved)?;
        cache.upsert(credential.id, &order).await?;

        tracing::info!("Updated sales order");
        Ok(order)
    }

    /// Delete an order in the ERP and drop its cache row.
    ///
    /// Returns `false` if the ERP did not have the order; the cache row is
    /// removed either way.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Erp` if the ERP refuses the delete; the cache is
    /// left untouched in that case.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn delete(&self, key: &SalesOrderKey) -> Result<bool, SyncError> {
        let credential = self.selected_credential().await?;

        let existed = self
            .with_session(&credential, |session| async move {
                Ok(session.delete_sales_order(key).await?)
            })
            .await?;

        SalesOrderCache::new(self.pool)
            .remove(credential.id, key)
            .await?;

        tracing::info!(existed, "Deleted sales order");
        Ok(existed)
    }

    /// Pull every order (optionally of one type) and reconcile the cache.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Erp` if listing fails; nothing is written then.
    #[instrument(skip(self))]
    pub async fn refresh(&self, order_type: Option<OrderType>) -> Result<RefreshSummary, SyncError> {
        let credential = self.selected_credential().await?;
        let page_size = self.page_size;
        let filter = order_type.clone();

        let (entities, mut complete) = self
            .with_session(&credential, |session| async move {
                let mut entities = Vec::new();
                for page in 0..MAX_REFRESH_PAGES {
                    let options = ListOptions {
                        order_type: filter.clone(),
                        top: Some(page_size),
                        skip: Some(page * page_size),
                        expand_details: true,
                        ..Default::default()
                    };
                    let batch = session.list_sales_orders(&options).await?;
                    let fetched = batch.len();
                    entities.extend(batch);
                    if fetched < page_size as usize {
                        return Ok((entities, true));
                    }
                }
                tracing::warn!(pages = MAX_REFRESH_PAGES, "Refresh stopped at page limit");
                Ok((entities, false))
            })
            .await?;

        let mut orders = Vec::with_capacity(entities.len());
        let mut skipped = 0;
        for entity in &entities {
            match to_cached_order(entity) {
                Ok(order) => orders.push(order),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(error = %e, erp_id = ?entity.id, "Skipping unreadable ERP order");
                }
            }
        }
        if skipped > 0 {
            complete = false;
        }

        let cache = SalesOrderCache::new(self.pool);
        let snapshot = cache.snapshot(credential.id).await?;
        let plan = reconcile(
            &snapshot,
            RemoteListing {
                orders,
                complete,
                order_type,
            },
        );

        let summary = RefreshSummary {
            inserted: plan.inserts.len(),
            updated: plan.updates.len(),
            unchanged: plan.unchanged,
            removed: plan.removals.len(),
            skipped,
            complete,
        };

        let mut upserts = plan.inserts;
        upserts.extend(plan.updates);
        cache
            .apply(credential.id, &upserts, &plan.removals)
            .await?;

        tracing::info!(
            inserted = summary.inserted,
            updated = summary.updated,
            unchanged = summary.unchanged,
            removed = summary.removed,
            skipped = summary.skipped,
            "Refreshed sales order cache"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_messages() {
        let key = SalesOrderKey::parse("SO", "000123").unwrap();
        assert_eq!(
            SyncError::NotFound(key).to_string(),
            "sales order SO 000123 not found"
        );
        assert_eq!(
            SyncError::Invalid(vec!["a".to_string(), "b".to_string()]).to_string(),
            "invalid sales order: a; b"
        );
        assert_eq!(
            SyncError::from(ErpError::SessionExpired).to_string(),
            "ERP session expired"
        );
    }
}
