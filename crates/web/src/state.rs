//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::OrderDeskConfig;
use crate::erp::ErpClient;
use crate::services::SalesOrderSync;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: OrderDeskConfig,
    pool: PgPool,
    erp: ErpClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: OrderDeskConfig, pool: PgPool) -> Self {
        let erp = ErpClient::new(config.erp.timeout);

        Self {
            inner: Arc::new(AppStateInner { config, pool, erp }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &OrderDeskConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the ERP client.
    #[must_use]
    pub fn erp(&self) -> &ErpClient {
        &self.inner.erp
    }

    /// Sales order synchronization bound to this state.
    #[must_use]
    pub fn sales_orders(&self) -> SalesOrderSync<'_> {
        SalesOrderSync::new(self.pool(), self.erp(), self.config().erp.page_size)
    }
}
