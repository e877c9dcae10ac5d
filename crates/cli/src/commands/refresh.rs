//! Sales order cache refresh command.
//!
//! # Usage
//!
//! ```bash
//! # Refresh every order type
//! od-cli refresh
//!
//! # Refresh only sales orders of type SO
//! od-cli refresh --order-type SO
//! ```
//!
//! Uses the selected credential, exactly like the "Refresh from ERP" button.

use order_desk_core::OrderType;
use order_desk_web::config::ErpConfig;
use order_desk_web::erp::ErpClient;
use order_desk_web::services::SalesOrderSync;

use super::{CliError, connect};

/// Reconcile the cache with the ERP.
///
/// # Errors
///
/// Returns `CliError::Invalid` for a malformed order type, or the sync error.
pub async fn run(order_type: Option<&str>) -> Result<(), CliError> {
    let order_type = order_type
        .map(str::parse::<OrderType>)
        .transpose()
        .map_err(|e| CliError::Invalid(vec![e.to_string()]))?;

    let pool = connect().await?;
    let erp_config = ErpConfig::from_env()?;
    let client = ErpClient::new(erp_config.timeout);

    let summary = SalesOrderSync::new(&pool, &client, erp_config.page_size)
        .refresh(order_type)
        .await?;

    tracing::info!(
        "Refresh complete: {} added, {} changed, {} unchanged, {} removed, {} skipped",
        summary.inserted,
        summary.updated,
        summary.unchanged,
        summary.removed,
        summary.skipped
    );
    if !summary.complete {
        tracing::warn!("Listing was incomplete; no cached orders were removed");
    }
    Ok(())
}
