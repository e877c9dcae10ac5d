//! Delete confirmation and submit.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use super::types::OrderDetailView;
use super::{parse_key, sync_failure};
use crate::error::Result;
use crate::filters;
use crate::services::{OrderDetails, SyncError};
use crate::state::AppState;

/// Delete confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "sales_orders/delete.html")]
pub struct OrderDeleteTemplate {
    pub order: OrderDetailView,
    pub stale: bool,
}

/// GET /sales-orders/{order_type}/{order_nbr}/delete - Confirmation page.
#[instrument(skip(state))]
pub async fn confirm(
    State(state): State<AppState>,
    Path((order_type, order_nbr)): Path<(String, String)>,
) -> Result<Response> {
    let key = parse_key(&order_type, &order_nbr)?;

    match state.sales_orders().details(&key).await {
        Ok(details) => Ok(OrderDeleteTemplate {
            order: OrderDetailView::from(details.order()),
            stale: matches!(details, OrderDetails::Stale { .. }),
        }
        .into_response()),
        Err(SyncError::NotFound(_)) => {
            Ok(Redirect::to("/sales-orders?error=not_found").into_response())
        }
        Err(e) => sync_failure(e),
    }
}

/// POST /sales-orders/{order_type}/{order_nbr}/delete - Delete the order in
/// the ERP and drop it from the cache.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path((order_type, order_nbr)): Path<(String, String)>,
) -> Result<Response> {
    let key = parse_key(&order_type, &order_nbr)?;

    match state.sales_orders().delete(&key).await {
        Ok(true) => Ok(Redirect::to("/sales-orders?success=deleted").into_response()),
        Ok(false) => Ok(Redirect::to("/sales-orders?success=already_deleted").into_response()),
        Err(e) => sync_failure(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use order_desk_core::{OrderStatus, SalesOrderKey};
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::CachedSalesOrder;

    #[test]
    fn test_confirmation_posts_to_delete_path() {
        let order = CachedSalesOrder {
            key: SalesOrderKey::parse("QT", "Q-7").unwrap(),
            erp_id: None,
            customer_id: "C1".to_string(),
            customer_order: None,
            description: None,
            status: OrderStatus::Open,
            hold: false,
            order_date: None,
            requested_on: None,
            currency_id: None,
            order_total: Decimal::ZERO,
            ordered_qty: Decimal::ZERO,
            last_modified: None,
            lines: Vec::new(),
        };
        let html = OrderDeleteTemplate {
            order: OrderDetailView::from(&order),
            stale: false,
        }
        .render()
        .unwrap();
        assert!(html.contains(r#"action="/sales-orders/QT/Q-7/delete""#));
        assert!(html.contains("QT Q-7"));
    }
}
