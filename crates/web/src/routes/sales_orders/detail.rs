//! Order details page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use super::parse_key;
use super::sync_failure;
use super::types::OrderDetailView;
use crate::error::Result;
use crate::filters;
use crate::routes::FlashQuery;
use crate::services::{OrderDetails, SyncError};
use crate::state::AppState;

/// Order details page template.
#[derive(Template, WebTemplate)]
#[template(path = "sales_orders/show.html")]
pub struct OrderShowTemplate {
    pub order: OrderDetailView,
    /// Set when the ERP could not be reached and the cached copy is shown.
    pub stale_warning: Option<String>,
    pub success_message: Option<String>,
}

fn success_message(code: &str) -> String {
    match code {
        "created" => "Sales order created.".to_string(),
        "updated" => "Sales order saved.".to_string(),
        _ => format!("Success: {code}"),
    }
}

impl OrderShowTemplate {
    fn new(details: &OrderDetails, flash: &FlashQuery) -> Self {
        let stale_warning = match details {
            OrderDetails::Fresh(_) => None,
            OrderDetails::Stale { synced_at, .. } => Some(format!(
                "The ERP could not be reached. Showing the copy saved {}. Editing is disabled until the ERP is available.",
                synced_at.format("%b %d, %Y %H:%M UTC")
            )),
        };
        let mut order = OrderDetailView::from(details.order());
        if stale_warning.is_some() {
            order.editable = false;
        }
        Self {
            order,
            stale_warning,
            success_message: flash.success.as_deref().map(success_message),
        }
    }
}

/// GET /sales-orders/{order_type}/{order_nbr} - Order details, fetched from
/// the ERP.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path((order_type, order_nbr)): Path<(String, String)>,
    Query(flash): Query<FlashQuery>,
) -> Result<Response> {
    let key = parse_key(&order_type, &order_nbr)?;

    match state.sales_orders().details(&key).await {
        Ok(details) => {
            if let OrderDetails::Stale { reason, .. } = &details {
                tracing::warn!(%key, %reason, "Showing cached order");
            }
            Ok(OrderShowTemplate::new(&details, &flash).into_response())
        }
        Err(SyncError::NotFound(_)) => {
            Ok(Redirect::to("/sales-orders?error=not_found").into_response())
        }
        Err(e) => sync_failure(e),
    }
}
