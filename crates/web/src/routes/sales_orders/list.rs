//! Order list page and cache refresh.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use order_desk_core::OrderType;
use order_desk_core::options::{ORDER_TYPE_OPTIONS, STATUS_FILTER_OPTIONS};
use serde::Deserialize;
use tracing::instrument;

use super::types::{OptionView, OrderListQuery, OrderRowView, option_views};
use super::{no_credential_redirect, sync_failure};
use crate::db::{CredentialRepository, SalesOrderCache};
use crate::erp::ErpError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::services::SyncError;
use crate::state::AppState;

/// Orders list page template.
#[derive(Template, WebTemplate)]
#[template(path = "sales_orders/index.html")]
pub struct OrdersIndexTemplate {
    /// Name of the selected credential.
    pub credential_name: String,
    pub orders: Vec<OrderRowView>,
    pub status_options: Vec<OptionView>,
    pub type_options: Vec<OptionView>,
    /// Current search text.
    pub search_value: String,
    /// Whether any filter is active.
    pub filtered: bool,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

/// Refresh form input.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshInput {
    /// Only refresh orders of this type.
    #[serde(default)]
    pub order_type: Option<String>,
}

fn success_message(query: &OrderListQuery) -> Option<String> {
    let code = query.success.as_deref()?;
    let counts = || {
        format!(
            "{} added, {} changed, {} removed",
            query.added.unwrap_or(0),
            query.changed.unwrap_or(0),
            query.removed.unwrap_or(0)
        )
    };
    Some(match code {
        "refreshed" => format!("Orders refreshed from the ERP: {}.", counts()),
        "refreshed_partial" => format!(
            "Orders refreshed from the ERP: {}. Some orders could not be read, so nothing was removed.",
            counts()
        ),
        "deleted" => "Sales order deleted.".to_string(),
        "already_deleted" => "The ERP no longer had that order; it was removed here too.".to_string(),
        other => format!("Success: {other}"),
    })
}

fn error_message(code: &str) -> String {
    match code {
        "not_found" => "That sales order no longer exists in the ERP.".to_string(),
        "refresh_failed" => "Refreshing from the ERP failed.".to_string(),
        "auth_failed" => "The ERP rejected the selected credential.".to_string(),
        "unreachable" => "The ERP site could not be reached.".to_string(),
        _ => format!("Error: {code}"),
    }
}

/// GET /sales-orders - Cached order list for the selected credential.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Response> {
    let Some(credential) = CredentialRepository::new(state.pool())
        .get_selected()
        .await?
    else {
        return Ok(no_credential_redirect());
    };

    let filter = query.cache_filter();
    let orders = SalesOrderCache::new(state.pool())
        .list(credential.id, &filter)
        .await?;

    let mut type_options = vec![OptionView {
        value: String::new(),
        label: "All types".to_string(),
        selected: filter.order_type.is_none(),
    }];
    type_options.extend(option_views(
        ORDER_TYPE_OPTIONS,
        filter.order_type.as_ref().map_or("", OrderType::code),
    ));

    let page = OrdersIndexTemplate {
        credential_name: credential.name,
        orders: orders.iter().map(OrderRowView::from).collect(),
        status_options: option_views(
            STATUS_FILTER_OPTIONS,
            filter.status.as_ref().map_or("", |s| s.as_erp_str()),
        ),
        type_options,
        search_value: filter.search.clone().unwrap_or_default(),
        filtered: filter.status.is_some() || filter.order_type.is_some() || filter.search.is_some(),
        success_message: success_message(&query),
        error_message: query.error.as_deref().map(error_message),
    };
    Ok(page.into_response())
}

/// POST /sales-orders/refresh - Pull orders from the ERP and reconcile the
/// cache.
#[instrument(skip(state))]
pub async fn refresh(
    State(state): State<AppState>,
    Form(input): Form<RefreshInput>,
) -> Result<Response> {
    let order_type = input
        .order_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<OrderType>)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    match state.sales_orders().refresh(order_type).await {
        Ok(summary) => {
            let code = if summary.complete {
                "refreshed"
            } else {
                "refreshed_partial"
            };
            Ok(Redirect::to(&format!(
                "/sales-orders?success={code}&added={}&changed={}&removed={}",
                summary.inserted, summary.updated, summary.removed
            ))
            .into_response())
        }
        Err(SyncError::Erp(e)) => {
            tracing::warn!(error = %e, "Sales order refresh failed");
            let code = match &e {
                ErpError::AuthenticationFailed(_) => "auth_failed",
                e if e.is_unreachable() => "unreachable",
                _ => "refresh_failed",
            };
            Ok(Redirect::to(&format!("/sales-orders?error={code}")).into_response())
        }
        Err(e) => sync_failure(e),
    }
}
