//! Edit page handlers.

use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use order_desk_core::SalesOrderKey;
use tracing::instrument;

use super::create::{CREATE_BLANK_LINES, OrderFormTemplate, form_errors};
use super::form::{FormAction, OrderForm};
use super::{order_path, parse_key, sync_failure};
use crate::erp::conversions::to_input;
use crate::error::{AppError, Result};
use crate::services::{OrderDetails, SyncError};
use crate::state::AppState;

impl OrderFormTemplate {
    fn for_edit(key: &SalesOrderKey, mut form: OrderForm, errors: Vec<String>) -> Self {
        // The key comes from the URL, never from the submitted fields.
        form.order_type = key.order_type.code().to_string();
        form.order_nbr.clone_from(&key.order_nbr);
        let path = order_path(key);
        Self {
            title: format!("Edit {key}"),
            action: path.clone(),
            cancel_path: path,
            editing: true,
            form,
            errors,
        }
    }
}

/// GET /sales-orders/{order_type}/{order_nbr}/edit - Edit form, prefilled
/// from the ERP's current copy.
#[instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    Path((order_type, order_nbr)): Path<(String, String)>,
) -> Result<Response> {
    let key = parse_key(&order_type, &order_nbr)?;

    let order = match state.sales_orders().details(&key).await {
        Ok(OrderDetails::Fresh(order)) => order,
        // Edits are never based on the cached copy.
        Ok(OrderDetails::Stale { .. }) => {
            return Ok(Redirect::to(&order_path(&key)).into_response());
        }
        Err(SyncError::NotFound(_)) => {
            return Ok(Redirect::to("/sales-orders?error=not_found").into_response());
        }
        Err(e) => return sync_failure(e),
    };

    if !order.status.is_editable() {
        return Err(AppError::BadRequest(format!(
            "Orders in status {} cannot be edited",
            order.status
        )));
    }

    let form = OrderForm::from_input(&to_input(&order)).with_blank_lines(1);
    Ok(OrderFormTemplate::for_edit(&key, form, Vec::new()).respond(StatusCode::OK))
}

/// POST /sales-orders/{order_type}/{order_nbr} - Save an edited order.
#[instrument(skip(state, pairs))]
pub async fn update(
    State(state): State<AppState>,
    Path((order_type, order_nbr)): Path<(String, String)>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let key = parse_key(&order_type, &order_nbr)?;
    let form = OrderForm::from_pairs(pairs);

    if form.action == FormAction::AddLines {
        let form = form.with_blank_lines(CREATE_BLANK_LINES);
        return Ok(OrderFormTemplate::for_edit(&key, form, Vec::new()).respond(StatusCode::OK));
    }

    let input = match form.parse() {
        Ok(mut input) => {
            input.order_type = key.order_type.code().to_string();
            input.order_nbr = Some(key.order_nbr.clone());
            input
        }
        Err(e) => {
            return Ok(
                OrderFormTemplate::for_edit(&key, form, e.errors).respond(StatusCode::BAD_REQUEST)
            );
        }
    };

    match state.sales_orders().update(&key, &input).await {
        Ok(order) => Ok(
            Redirect::to(&format!("{}?success=updated", order_path(&order.key))).into_response(),
        ),
        Err(SyncError::NotFound(_)) => {
            Ok(Redirect::to("/sales-orders?error=not_found").into_response())
        }
        Err(e) => match form_errors(&e) {
            Some((status, errors)) => {
                tracing::info!(%key, ?errors, "Sales order update rejected");
                Ok(OrderFormTemplate::for_edit(&key, form, errors).respond(status))
            }
            None => sync_failure(e),
        },
    }
}
