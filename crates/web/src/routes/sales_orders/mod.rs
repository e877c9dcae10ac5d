//! Sales order route handlers.
//!
//! Every page works against the selected ERP credential. Without one, the
//! handlers redirect to the credential list.

mod create;
mod delete;
mod detail;
mod edit;
pub mod form;
mod list;
pub mod types;

use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use order_desk_core::SalesOrderKey;

use crate::error::{AppError, Result};
use crate::services::SyncError;
use crate::state::AppState;

pub use create::{CREATE_BLANK_LINES, OrderFormTemplate};
pub use delete::OrderDeleteTemplate;
pub use detail::OrderShowTemplate;
pub use form::{FormAction, FormError, LineForm, OrderForm};
pub use list::OrdersIndexTemplate;
pub use types::{LineView, OptionView, OrderDetailView, OrderListQuery, OrderRowView};

/// Build the sales order router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales-orders", get(list::index).post(create::create))
        .route("/sales-orders/refresh", axum::routing::post(list::refresh))
        .route("/sales-orders/new", get(create::new_form))
        .route(
            "/sales-orders/{order_type}/{order_nbr}",
            get(detail::show).post(edit::update),
        )
        .route("/sales-orders/{order_type}/{order_nbr}/edit", get(edit::edit_form))
        .route(
            "/sales-orders/{order_type}/{order_nbr}/delete",
            get(delete::confirm).post(delete::delete),
        )
}

/// Page path of an order, with the key segments percent-encoded.
#[must_use]
pub fn order_path(key: &SalesOrderKey) -> String {
    format!(
        "/sales-orders/{}/{}",
        urlencoding::encode(key.order_type.code()),
        urlencoding::encode(&key.order_nbr)
    )
}

/// Key from the `{order_type}/{order_nbr}` path segments.
///
/// A malformed key cannot name an order, so it is reported as not found.
fn parse_key(order_type: &str, order_nbr: &str) -> Result<SalesOrderKey> {
    SalesOrderKey::parse(order_type, order_nbr)
        .map_err(|_| AppError::NotFound(format!("Sales order {order_type} {order_nbr}")))
}

/// Turn a sync failure into a response. A missing credential sends the user
/// to the credential list; everything else becomes an error page.
fn sync_failure(err: SyncError) -> Result<Response> {
    match err {
        SyncError::NoCredentialSelected => Ok(no_credential_redirect()),
        other => Err(other.into()),
    }
}

fn no_credential_redirect() -> Response {
    Redirect::to("/credentials?error=no_credential").into_response()
}
