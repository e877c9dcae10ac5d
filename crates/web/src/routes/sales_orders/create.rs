//! Create page handlers. The form template is shared with the edit page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use super::form::{FormAction, OrderForm};
use super::{no_credential_redirect, order_path, sync_failure};
use crate::db::CredentialRepository;
use crate::erp::ErpError;
use crate::error::Result;
use crate::filters;
use crate::services::SyncError;
use crate::state::AppState;

/// Blank rows shown on a new form, and added by "Add lines".
pub const CREATE_BLANK_LINES: usize = 3;

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "sales_orders/form.html")]
pub struct OrderFormTemplate {
    pub title: String,
    /// Form POST target.
    pub action: String,
    /// Where "Cancel" goes.
    pub cancel_path: String,
    /// Editing an existing order: the key fields are read-only.
    pub editing: bool,
    pub form: OrderForm,
    pub errors: Vec<String>,
}

impl OrderFormTemplate {
    pub(super) fn for_create(form: OrderForm, errors: Vec<String>) -> Self {
        Self {
            title: "New sales order".to_string(),
            action: "/sales-orders".to_string(),
            cancel_path: "/sales-orders".to_string(),
            editing: false,
            form,
            errors,
        }
    }

    pub(super) fn respond(self, status: StatusCode) -> Response {
        (status, self).into_response()
    }
}

/// Status and messages for a failed save, or `None` if the failure is not
/// something the user can fix in the form.
pub(super) fn form_errors(err: &SyncError) -> Option<(StatusCode, Vec<String>)> {
    match err {
        SyncError::Invalid(errors) => Some((StatusCode::BAD_REQUEST, errors.clone())),
        SyncError::Erp(ErpError::Validation(errors)) => {
            Some((StatusCode::UNPROCESSABLE_ENTITY, errors.clone()))
        }
        _ => None,
    }
}

/// GET /sales-orders/new - New order form.
#[instrument(skip(state))]
pub async fn new_form(State(state): State<AppState>) -> Result<Response> {
    if CredentialRepository::new(state.pool())
        .get_selected()
        .await?
        .is_none()
    {
        return Ok(no_credential_redirect());
    }

    let form = OrderForm {
        order_type: "SO".to_string(),
        ..Default::default()
    }
    .with_blank_lines(CREATE_BLANK_LINES);

    Ok(OrderFormTemplate::for_create(form, Vec::new()).respond(StatusCode::OK))
}

/// POST /sales-orders - Create an order in the ERP.
#[instrument(skip(state, pairs))]
pub async fn create(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let form = OrderForm::from_pairs(pairs);

    if form.action == FormAction::AddLines {
        let form = form.with_blank_lines(CREATE_BLANK_LINES);
        return Ok(OrderFormTemplate::for_create(form, Vec::new()).respond(StatusCode::OK));
    }

    let input = match form.parse() {
        Ok(input) => input,
        Err(e) => {
            return Ok(OrderFormTemplate::for_create(form, e.errors).respond(StatusCode::BAD_REQUEST));
        }
    };

    match state.sales_orders().create(&input).await {
        Ok(key) => Ok(Redirect::to(&format!("{}?success=created", order_path(&key))).into_response()),
        Err(e) => match form_errors(&e) {
            Some((status, errors)) => {
                tracing::info!(?errors, "Sales order rejected");
                Ok(OrderFormTemplate::for_create(form, errors).respond(status))
            }
            None => sync_failure(e),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_errors_status() {
        let (status, errors) =
            form_errors(&SyncError::Invalid(vec!["Customer is required".to_string()])).unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(errors, vec!["Customer is required".to_string()]);

        let (status, _) = form_errors(&SyncError::Erp(ErpError::Validation(vec![
            "CustomerID: not found".to_string(),
        ])))
        .unwrap();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        assert!(form_errors(&SyncError::NoCredentialSelected).is_none());
        assert!(form_errors(&SyncError::Erp(ErpError::SessionExpired)).is_none());
    }

    #[test]
    fn test_form_renders_rows_and_errors() {
        let form = OrderForm {
            order_type: "SO".to_string(),
            customer_id: "ABARTENDE".to_string(),
            ..Default::default()
        }
        .with_blank_lines(2);
        let page = OrderFormTemplate::for_create(form, vec!["Customer is required".to_string()])
            .render()
            .unwrap();

        assert!(page.contains("Customer is required"));
        assert!(page.contains("line_inventory_id_0"));
        assert!(page.contains("line_inventory_id_1"));
        assert!(!page.contains("line_inventory_id_2"));
        assert!(page.contains(r#"value="SO" selected"#));
    }
}
