//! ERP credential routes.
//!
//! Credentials are managed with plain HTML forms. Outcomes are reported with
//! `?success=` / `?error=` codes on the redirect back to the list.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use order_desk_core::CredentialId;
use serde::Deserialize;
use tracing::instrument;

use super::FlashQuery;
use crate::db::{CredentialParams, CredentialRepository, RepositoryError};
use crate::erp::ErpError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::ErpCredential;
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// Credential list page.
#[derive(Template, WebTemplate)]
#[template(path = "credentials/index.html")]
pub struct CredentialsIndexTemplate {
    pub credentials: Vec<CredentialView>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

/// New/edit credential form.
#[derive(Template, WebTemplate)]
#[template(path = "credentials/form.html")]
pub struct CredentialFormTemplate {
    pub title: String,
    pub action: String,
    pub editing: bool,
    pub form: CredentialForm,
    pub errors: Vec<String>,
}

/// Build the credentials router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/credentials", get(index).post(create))
        .route("/credentials/new", get(new_form))
        .route("/credentials/{id}", post(update))
        .route("/credentials/{id}/edit", get(edit_form))
        .route("/credentials/{id}/select", post(select))
        .route("/credentials/{id}/test", post(test_connection))
        .route("/credentials/{id}/delete", post(delete))
}

// =============================================================================
// Views
// =============================================================================

/// Credential row for the list page. The password is never rendered.
#[derive(Debug, Clone)]
pub struct CredentialView {
    pub id: i32,
    pub name: String,
    pub base_url: String,
    pub username: String,
    pub company: String,
    pub branch: String,
    pub endpoint: String,
    pub is_selected: bool,
    pub last_verified: String,
}

impl From<&ErpCredential> for CredentialView {
    fn from(credential: &ErpCredential) -> Self {
        Self {
            id: credential.id.as_i32(),
            name: credential.name.clone(),
            base_url: credential.base_url.clone(),
            username: credential.username.clone(),
            company: credential.company.clone(),
            branch: credential.branch.clone().unwrap_or_default(),
            endpoint: format!(
                "{}/{}",
                credential.endpoint_name, credential.endpoint_version
            ),
            is_selected: credential.is_selected,
            last_verified: credential.last_verified_at.map_or_else(
                || "Never".to_string(),
                |dt| dt.format("%b %d, %Y %H:%M UTC").to_string(),
            ),
        }
    }
}

/// Submitted credential form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub endpoint_name: String,
    #[serde(default)]
    pub endpoint_version: String,
}

impl CredentialForm {
    fn params(&self) -> CredentialParams<'_> {
        CredentialParams {
            name: &self.name,
            base_url: &self.base_url,
            username: &self.username,
            password: &self.password,
            company: &self.company,
            branch: Some(self.branch.as_str()),
            endpoint_name: &self.endpoint_name,
            endpoint_version: &self.endpoint_version,
        }
    }

    fn from_credential(credential: &ErpCredential) -> Self {
        Self {
            name: credential.name.clone(),
            base_url: credential.base_url.clone(),
            username: credential.username.clone(),
            password: String::new(),
            company: credential.company.clone(),
            branch: credential.branch.clone().unwrap_or_default(),
            endpoint_name: credential.endpoint_name.clone(),
            endpoint_version: credential.endpoint_version.clone(),
        }
    }

    /// Re-rendered forms never echo the password back.
    fn without_password(mut self) -> Self {
        self.password.clear();
        self
    }
}

fn success_message(code: &str) -> String {
    match code {
        "created" => "Credential saved.".to_string(),
        "updated" => "Credential updated.".to_string(),
        "selected" => "Credential selected. Sales order pages now use this site.".to_string(),
        "test_passed" => "Connection test successful!".to_string(),
        "deleted" => "Credential deleted.".to_string(),
        _ => format!("Success: {code}"),
    }
}

fn error_message(code: &str) -> String {
    match code {
        "no_credential" => "Select an ERP credential before working with sales orders.".to_string(),
        "not_found" => "That credential no longer exists.".to_string(),
        "auth_failed" => "Login failed. Please check the username, password and company.".to_string(),
        "unreachable" => "The ERP site could not be reached.".to_string(),
        "test_failed" => "Connection test failed.".to_string(),
        _ => format!("Error: {code}"),
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /credentials - Credential list.
#[instrument(skip(state))]
async fn index(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Result<CredentialsIndexTemplate> {
    let credentials = CredentialRepository::new(state.pool()).list().await?;

    Ok(CredentialsIndexTemplate {
        credentials: credentials.iter().map(CredentialView::from).collect(),
        success_message: flash.success.as_deref().map(success_message),
        error_message: flash.error.as_deref().map(error_message),
    })
}

/// GET /credentials/new - New credential form, prefilled with the
/// configured endpoint.
#[instrument(skip(state))]
async fn new_form(State(state): State<AppState>) -> CredentialFormTemplate {
    let erp = &state.config().erp;
    CredentialFormTemplate {
        title: "New credential".to_string(),
        action: "/credentials".to_string(),
        editing: false,
        form: CredentialForm {
            endpoint_name: erp.default_endpoint_name.clone(),
            endpoint_version: erp.default_endpoint_version.clone(),
            ..Default::default()
        },
        errors: Vec::new(),
    }
}

/// POST /credentials - Create a credential.
#[instrument(skip(state, form), fields(name = %form.name))]
async fn create(State(state): State<AppState>, Form(form): Form<CredentialForm>) -> Result<Response> {
    let render = |form: CredentialForm, errors: Vec<String>, status: StatusCode| {
        let page = CredentialFormTemplate {
            title: "New credential".to_string(),
            action: "/credentials".to_string(),
            editing: false,
            form: form.without_password(),
            errors,
        };
        (status, page).into_response()
    };

    let errors = form.params().validate(true);
    if !errors.is_empty() {
        return Ok(render(form, errors, StatusCode::BAD_REQUEST));
    }

    match CredentialRepository::new(state.pool())
        .create(&form.params())
        .await
    {
        Ok(_) => Ok(Redirect::to("/credentials?success=created").into_response()),
        Err(RepositoryError::Conflict(message)) => {
            Ok(render(form, vec![message], StatusCode::CONFLICT))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /credentials/{id}/edit - Edit form. The password field starts empty.
#[instrument(skip(state))]
async fn edit_form(State(state): State<AppState>, Path(id): Path<i32>) -> Result<CredentialFormTemplate> {
    let credential = CredentialRepository::new(state.pool())
        .get(CredentialId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Credential {id}")))?;

    Ok(CredentialFormTemplate {
        title: format!("Edit {}", credential.name),
        action: format!("/credentials/{id}"),
        editing: true,
        form: CredentialForm::from_credential(&credential),
        errors: Vec::new(),
    })
}

/// POST /credentials/{id} - Update a credential. A blank password keeps
/// the stored one.
#[instrument(skip(state, form), fields(name = %form.name))]
async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<CredentialForm>,
) -> Result<Response> {
    let render = |form: CredentialForm, errors: Vec<String>, status: StatusCode| {
        let page = CredentialFormTemplate {
            title: format!("Edit {}", form.name),
            action: format!("/credentials/{id}"),
            editing: true,
            form: form.without_password(),
            errors,
        };
        (status, page).into_response()
    };

    let errors = form.params().validate(false);
    if !errors.is_empty() {
        return Ok(render(form, errors, StatusCode::BAD_REQUEST));
    }

    match CredentialRepository::new(state.pool())
        .update(CredentialId::new(id), &form.params())
        .await
    {
        Ok(_) => Ok(Redirect::to("/credentials?success=updated").into_response()),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("Credential {id}"))),
        Err(RepositoryError::Conflict(message)) => {
            Ok(render(form, vec![message], StatusCode::CONFLICT))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /credentials/{id}/select - Make this the selected credential.
#[instrument(skip(state))]
async fn select(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Redirect> {
    match CredentialRepository::new(state.pool())
        .select(CredentialId::new(id))
        .await
    {
        Ok(()) => Ok(Redirect::to("/credentials?success=selected")),
        Err(RepositoryError::NotFound) => Ok(Redirect::to("/credentials?error=not_found")),
        Err(e) => Err(e.into()),
    }
}

/// POST /credentials/{id}/test - Log in and out with this credential.
#[instrument(skip(state))]
async fn test_connection(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Redirect> {
    let repo = CredentialRepository::new(state.pool());
    let Some(credential) = repo.get(CredentialId::new(id)).await? else {
        return Ok(Redirect::to("/credentials?error=not_found"));
    };

    match state.erp().login(&credential).await {
        Ok(session) => {
            session.logout().await;
            repo.mark_verified(credential.id).await?;
            tracing::info!(credential = %credential.name, "ERP connection test passed");
            Ok(Redirect::to("/credentials?success=test_passed"))
        }
        Err(e) => {
            tracing::warn!(credential = %credential.name, error = %e, "ERP connection test failed");
            let code = match e {
                ErpError::AuthenticationFailed(_) => "auth_failed",
                ref e if e.is_unreachable() => "unreachable",
                _ => "test_failed",
            };
            Ok(Redirect::to(&format!("/credentials?error={code}")))
        }
    }
}

/// POST /credentials/{id}/delete - Delete a credential and its cached orders.
#[instrument(skip(state))]
async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Redirect> {
    if CredentialRepository::new(state.pool())
        .delete(CredentialId::new(id))
        .await?
    {
        Ok(Redirect::to("/credentials?success=deleted"))
    } else {
        Ok(Redirect::to("/credentials?error=not_found"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};

    use super::*;
    use crate::models::credential::test_support::credential;
    use crate::routes::test_support::{body_text, send};

    #[test]
    fn test_view_hides_password() {
        let view = CredentialView::from(&credential("https://erp.example.com"));
        assert_eq!(view.endpoint, "Default/20.200.001");
        assert_eq!(view.last_verified, "Never");

        let page = CredentialsIndexTemplate {
            credentials: vec![view],
            success_message: None,
            error_message: None,
        }
        .render()
        .unwrap();
        assert!(page.contains("https://erp.example.com"));
        assert!(!page.contains("hunter2-but-longer"));
    }

    #[test]
    fn test_flash_codes() {
        assert_eq!(success_message("deleted"), "Credential deleted.");
        assert!(error_message("no_credential").contains("Select an ERP credential"));
        assert_eq!(error_message("weird"), "Error: weird");
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_form_without_database() {
        let response = send(
            Request::post("/credentials")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "name=Demo&base_url=not-a-url&username=admin&password=secret&company=Company&endpoint_name=Default&endpoint_version=20.200.001",
                ))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await;
        assert!(body.contains("Site URL is not a valid URL"));
        assert!(!body.contains("secret"));
    }
}
