//! ERP session login and logout.

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ErpError;
use super::client::{error_message, retry_after};
use crate::models::ErpCredential;

/// Request body for `POST /entity/auth/login`.
#[derive(Serialize)]
struct LoginRequest<'a> {
    name: &'a str,
    password: &'a str,
    company: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// Error body returned by the login endpoint.
#[derive(Deserialize)]
struct LoginErrorResponse {
    #[serde(default, rename = "exceptionMessage")]
    exception_message: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Log in with a credential. On success the session cookie is held by the
/// client's cookie store.
///
/// # Errors
///
/// Returns `ErpError::AuthenticationFailed` for 401/403 and for a 500 that
/// carries an exception message, `ErpError::RateLimited` for 429,
/// `ErpError::Api` for any other failure status, or `ErpError::Http` if the
/// site cannot be reached.
#[instrument(skip(client, credential), fields(credential = %credential.name))]
pub async fn login(client: &reqwest::Client, credential: &ErpCredential) -> Result<(), ErpError> {
    let response = client
        .post(format!("{}/entity/auth/login", credential.site_root()))
        .json(&LoginRequest {
            name: &credential.username,
            password: credential.password.expose_secret(),
            company: &credential.company,
            branch: credential.branch.as_deref(),
        })
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ErpError::RateLimited(retry_after(&response)));
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<LoginErrorResponse>(&text).ok();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            let message = body
                .and_then(|b| b.exception_message.or(b.message))
                .unwrap_or_else(|| format!("HTTP {status}"));
            Err(ErpError::AuthenticationFailed(message))
        }
        StatusCode::INTERNAL_SERVER_ERROR => match body.and_then(|b| b.exception_message) {
            Some(message) => Err(ErpError::AuthenticationFailed(message)),
            None => Err(ErpError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            }),
        },
        StatusCode::NOT_FOUND => Err(ErpError::Api {
            status: status.as_u16(),
            message: format!(
                "login endpoint not found at {}; check the site URL",
                credential.site_root()
            ),
        }),
        _ => Err(ErpError::Api {
            status: status.as_u16(),
            message: error_message(&text),
        }),
    }
}

/// End a session. Failures are logged, never returned.
#[instrument(skip(client))]
pub async fn logout(client: &reqwest::Client, site_root: &str) {
    match client
        .post(format!("{site_root}/entity/auth/logout"))
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => {
            tracing::debug!("ERP session closed");
        }
        Ok(response) => {
            tracing::warn!(status = %response.status(), "ERP logout rejected");
        }
        Err(e) => {
            tracing::warn!(error = %e, "ERP logout failed");
        }
    }
}
