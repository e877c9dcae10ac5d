//! ERP REST client and per-credential sessions.

use std::time::Duration;

use order_desk_core::SalesOrderKey;
use serde::Deserialize;
use tracing::instrument;

use super::auth;
use super::query::ListOptions;
use super::types::{SalesOrderEntity, collect_field_errors};
use super::ErpError;
use crate::models::ErpCredential;

const SALES_ORDER_ENTITY: &str = "SalesOrder";

/// Message the ERP returns (with a 500) when a key lookup matches nothing.
const NO_ENTITY_MESSAGE: &str = "No entity satisfies the condition";

/// Shared ERP client settings.
///
/// Sessions are opened per request with [`ErpClient::login`]; nothing here
/// holds credentials or cookies.
#[derive(Debug, Clone)]
pub struct ErpClient {
    timeout: Duration,
}

impl ErpClient {
    /// Create a client whose sessions use `timeout` for every request.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Open a session for `credential`.
    ///
    /// # Errors
    ///
    /// Returns `ErpError::AuthenticationFailed` if the login is rejected,
    /// `ErpError::Http` if the site cannot be reached, or another `ErpError`
    /// for any other failure status.
    #[instrument(skip(self, credential), fields(credential = %credential.name))]
    pub async fn login(&self, credential: &ErpCredential) -> Result<ErpSession, ErpError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .build()?;

        auth::login(&http, credential).await?;

        Ok(ErpSession {
            http,
            site_root: credential.site_root().to_string(),
            entity_root: credential.entity_root(),
        })
    }
}

/// A logged-in ERP session.
///
/// Cloning shares the cookie store. Call [`ErpSession::logout`] when done.
#[derive(Debug, Clone)]
pub struct ErpSession {
    http: reqwest::Client,
    site_root: String,
    entity_root: String,
}

/// Error body of non-success entity responses.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "exceptionMessage")]
    exception_message: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErpSession {
    fn collection_url(&self) -> String {
        format!("{}/{SALES_ORDER_ENTITY}", self.entity_root)
    }

    fn key_url(&self, key: &SalesOrderKey) -> String {
        format!(
            "{}/{SALES_ORDER_ENTITY}/{}/{}",
            self.entity_root,
            urlencoding::encode(key.order_type.code()),
            urlencoding::encode(&key.order_nbr)
        )
    }

    /// List sales orders.
    ///
    /// # Errors
    ///
    /// Returns `ErpError::EndpointNotFound` if the endpoint name/version does
    /// not exist on the site, or another `ErpError` on failure.
    #[instrument(skip(self))]
    pub async fn list_sales_orders(
        &self,
        options: &ListOptions,
    ) -> Result<Vec<SalesOrderEntity>, ErpError> {
        let response = self
            .http
            .get(self.collection_url())
            .query(&options.query_pairs())
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ErpError::EndpointNotFound(self.entity_root.clone()));
        }

        let response = check_status(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch one sales order by key. Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ErpError` on any failure other than "not found".
    #[instrument(skip(self), fields(key = %key))]
    pub async fn get_sales_order(
        &self,
        key: &SalesOrderKey,
        expand_details: bool,
    ) -> Result<Option<SalesOrderEntity>, ErpError> {
        let mut request = self.http.get(self.key_url(key));
        if expand_details {
            request = request.query(&[("$expand", "Details")]);
        }
        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        match check_status(response).await {
            Ok(response) => {
                let body = response.text().await?;
                Ok(Some(serde_json::from_str(&body)?))
            }
            Err(ErpError::Api { message, .. }) if message.contains(NO_ENTITY_MESSAGE) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create or update a sales order. The ERP matches on the key fields
    /// carried by `entity`; without an `OrderNbr` it assigns a new number.
    ///
    /// Returns the saved entity including its lines.
    ///
    /// # Errors
    ///
    /// Returns `ErpError::Validation` with the ERP's field messages if the
    /// order is rejected, or another `ErpError` on failure.
    #[instrument(skip(self, entity))]
    pub async fn put_sales_order(
        &self,
        entity: &SalesOrderEntity,
    ) -> Result<SalesOrderEntity, ErpError> {
        let response = self
            .http
            .put(self.collection_url())
            .query(&[("$expand", "Details")])
            .json(entity)
            .send()
            .await?;

        let response = check_status(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Delete a sales order. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `ErpError` on any failure other than "not found".
    #[instrument(skip(self), fields(key = %key))]
    pub async fn delete_sales_order(&self, key: &SalesOrderKey) -> Result<bool, ErpError> {
        let response = self.http.delete(self.key_url(key)).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }

        match check_status(response).await {
            Ok(_) => Ok(true),
            Err(ErpError::Api { message, .. }) if message.contains(NO_ENTITY_MESSAGE) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// End the session.
    pub async fn logout(&self) {
        auth::logout(&self.http, &self.site_root).await;
    }
}

/// Map non-success responses to `ErpError`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ErpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        reqwest::StatusCode::UNAUTHORIZED => Err(ErpError::SessionExpired),
        reqwest::StatusCode::TOO_MANY_REQUESTS => Err(ErpError::RateLimited(retry_after(&response))),
        reqwest::StatusCode::UNPROCESSABLE_ENTITY => {
            let text = response.text().await.unwrap_or_default();
            let mut errors = serde_json::from_str::<serde_json::Value>(&text)
                .map(|body| collect_field_errors(&body))
                .unwrap_or_default();
            if errors.is_empty() {
                errors.push(error_message(&text));
            }
            Err(ErpError::Validation(errors))
        }
        _ => {
            let text = response.text().await.unwrap_or_default();
            Err(ErpError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            })
        }
    }
}

/// Seconds from the `Retry-After` header, 60 when absent or unreadable.
pub(super) fn retry_after(response: &reqwest::Response) -> u64 {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(60)
}

/// Best human-readable message from an error body.
pub(super) fn error_message(text: &str) -> String {
    if let Ok(body) = serde_json::from_str::<ErrorBody>(text)
        && let Some(message) = body.exception_message.or(body.message)
    {
        return message;
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.chars().take(500).collect()
    }
}
