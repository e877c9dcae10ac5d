//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before an error page is rendered; internal details are
//! never shown to the client.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::erp::{ConversionError, ErpError};
use crate::filters;
use crate::services::SyncError;

/// Application-level error type for Order Desk.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// ERP call failed.
    #[error("ERP error: {0}")]
    Erp(#[from] ErpError),

    /// The ERP returned data that could not be read.
    #[error("ERP data error: {0}")]
    ErpData(#[from] ConversionError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::NoCredentialSelected => {
                Self::BadRequest("No ERP credential is selected".to_string())
            }
            SyncError::NotFound(key) => Self::NotFound(format!("Sales order {key}")),
            SyncError::Invalid(errors) => Self::BadRequest(errors.join("; ")),
            SyncError::Erp(e) => Self::Erp(e),
            SyncError::Conversion(e) => Self::ErpData(e),
            SyncError::Repository(e) => Self::Database(e),
        }
    }
}

/// Error page.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub title: String,
    pub message: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Erp(ErpError::RateLimited(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Erp(ErpError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Erp(_) | Self::ErpData(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show to the user.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) => "Internal server error".to_string(),
            Self::Erp(ErpError::Http(_)) => "The ERP site could not be reached.".to_string(),
            Self::Erp(ErpError::AuthenticationFailed(_)) => {
                "The ERP rejected the selected credential.".to_string()
            }
            Self::Erp(ErpError::EndpointNotFound(_)) => {
                "The ERP endpoint configured for this credential does not exist.".to_string()
            }
            Self::Erp(e @ (ErpError::Validation(_) | ErpError::RateLimited(_))) => e.to_string(),
            Self::Erp(_) | Self::ErpData(_) => "External service error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Erp(_) | Self::ErpData(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let page = ErrorTemplate {
            status: status.as_u16(),
            title: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: self.public_message(),
        };

        (status, page).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
