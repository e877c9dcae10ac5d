//! Acumatica contract-based REST API client.
//!
//! # Architecture
//!
//! - Cookie sessions: `POST /entity/auth/login` sets the session cookie, every
//!   entity call reuses it, `POST /entity/auth/logout` releases the license
//!   seat. Each [`ErpSession`] owns its own cookie store.
//! - Entities live under `{site}/entity/{endpoint}/{version}/{Entity}`.
//! - Every scalar field is wrapped as `{"value": ...}` (see [`types::Value`]).
//!
//! The client never touches the database; [`crate::services::sync`] glues it
//! to the local cache.

pub mod auth;
pub mod client;
pub mod conversions;
pub mod query;
pub mod types;

pub use client::{ErpClient, ErpSession};
pub use conversions::ConversionError;
pub use query::ListOptions;
pub use types::{SalesOrderDetailEntity, SalesOrderEntity, Value};

use thiserror::Error;

/// Errors that can occur when talking to the ERP.
#[derive(Debug, Error)]
pub enum ErpError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Login was rejected.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The session cookie is no longer accepted.
    #[error("ERP session expired")]
    SessionExpired,

    /// The configured endpoint name/version does not exist on the site.
    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    /// The ERP rejected the submitted entity.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Rate limited by the ERP.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response.
    #[error("ERP returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },
}

impl ErpError {
    /// Whether the ERP could not be reached at all: connect failure,
    /// timeout, broken connection, or a gateway status from a proxy in
    /// front of the site.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Api { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ErpError::Validation(vec![
            "CustomerID: 'Customer' cannot be empty.".to_string(),
            "Details #1 / InventoryID: Item not found.".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: CustomerID: 'Customer' cannot be empty.; Details #1 / InventoryID: Item not found."
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = ErpError::Api {
            status: 500,
            message: "Operation failed".to_string(),
        };
        assert_eq!(err.to_string(), "ERP returned 500: Operation failed");
    }

    #[test]
    fn test_gateway_statuses_are_unreachable() {
        let api = |status| ErpError::Api {
            status,
            message: String::new(),
        };
        assert!(api(502).is_unreachable());
        assert!(api(504).is_unreachable());
        assert!(!api(500).is_unreachable());
        assert!(!ErpError::AuthenticationFailed("no".to_string()).is_unreachable());
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ErpError::RateLimited(30);
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
        assert!(!err.is_unreachable());
    }
}
