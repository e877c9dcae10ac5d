//! Order Desk configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORDER_DESK_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `ORDER_DESK_HOST` - Bind address (default: 127.0.0.1)
//! - `ORDER_DESK_PORT` - Listen port (default: 3002)
//! - `ORDER_DESK_BASE_URL` - Public URL (default: `http://{host}:{port}`)
//! - `ORDER_DESK_LOG_JSON` - Emit JSON logs when set
//! - `ERP_TIMEOUT_SECS` - ERP request timeout, 1-300 (default: 30)
//! - `ERP_DEFAULT_ENDPOINT` - Endpoint name prefilled for new credentials (default: Default)
//! - `ERP_DEFAULT_ENDPOINT_VERSION` - Endpoint version prefilled for new credentials (default: 20.200.001)
//! - `ERP_PAGE_SIZE` - Orders fetched per request during a refresh (default: 100)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (TLS)
//! - `ORDER_DESK_TLS_CERT` - PEM-encoded certificate chain
//! - `ORDER_DESK_TLS_KEY` - PEM-encoded private key

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_ENDPOINT_NAME: &str = "Default";
const DEFAULT_ENDPOINT_VERSION: &str = "20.200.001";
const MAX_ERP_TIMEOUT_SECS: u64 = 300;
const MAX_PAGE_SIZE: u32 = 1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Display) -> Self {
        Self::InvalidEnvVar(key.to_string(), reason.to_string())
    }
}

/// Order Desk application configuration.
#[derive(Debug, Clone)]
pub struct OrderDeskConfig {
    /// `PostgreSQL` connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Emit JSON formatted logs
    pub log_json: bool,
    pub erp: ErpConfig,
    pub sentry: SentryConfig,
    /// HTTPS is served only when both PEMs are configured.
    pub tls: Option<TlsConfig>,
}

/// ERP client settings shared by every credential.
#[derive(Debug, Clone)]
pub struct ErpConfig {
    /// Timeout applied to every ERP request.
    pub timeout: Duration,
    /// Endpoint name prefilled on the new-credential form.
    pub default_endpoint_name: String,
    /// Endpoint version prefilled on the new-credential form.
    pub default_endpoint_version: String,
    /// `$top` used when listing orders during a refresh.
    pub page_size: u32,
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            default_endpoint_name: DEFAULT_ENDPOINT_NAME.to_string(),
            default_endpoint_version: DEFAULT_ENDPOINT_VERSION.to_string(),
            page_size: 100,
        }
    }
}

impl ErpConfig {
    /// Load the ERP settings alone, for tools that do not serve HTTP.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = parse_env("ERP_TIMEOUT_SECS", 30)?;
        if !(1..=MAX_ERP_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(ConfigError::invalid(
                "ERP_TIMEOUT_SECS",
                format!("must be between 1 and {MAX_ERP_TIMEOUT_SECS}"),
            ));
        }

        let page_size: u32 = parse_env("ERP_PAGE_SIZE", 100)?;
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ConfigError::invalid(
                "ERP_PAGE_SIZE",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }

        Ok(Self {
            timeout: Duration::from_secs(timeout_secs),
            default_endpoint_name: get_optional_env("ERP_DEFAULT_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_ENDPOINT_NAME.to_string()),
            default_endpoint_version: get_optional_env("ERP_DEFAULT_ENDPOINT_VERSION")
                .unwrap_or_else(|| DEFAULT_ENDPOINT_VERSION.to_string()),
            page_size,
        })
    }
}

/// Sentry error tracking. Disabled without a DSN.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    /// e.g. "development", "production"
    pub environment: Option<String>,
    /// Error sample rate (0.0 to 1.0)
    pub sample_rate: f32,
    /// Performance traces sample rate (0.0 to 1.0)
    pub traces_sample_rate: f32,
}

impl SentryConfig {
    fn from_env() -> Self {
        Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env("SENTRY_SAMPLE_RATE", 1.0).unwrap_or(1.0),
            traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", 0.1).unwrap_or(0.1),
        }
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        match (
            get_optional_env("ORDER_DESK_TLS_CERT"),
            get_optional_env("ORDER_DESK_TLS_KEY"),
        ) {
            (Some(cert_pem), Some(key)) => Ok(Some(Self {
                cert_pem,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::invalid(
                "ORDER_DESK_TLS_*",
                "ORDER_DESK_TLS_CERT and ORDER_DESK_TLS_KEY must be set together",
            )),
        }
    }
}

impl OrderDeskConfig {
    /// Load configuration from the environment, reading `.env` first if
    /// present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = get_database_url("ORDER_DESK_DATABASE_URL")?;
        let host: IpAddr = parse_env("ORDER_DESK_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port: u16 = parse_env("ORDER_DESK_PORT", 3002)?;
        let base_url = get_optional_env("ORDER_DESK_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));
        url::Url::parse(&base_url).map_err(|e| ConfigError::invalid("ORDER_DESK_BASE_URL", e))?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            log_json: get_optional_env("ORDER_DESK_LOG_JSON").is_some(),
            erp: ErpConfig::from_env()?,
            sentry: SentryConfig::from_env(),
            tls: TlsConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Database URL from `primary_key`, falling back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    get_optional_env(primary_key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse `key`, or return `default` when it is unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|e| ConfigError::invalid(key, e))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> OrderDeskConfig {
        OrderDeskConfig {
            database_url: SecretString::from("postgres://localhost/order_desk_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3002,
            base_url: "http://localhost:3002".to_string(),
            log_json: false,
            erp: ErpConfig::default(),
            sentry: SentryConfig::default(),
            tls: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3002);
    }

    #[test]
    fn test_erp_config_defaults() {
        let erp = ErpConfig::default();
        assert_eq!(erp.timeout, Duration::from_secs(30));
        assert_eq!(erp.default_endpoint_name, "Default");
        assert_eq!(erp.default_endpoint_version, "20.200.001");
        assert_eq!(erp.page_size, 100);
    }

    #[test]
    fn test_parse_env_default_and_error() {
        assert_eq!(parse_env::<u16>("ORDER_DESK_TEST_UNSET_PORT", 3002).unwrap(), 3002);
        let err = ConfigError::invalid("ORDER_DESK_PORT", "bad");
        assert_eq!(err.to_string(), "Invalid environment variable ORDER_DESK_PORT: bad");
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let debug_output = format!("{:?}", test_config());
        assert!(!debug_output.contains("order_desk_test"));
    }

    #[test]
    fn test_tls_config_debug_redacts_key() {
        let tls = TlsConfig {
            cert_pem: "-----BEGIN CERTIFICATE-----".to_string(),
            key_pem: SecretString::from("super_secret_private_key"),
        };

        let debug_output = format!("{tls:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_private_key"));
        assert!(!debug_output.contains("BEGIN CERTIFICATE"));
    }
}
