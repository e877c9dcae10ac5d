//! ERP site credential model.

use chrono::{DateTime, Utc};
use order_desk_core::CredentialId;
use secrecy::SecretString;

/// Connection settings for one ERP site.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct ErpCredential {
    /// Database ID.
    pub id: CredentialId,
    /// Display name, unique.
    pub name: String,
    /// Site root, e.g. `https://erp.example.com/AcumaticaERP`.
    pub base_url: String,
    /// ERP user name.
    pub username: String,
    /// ERP password.
    pub password: SecretString,
    /// Tenant (company) to log in to.
    pub company: String,
    /// Branch to log in to, if the tenant has several.
    pub branch: Option<String>,
    /// Web service endpoint name (e.g. `Default`).
    pub endpoint_name: String,
    /// Web service endpoint version (e.g. `20.200.001`).
    pub endpoint_version: String,
    /// Whether this is the credential used by the sales order pages.
    pub is_selected: bool,
    /// Last successful test login.
    pub last_verified_at: Option<DateTime<Utc>>,
    /// When the credential was created.
    pub created_at: DateTime<Utc>,
    /// When the credential was last changed.
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for ErpCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErpCredential")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("company", &self.company)
            .field("branch", &self.branch)
            .field("endpoint_name", &self.endpoint_name)
            .field("endpoint_version", &self.endpoint_version)
            .field("is_selected", &self.is_selected)
            .field("last_verified_at", &self.last_verified_at)
            .finish_non_exhaustive()
    }
}

impl ErpCredential {
    /// Site root without a trailing slash.
    #[must_use]
    pub fn site_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Root of the contract-based entity endpoint,
    /// `{site}/entity/{endpoint}/{version}`.
    #[must_use]
    pub fn entity_root(&self) -> String {
        format!(
            "{}/entity/{}/{}",
            self.site_root(),
            self.endpoint_name.trim_matches('/'),
            self.endpoint_version.trim_matches('/')
        )
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A credential pointing at `base_url`, for client and route tests.
    #[must_use]
    pub fn credential(base_url: &str) -> ErpCredential {
        ErpCredential {
            id: CredentialId::new(1),
            name: "Demo".to_string(),
            base_url: base_url.to_string(),
            username: "admin".to_string(),
            password: SecretString::from("hunter2-but-longer"),
            company: "Company".to_string(),
            branch: None,
            endpoint_name: "Default".to_string(),
            endpoint_version: "20.200.001".to_string(),
            is_selected: true,
            last_verified_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
