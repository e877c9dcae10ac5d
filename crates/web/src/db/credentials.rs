//! ERP credential repository.
//!
//! Stores the site connection settings and tracks which credential the sales
//! order pages use. The "selected" flag is exclusive: a partial unique index
//! allows at most one selected row, and [`CredentialRepository::select`]
//! moves the flag inside a transaction.

use chrono::{DateTime, Utc};
use order_desk_core::CredentialId;
use secrecy::SecretString;
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;
use crate::models::ErpCredential;

const SELECTED_INDEX: &str = "erp_credentials_single_selected";

// =============================================================================
// Types
// =============================================================================

/// Internal row type for `PostgreSQL` queries.
#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: i32,
    name: String,
    base_url: String,
    username: String,
    password: String,
    company: String,
    branch: Option<String>,
    endpoint_name: String,
    endpoint_version: String,
    is_selected: bool,
    last_verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CredentialRow> for ErpCredential {
    fn from(row: CredentialRow) -> Self {
        Self {
            id: CredentialId::new(row.id),
            name: row.name,
            base_url: row.base_url,
            username: row.username,
            password: SecretString::from(row.password),
            company: row.company,
            branch: row.branch,
            endpoint_name: row.endpoint_name,
            endpoint_version: row.endpoint_version,
            is_selected: row.is_selected,
            last_verified_at: row.last_verified_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Parameters for creating or updating a credential.
#[derive(Debug)]
pub struct CredentialParams<'a> {
    /// Display name.
    pub name: &'a str,
    /// Site root URL.
    pub base_url: &'a str,
    /// ERP user name.
    pub username: &'a str,
    /// ERP password. On update, an empty string keeps the stored password.
    pub password: &'a str,
    /// Tenant name.
    pub company: &'a str,
    /// Optional branch.
    pub branch: Option<&'a str>,
    /// Endpoint name.
    pub endpoint_name: &'a str,
    /// Endpoint version.
    pub endpoint_version: &'a str,
}

impl CredentialParams<'_> {
    /// Check the parameters before they are stored.
    ///
    /// Returns one message per problem; an empty list means valid.
    /// `require_password` is `true` for new credentials.
    #[must_use]
    pub fn validate(&self, require_password: bool) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Name is required".to_string());
        }
        match url::Url::parse(self.base_url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {}
            Ok(_) => errors.push("Site URL must be an http(s) URL".to_string()),
            Err(_) => errors.push("Site URL is not a valid URL".to_string()),
        }
        if self.username.trim().is_empty() {
            errors.push("Username is required".to_string());
        }
        if require_password && self.password.is_empty() {
            errors.push("Password is required".to_string());
        }
        if self.company.trim().is_empty() {
            errors.push("Company is required".to_string());
        }
        if self.endpoint_name.trim().is_empty() || self.endpoint_name.contains('/') {
            errors.push("Endpoint name is required and cannot contain '/'".to_string());
        }
        if self.endpoint_version.trim().is_empty() || self.endpoint_version.contains('/') {
            errors.push("Endpoint version is required and cannot contain '/'".to_string());
        }

        errors
    }
}

fn map_write_error(err: sqlx::Error, name: &str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
    {
        if db_err.constraint() == Some(SELECTED_INDEX) {
            return RepositoryError::Conflict(
                "another credential was selected concurrently".to_string(),
            );
        }
        return RepositoryError::Conflict(format!("a credential named '{name}' already exists"));
    }
    RepositoryError::Database(err)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for ERP credential database operations.
pub struct CredentialRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CredentialRepository<'a> {
    /// Create a new credential repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all credentials ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<ErpCredential>, RepositoryError> {
        let rows = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, name, base_url, username, password, company, branch,
                   endpoint_name, endpoint_version, is_selected,
                   last_verified_at, created_at, updated_at
            FROM erp_credentials
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ErpCredential::from).collect())
    }

    /// Get a credential by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CredentialId) -> Result<Option<ErpCredential>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, name, base_url, username, password, company, branch,
                   endpoint_name, endpoint_version, is_selected,
                   last_verified_at, created_at, updated_at
            FROM erp_credentials
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ErpCredential::from))
    }

    /// Get a credential by its unique name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<ErpCredential>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, name, base_url, username, password, company, branch,
                   endpoint_name, endpoint_version, is_selected,
                   last_verified_at, created_at, updated_at
            FROM erp_credentials
            WHERE name = $1
            ",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ErpCredential::from))
    }

    /// Get the credential the sales order pages should use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_selected(&self) -> Result<Option<ErpCredential>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, name, base_url, username, password, company, branch,
                   endpoint_name, endpoint_version, is_selected,
                   last_verified_at, created_at, updated_at
            FROM erp_credentials
            WHERE is_selected
            ",
        )
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ErpCredential::from))
    }

    /// Create a credential.
    ///
    /// The new credential is selected when no other credential is.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    #[instrument(skip(self, params), fields(name = %params.name))]
    pub async fn create(
        &self,
        params: &CredentialParams<'_>,
    ) -> Result<ErpCredential, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            INSERT INTO erp_credentials (
                name, base_url, username, password, company, branch,
                endpoint_name, endpoint_version, is_selected
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8,
                NOT EXISTS (SELECT 1 FROM erp_credentials WHERE is_selected)
            )
            RETURNING id, name, base_url, username, password, company, branch,
                      endpoint_name, endpoint_version, is_selected,
                      last_verified_at, created_at, updated_at
            ",
        )
        .bind(params.name.trim())
        .bind(params.base_url.trim())
        .bind(params.username.trim())
        .bind(params.password)
        .bind(params.company.trim())
        .bind(params.branch.map(str::trim).filter(|b| !b.is_empty()))
        .bind(params.endpoint_name.trim())
        .bind(params.endpoint_version.trim())
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, params.name))?;

        let credential = ErpCredential::from(row);
        tracing::info!(
            credential_id = %credential.id,
            selected = credential.is_selected,
            "Created ERP credential"
        );
        Ok(credential)
    }

    /// Update a credential. An empty password keeps the stored one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the credential does not exist,
    /// or `RepositoryError::Conflict` if the new name is taken.
    #[instrument(skip(self, params), fields(name = %params.name))]
    pub async fn update(
        &self,
        id: CredentialId,
        params: &CredentialParams<'_>,
    ) -> Result<ErpCredential, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            UPDATE erp_credentials
            SET name = $2,
                base_url = $3,
                username = $4,
                password = CASE WHEN $5 = '' THEN password ELSE $5 END,
                company = $6,
                branch = $7,
                endpoint_name = $8,
                endpoint_version = $9,
                last_verified_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, base_url, username, password, company, branch,
                      endpoint_name, endpoint_version, is_selected,
                      last_verified_at, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(params.name.trim())
        .bind(params.base_url.trim())
        .bind(params.username.trim())
        .bind(params.password)
        .bind(params.company.trim())
        .bind(params.branch.map(str::trim).filter(|b| !b.is_empty()))
        .bind(params.endpoint_name.trim())
        .bind(params.endpoint_version.trim())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_write_error(e, params.name))?;

        row.map(ErpCredential::from).ok_or(RepositoryError::NotFound)
    }

    /// Make `id` the selected credential, clearing the flag everywhere else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the credential does not exist;
    /// nothing is changed in that case.
    #[instrument(skip(self))]
    pub async fn select(&self, id: CredentialId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM erp_credentials WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r"
            UPDATE erp_credentials
            SET is_selected = FALSE, updated_at = NOW()
            WHERE is_selected AND id <> $1
            ",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE erp_credentials
            SET is_selected = TRUE, updated_at = NOW()
            WHERE id = $1 AND NOT is_selected
            ",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(credential_id = %id, "Selected ERP credential");
        Ok(())
    }

    /// Record a successful test login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_verified(&self, id: CredentialId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE erp_credentials SET last_verified_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Delete a credential together with its cached orders.
    ///
    /// Returns `false` if the credential did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CredentialId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM erp_credentials WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params<'a>() -> CredentialParams<'a> {
        CredentialParams {
            name: "Demo",
            base_url: "https://erp.example.com/AcumaticaERP",
            username: "admin",
            password: "s3cret!",
            company: "Company",
            branch: None,
            endpoint_name: "Default",
            endpoint_version: "20.200.001",
        }
    }

    #[test]
    fn test_validate_accepts_complete_params() {
        assert!(params().validate(true).is_empty());
    }

    #[test]
    fn test_validate_password_only_required_on_create() {
        let p = CredentialParams {
            password: "",
            ..params()
        };
        assert_eq!(p.validate(true), vec!["Password is required".to_string()]);
        assert!(p.validate(false).is_empty());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let p = CredentialParams {
            base_url: "ftp://erp.example.com",
            ..params()
        };
        assert_eq!(
            p.validate(true),
            vec!["Site URL must be an http(s) URL".to_string()]
        );

        let p = CredentialParams {
            base_url: "not a url",
            ..params()
        };
        assert_eq!(
            p.validate(true),
            vec!["Site URL is not a valid URL".to_string()]
        );
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let p = CredentialParams {
            name: " ",
            username: "",
            company: "",
            endpoint_version: "20.200/001",
            ..params()
        };
        assert_eq!(p.validate(true).len(), 4);
    }
}
