//! ERP credential commands.
//!
//! # Usage
//!
//! ```bash
//! # Add a credential (the first one added is selected automatically)
//! ERP_PASSWORD=secret od-cli credential add -n Demo \
//!     -u https://erp.example.com/AcumaticaERP --username admin -c Company
//!
//! # List credentials
//! od-cli credential list
//!
//! # Select the credential the sales order pages use
//! od-cli credential select Demo
//! ```
//!
//! # Environment Variables
//!
//! - `ORDER_DESK_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `ERP_PASSWORD` - Password for `credential add`

use order_desk_web::db::{CredentialParams, CredentialRepository};
use secrecy::{ExposeSecret, SecretString};

use super::{CliError, connect};

/// Arguments of `credential add`.
#[derive(Debug)]
pub struct NewCredential {
    pub name: String,
    pub url: String,
    pub username: String,
    pub company: String,
    pub branch: Option<String>,
    pub endpoint: String,
    pub version: String,
}

/// Add a credential.
///
/// # Returns
///
/// The ID of the created credential.
///
/// # Errors
///
/// Returns `CliError::MissingEnvVar` if `ERP_PASSWORD` is unset,
/// `CliError::Invalid` if the arguments fail validation, or a database error.
pub async fn add(args: NewCredential) -> Result<i32, CliError> {
    dotenvy::dotenv().ok();

    let password = std::env::var("ERP_PASSWORD")
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("ERP_PASSWORD"))?;

    let params = CredentialParams {
        name: &args.name,
        base_url: &args.url,
        username: &args.username,
        password: password.expose_secret(),
        company: &args.company,
        branch: args.branch.as_deref(),
        endpoint_name: &args.endpoint,
        endpoint_version: &args.version,
    };
    let errors = params.validate(true);
    if !errors.is_empty() {
        return Err(CliError::Invalid(errors));
    }

    let pool = connect().await?;
    let credential = CredentialRepository::new(&pool).create(&params).await?;

    tracing::info!(
        "Credential created! ID: {}, Name: {}, Selected: {}",
        credential.id,
        credential.name,
        credential.is_selected
    );
    Ok(credential.id.as_i32())
}

/// Print all credentials. The selected one is marked with `*`.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list() -> Result<(), CliError> {
    let pool = connect().await?;
    let credentials = CredentialRepository::new(&pool).list().await?;

    if credentials.is_empty() {
        tracing::info!("No credentials. Add one with 'od-cli credential add'.");
        return Ok(());
    }

    #[allow(clippy::print_stdout)]
    for credential in &credentials {
        println!(
            "{} {:>4}  {:<20} {:<50} {}@{}",
            if credential.is_selected { "*" } else { " " },
            credential.id.as_i32(),
            credential.name,
            credential.base_url,
            credential.username,
            credential.company
        );
    }
    Ok(())
}

/// Select a credential by name.
///
/// # Errors
///
/// Returns `CliError::NotFound` if no credential has that name.
pub async fn select(name: &str) -> Result<(), CliError> {
    let pool = connect().await?;
    let repo = CredentialRepository::new(&pool);

    let credential = repo
        .get_by_name(name)
        .await?
        .ok_or_else(|| CliError::NotFound(format!("credential '{name}'")))?;
    repo.select(credential.id).await?;

    tracing::info!("Selected credential '{}'", credential.name);
    Ok(())
}
