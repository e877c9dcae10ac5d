//! Order Desk CLI - Migrations, credential management and cache refresh.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! od-cli migrate
//!
//! # Add an ERP credential (password from ERP_PASSWORD)
//! ERP_PASSWORD=secret od-cli credential add --name Demo \
//!     --url https://erp.example.com/AcumaticaERP --username admin --company Company
//!
//! # List credentials and select one
//! od-cli credential list
//! od-cli credential select Demo
//!
//! # Pull sales orders into the local cache
//! od-cli refresh --order-type SO
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `credential add|list|select` - Manage ERP credentials
//! - `refresh` - Reconcile the sales order cache with the ERP

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "od-cli")]
#[command(author, version, about = "Order Desk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage ERP credentials
    Credential {
        #[command(subcommand)]
        action: CredentialAction,
    },
    /// Refresh the sales order cache from the selected credential's ERP
    Refresh {
        /// Only refresh orders of this type (e.g. SO)
        #[arg(short = 't', long)]
        order_type: Option<String>,
    },
}

#[derive(Subcommand)]
enum CredentialAction {
    /// Add a credential. The password is read from `ERP_PASSWORD`.
    Add {
        /// Display name (unique)
        #[arg(short, long)]
        name: String,

        /// ERP site URL, e.g. `https://erp.example.com/AcumaticaERP`
        #[arg(short, long)]
        url: String,

        /// ERP user name
        #[arg(long)]
        username: String,

        /// Tenant to log in to
        #[arg(short, long)]
        company: String,

        /// Branch to log in to
        #[arg(short, long)]
        branch: Option<String>,

        /// Web service endpoint name
        #[arg(long, default_value = "Default")]
        endpoint: String,

        /// Web service endpoint version
        #[arg(long, default_value = "20.200.001")]
        version: String,
    },
    /// List credentials
    List,
    /// Make a credential the selected one
    Select {
        /// Credential name
        name: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Credential { action } => match action {
            CredentialAction::Add {
                name,
                url,
                username,
                company,
                branch,
                endpoint,
                version,
            } => {
                commands::credential::add(commands::credential::NewCredential {
                    name,
                    url,
                    username,
                    company,
                    branch,
                    endpoint,
                    version,
                })
                .await?;
            }
            CredentialAction::List => commands::credential::list().await?,
            CredentialAction::Select { name } => commands::credential::select(&name).await?,
        },
        Commands::Refresh { order_type } => {
            commands::refresh::run(order_type.as_deref()).await?;
        }
    }
    Ok(())
}
