//! MedSupply CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply marketplace database migrations
//! ms-cli migrate
//!
//! # Upsert categories from a YAML file
//! ms-cli seed categories --file seed/categories.yaml
//!
//! # Promote an existing profile to admin
//! ms-cli admin grant --user 6a1f0e4c-2b55-4c1e-9a0e-3d1c8e2f7b90
//! ```
//!
//! # Environment Variables
//!
//! - `MARKETPLACE_DATABASE_URL` - `PostgreSQL` connection string (falls back
//!   to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(name = "ms-cli")]
#[command(author, version, about = "MedSupply CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert product categories by name
    Categories {
        /// Path to the YAML file
        #[arg(short, long)]
        file: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Give an existing profile the admin role
    Grant {
        /// Profile (auth user) ID
        #[arg(short, long)]
        user: Uuid,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Categories { file } => {
                commands::seed::categories(&file).await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Grant { user } => commands::admin::grant(user).await?,
        },
    }
    Ok(())
}
