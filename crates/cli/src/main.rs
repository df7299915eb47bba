//! Inkwave CLI - Database migrations and operational tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! iw-cli migrate
//!
//! # Seed the catalog with demo products
//! iw-cli seed
//!
//! # Cancel remote drafts for abandoned draft-stage orders
//! iw-cli cleanup --max-age-hours 24
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the catalog with demo products
//! - `cleanup` - Run one abandonment sweep against live gateways

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "iw-cli")]
#[command(author, version, about = "Inkwave CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog with demo products
    Seed,
    /// Cancel remote drafts for abandoned draft-stage orders
    Cleanup {
        /// Age threshold in hours
        #[arg(long, default_value_t = 24)]
        max_age_hours: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Cleanup { max_age_hours } => commands::cleanup::run(max_age_hours).await?,
    }
    Ok(())
}
