//! Kool Data Hub CLI - Migrations, one-shot syncs and user management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! kdh-cli migrate
//!
//! # Sync one Zoho resource now
//! kdh-cli sync invoices
//!
//! # Sync every Zoho resource
//! kdh-cli sync all
//!
//! # Create a user (password from KDH_USER_PASSWORD)
//! kdh-cli user create -u ops -e ops@example.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `sync` - Run Zoho sync jobs outside the scheduler
//! - `user create` - Create user accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use kool_data_hub_server::sync::CommitMode;

mod commands;

#[derive(Parser)]
#[command(name = "kdh-cli")]
#[command(author, version, about = "Kool Data Hub CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Run Zoho sync jobs now
    Sync {
        /// Resource name (e.g. `sales_orders`) or `all`
        target: String,

        /// Commit mode (`strict` or `best_effort`)
        #[arg(short, long, default_value = "strict")]
        mode: CommitMode,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Username (3 to 50 characters)
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(short, long)]
        first_name: Option<String>,

        /// Last name
        #[arg(short, long)]
        last_name: Option<String>,
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
        Commands::Sync { target, mode } => commands::sync::run(&target, mode).await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                first_name,
                last_name,
            } => commands::user::create(username, email, first_name, last_name).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_with_mode() {
        let cli = Cli::try_parse_from(["kdh-cli", "sync", "all", "--mode", "best_effort"])
            .expect("parse");
        match cli.command {
            Commands::Sync { target, mode } => {
                assert_eq!(target, "all");
                assert_eq!(mode, CommitMode::BestEffort);
            }
            _ => panic!("expected sync"),
        }
    }
}
