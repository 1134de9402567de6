//! Bagworks CLI - admin accounts, data files, and database checks.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin account (password from BW_ADMIN_PASSWORD or stdin)
//! bw-cli admin create -e admin@example.com -n "Admin Name" -r super_admin
//!
//! # List or remove admin accounts
//! bw-cli admin list
//! bw-cli admin remove -e admin@example.com
//!
//! # Check every collection file under DATA_DIR
//! bw-cli data check
//!
//! # Load products and blog posts from a YAML file
//! bw-cli data seed catalog.yaml
//!
//! # Check the MySQL connection
//! bw-cli db ping
//! ```
//!
//! # Commands
//!
//! - `admin` - Manage accounts in `admins.json`
//! - `data` - Inspect and seed the JSON collections
//! - `db` - `MySQL` connectivity

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bw-cli")]
#[command(author, version, about = "Bagworks CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Inspect and seed the JSON data files
    Data {
        #[command(subcommand)]
        action: DataAction,
    },
    /// Check the optional `MySQL` database
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`, `viewer`)
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
    /// List admin accounts
    List,
    /// Remove an admin account
    Remove {
        /// Admin email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum DataAction {
    /// Report record counts and flag unreadable collection files
    Check,
    /// Add products and blog posts from a YAML file
    Seed {
        /// Path to the YAML seed file
        file: String,

        /// Replace the records of each collection present in the file
        #[arg(long)]
        replace: bool,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Run `SELECT 1` against the configured database
    Ping,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Admin { action } => match action {
            AdminAction::Create { email, name, role } => {
                commands::admin::create(&email, &name, &role).await?;
            }
            AdminAction::List => commands::admin::list().await?,
            AdminAction::Remove { email } => commands::admin::remove(&email).await?,
        },
        Commands::Data { action } => match action {
            DataAction::Check => commands::data::check().await?,
            DataAction::Seed { file, replace } => commands::data::seed(&file, replace).await?,
        },
        Commands::Db { action } => match action {
            DbAction::Ping => commands::db::ping().await?,
        },
    }
    Ok(())
}
