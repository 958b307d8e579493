//! NestSync CLI - operational interface for the collection sync engine.

mod commands;
mod config;
mod shutdown;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "nestsync")]
#[command(version)]
#[command(about = "Collection synchronization engine for saved property searches")]
#[command(
    long_about = "NestSync keeps property collections in step with the listing market. It \
periodically fetches listings matching each collection's preferences, merges additions and \
removals into the collection while preserving visitor interactions and agent curation, and \
records every attempt in a sync ledger."
)]
#[command(after_long_help = r#"EXAMPLES
    Run one sync batch and exit:
        $ nestsync sync tick

    Refresh a single collection now:
        $ nestsync sync collection 6f1c2a9e-9f62-4f0a-8f5e-2b1c0d3e4f5a

    Run the scheduler loop until Ctrl+C:
        $ nestsync sync schedule

    Apply database migrations:
        $ nestsync migrate up

CONFIGURATION
    NestSync reads configuration from:
      1. ~/.config/nestsync/config.toml (or $XDG_CONFIG_HOME/nestsync/config.toml)
      2. ./nestsync.toml
      3. Environment variables (NESTSYNC_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    NESTSYNC_DATABASE_URL              Database connection string (default: ~/.local/state/nestsync/nestsync.db)
    NESTSYNC_PROVIDER_API_KEY          Listing gateway API key
    NESTSYNC_PROVIDER_BASE_URL         Listing gateway base URL
    NESTSYNC_SYNC_INTERVAL_SECS        Seconds between scheduler ticks (default: 3600)
    NESTSYNC_SYNC_BATCH_SIZE           Collections per tick (default: 10)
    NESTSYNC_SYNC_WORKERS              Concurrent collection syncs (default: 4)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Sync collections against the listing provider
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[derive(Subcommand)]
enum SyncAction {
    /// Run one batch of due collections and exit
    Tick {
        /// Maximum collections to sync this tick (default from config or 10)
        #[arg(short = 'b', long)]
        batch_size: Option<u64>,

        /// Concurrent collection syncs (default from config or 4)
        #[arg(short = 'w', long)]
        workers: Option<usize>,
    },
    /// Refresh one collection immediately
    Collection {
        /// Collection id
        id: Uuid,
    },
    /// Run the scheduler loop until interrupted
    Schedule {
        /// Maximum collections per tick (default from config or 10)
        #[arg(short = 'b', long)]
        batch_size: Option<u64>,

        /// Concurrent collection syncs (default from config or 4)
        #[arg(short = 'w', long)]
        workers: Option<usize>,

        /// Seconds between ticks (default from config or 3600)
        #[arg(short = 'i', long)]
        interval_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Structured logging when not attached to a terminal.
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("nestsync=info,nestsync_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();
    let cli = Cli::parse();

    let database_url = config
        .database_url()
        .ok_or_else(|| anyhow::anyhow!("could not determine a database URL"))?;

    // Ensure the database directory exists for SQLite.
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory. \
                 Consider using an absolute path.",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    match cli.command {
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Sync { action } => {
            commands::sync::handle_sync(action, &config, &database_url).await?;
        }
    }

    Ok(())
}
