use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::CommandError;

/// Schema management for the Tezos delegation indexer
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database if it does not exist
    Create {
        /// Database name (defaults to the one in DATABASE_URL)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Run pending migrations
    Migrate {
        /// Number of migrations to run (all if not specified)
        #[arg(short, long)]
        steps: Option<u32>,
    },
    /// Drop all tables and run every migration again
    Reset,
    /// Show applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> Result<(), CommandError> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Create { name } => commands::create::execute(name).await,
        Commands::Migrate { steps } => commands::migrate::execute(steps).await,
        Commands::Reset => commands::migrate::reset().await,
        Commands::Status => commands::migrate::status().await,
    }
}
