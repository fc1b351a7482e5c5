use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use herald_core::{storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "herald")]
#[command(author, version, about = "Relay RSS/Atom feeds into a Telegram channel with AI summaries")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingestion and delivery loops until interrupted
    Run,
    /// Run a single ingestion cycle
    Fetch,
    /// Run a single delivery cycle
    Deliver,
    /// Show articles the next delivery cycle would send
    Pending,
    /// Manage feed sources
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },
}

#[derive(Subcommand)]
enum SourceAction {
    /// Register a feed source
    Add {
        /// Display name for the source
        #[arg(short = 'n', long)]
        name: String,
        /// RSS or Atom feed URL
        #[arg(short = 'u', long)]
        url: String,
    },
    /// Remove a source and its stored articles
    Remove {
        /// Source id as shown by `source list`
        id: i64,
    },
    /// List registered sources
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging, RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Initialize database
    let db = Database::new(&config).await?;

    match cli.command {
        Some(Commands::Run) | None => commands::run::run(&db, &config).await,
        Some(Commands::Fetch) => commands::fetch::run(&db, &config).await,
        Some(Commands::Deliver) => commands::deliver::run(&db, &config).await,
        Some(Commands::Pending) => commands::pending::run(&db, &config).await,
        Some(Commands::Source { action }) => match action {
            SourceAction::Add { name, url } => commands::source::add(&db, &name, &url).await,
            SourceAction::Remove { id } => commands::source::remove(&db, id).await,
            SourceAction::List => commands::source::list(&db).await,
        },
    }
}
