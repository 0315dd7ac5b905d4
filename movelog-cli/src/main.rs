use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

#[derive(Parser)]
#[command(name = "movelog", about = "Record statistics and rankings for movelog")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/movelog/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate stats for a category
    Stats(commands::stats::StatsArgs),
    /// Top keywords for a category, with rank trends
    Top(commands::top::TopArgs),
    /// Stats for a single keyword
    Keyword(commands::keyword::KeywordArgs),
    /// Find keywords by noun prefix, most recorded first
    Search(commands::search::SearchArgs),
    /// Which categories a user has logged today
    Today(commands::today::TodayArgs),
    /// Log an action and update the cached counters
    Record(commands::record::RecordArgs),
    /// Seed the cache from the event store and report what was written
    Backfill,
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Stats(args) => commands::stats::run(config, args).await,
        Commands::Top(args) => commands::top::run(config, args).await,
        Commands::Keyword(args) => commands::keyword::run(config, args).await,
        Commands::Search(args) => commands::search::run(config, args).await,
        Commands::Today(args) => commands::today::run(config, args).await,
        Commands::Record(args) => commands::record::run(config, args).await,
        Commands::Backfill => commands::backfill::run(config).await,
        Commands::Config(args) => commands::config::run(config, args),
    }
}
