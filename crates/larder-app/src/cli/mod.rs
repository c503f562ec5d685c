use std::path::PathBuf;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};

/// Top-level CLI entry point.
#[derive(Debug, Parser)]
#[command(
    name = "larder",
    version,
    author,
    about = "Recipe scraper and Paprika archive exporter"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(global = true, short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn print_help() {
        let mut cmd = Cli::command();
        let _ = cmd.print_help();
        println!();
    }
}

/// Supported subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scrape pending queue URLs for a source into its archive.
    Scrape(ScrapeArgs),
    /// Manage the URL work queue.
    Queue(QueueArgs),
}

/// Run the batch job for one configured source.
#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// Source name; must match a configured site profile.
    pub source: String,
    /// Process at most this many pending URLs.
    #[arg(long)]
    pub limit: Option<usize>,
    /// Directory receiving the archive (defaults to the data directory).
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
    /// Queue database path override.
    #[arg(long, value_name = "FILE")]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommands,
}

#[derive(Debug, Subcommand)]
pub enum QueueCommands {
    /// Queue one or more recipe URLs for a source.
    Add(QueueAddArgs),
    /// Queue URLs from a file (one per line, `#` comments allowed).
    Import(QueueImportArgs),
    /// Show per-source queue counts.
    Stats(QueueStatsArgs),
    /// Return a source's failed rows to pending.
    ResetFailed(QueueResetArgs),
}

#[derive(Debug, Args)]
pub struct QueueAddArgs {
    /// Source name the URLs belong to.
    pub source: String,
    /// Recipe page URLs.
    #[arg(required = true)]
    pub urls: Vec<String>,
    /// Queue database path override.
    #[arg(long, value_name = "FILE")]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct QueueImportArgs {
    /// Source name the URLs belong to.
    pub source: String,
    /// File containing one URL per line.
    pub file: PathBuf,
    /// Queue database path override.
    #[arg(long, value_name = "FILE")]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct QueueStatsArgs {
    /// Queue database path override.
    #[arg(long, value_name = "FILE")]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct QueueResetArgs {
    /// Source whose failed rows should be retried.
    pub source: String,
    /// Queue database path override.
    #[arg(long, value_name = "FILE")]
    pub db: Option<PathBuf>,
}
