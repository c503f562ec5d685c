use std::fs;
use std::path::Path;
use std::process;

use tracing_subscriber::{filter::LevelFilter, fmt};

use larder_app::archive::{RecipeArchive, archive_file_name};
use larder_app::cli::{
    Cli, Commands, QueueArgs, QueueCommands, ScrapeArgs,
};
use larder_app::config;
use larder_app::error::AppError;
use larder_app::ingestion::{ScrapeOptions, SiteFetcher};
use larder_app::paths::AppPaths;
use larder_app::pipeline;
use larder_app::queue::RecipeQueue;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let log_level = determine_log_level(&cli);
    init_tracing(log_level);

    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn init_tracing(level: LevelFilter) {
    let subscriber = fmt().with_max_level(level).with_target(false).finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Tracing subscriber already set; skipping re-initialization.");
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Some(Commands::Scrape(args)) => run_scrape(args).await?,
        Some(Commands::Queue(args)) => run_queue(args)?,
        None => Cli::print_help(),
    }

    Ok(())
}

async fn run_scrape(args: ScrapeArgs) -> Result<(), AppError> {
    let cfg = config::load()?;
    let profile = cfg.sites.get(&args.source).cloned().ok_or_else(|| {
        AppError::Config(format!(
            "unknown source `{}`; configure it under [sites.{}]",
            args.source, args.source
        ))
    })?;
    let extractor = profile.compile()?;

    let paths = AppPaths::new(&cfg.storage.path)?;
    let queue = open_queue(args.db.as_deref(), &paths)?;
    let fetcher = SiteFetcher::new(&cfg.http)?;

    let archive_dir = match &args.output_dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|source| AppError::Io {
                path: dir.clone(),
                source,
            })?;
            dir.clone()
        }
        None => paths.archives_dir()?,
    };
    let archive_path = archive_dir.join(archive_file_name(&args.source));
    let mut archive = RecipeArchive::open(&archive_path)?;

    tracing::info!(
        source = %args.source,
        archive = %archive_path.display(),
        limit = ?args.limit,
        "starting scrape"
    );

    let opts = ScrapeOptions::builder()
        .source(args.source.clone())
        .maybe_limit(args.limit)
        .build();
    let summary = pipeline::run_batch(&queue, &fetcher, &extractor, &mut archive, &opts).await?;
    archive.finish()?;

    println!(
        "Completed: {} archived, {} duplicates skipped, {} failed ({} processed)",
        summary.archived, summary.skipped_duplicate, summary.failed, summary.processed
    );

    Ok(())
}

fn run_queue(args: QueueArgs) -> Result<(), AppError> {
    match args.command {
        QueueCommands::Add(args) => {
            let queue = open_default_queue(args.db.as_deref())?;
            let (added, skipped) = enqueue_all(&queue, &args.source, &args.urls)?;
            println!(
                "Queued {added} URL(s) for `{}` ({skipped} already present)",
                args.source
            );
        }
        QueueCommands::Import(args) => {
            let queue = open_default_queue(args.db.as_deref())?;
            let text = fs::read_to_string(&args.file).map_err(|source| AppError::Io {
                path: args.file.clone(),
                source,
            })?;
            let urls = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'));
            let (added, skipped) = enqueue_all(&queue, &args.source, urls)?;
            println!(
                "Queued {added} URL(s) for `{}` from {} ({skipped} already present)",
                args.source,
                args.file.display()
            );
        }
        QueueCommands::Stats(args) => {
            let queue = open_default_queue(args.db.as_deref())?;
            let stats = queue.stats()?;
            if stats.is_empty() {
                println!("Queue is empty.");
            }
            for entry in stats {
                println!(
                    "{}: {} pending, {} scraped, {} failed",
                    entry.source, entry.pending, entry.scraped, entry.failed
                );
            }
        }
        QueueCommands::ResetFailed(args) => {
            let queue = open_default_queue(args.db.as_deref())?;
            let reset = queue.reset_failed(&args.source)?;
            println!("Reset {reset} failed row(s) for `{}`", args.source);
        }
    }

    Ok(())
}

fn open_queue(db_override: Option<&Path>, paths: &AppPaths) -> Result<RecipeQueue, AppError> {
    match db_override {
        Some(path) => Ok(RecipeQueue::open(path)?),
        None => Ok(RecipeQueue::open(paths.queue_db_path())?),
    }
}

fn open_default_queue(db_override: Option<&Path>) -> Result<RecipeQueue, AppError> {
    if let Some(path) = db_override {
        return Ok(RecipeQueue::open(path)?);
    }
    let cfg = config::load()?;
    let paths = AppPaths::new(&cfg.storage.path)?;
    Ok(RecipeQueue::open(paths.queue_db_path())?)
}

fn enqueue_all<I, S>(queue: &RecipeQueue, source: &str, urls: I) -> Result<(usize, usize), AppError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut added = 0;
    let mut skipped = 0;
    for url in urls {
        if queue.enqueue(source, url.as_ref())? {
            added += 1;
        } else {
            skipped += 1;
        }
    }
    Ok((added, skipped))
}

fn determine_log_level(cli: &Cli) -> LevelFilter {
    match cli.command.as_ref() {
        Some(Commands::Scrape(_)) => match cli.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        },
        _ => match cli.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        },
    }
}
