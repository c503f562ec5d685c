//! The sequential batch loop: queue row in, archive entry out.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::archive::{AddOutcome, ArchiveError, RecipeArchive};
use crate::ingestion::{BatchSummary, RecipeExtractor, ScrapeOptions, SiteFetcher};
use crate::queue::{QueueError, RecipeQueue};

/// Failures that abort the whole batch. Per-row fetch and extraction failures
/// mark the row and move on instead.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("failed to serialize recipe record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Process every pending row of `opts.source`, one at a time.
pub async fn run_batch(
    queue: &RecipeQueue,
    fetcher: &SiteFetcher,
    extractor: &RecipeExtractor,
    archive: &mut RecipeArchive,
    opts: &ScrapeOptions,
) -> Result<BatchSummary, BatchError> {
    let mut entries = queue.pending(&opts.source)?;
    if let Some(limit) = opts.limit {
        entries.truncate(limit);
    }

    info!(
        source = %opts.source,
        pending = entries.len(),
        archive = %archive.path().display(),
        "starting recipe batch"
    );

    let mut summary = BatchSummary::default();
    for entry in entries {
        summary.processed += 1;

        let page_url = match Url::parse(&entry.url) {
            Ok(url) => url,
            Err(err) => {
                warn!(
                    source = %opts.source,
                    stage = "parse_url",
                    url = %entry.url,
                    error = %err,
                    "queued URL is invalid"
                );
                queue.mark_failed(entry.id, &format!("invalid URL: {err}"))?;
                summary.failed += 1;
                continue;
            }
        };

        let html = match fetcher.fetch_page(&page_url).await {
            Ok(html) => html,
            Err(err) => {
                warn!(
                    source = %opts.source,
                    stage = "recipe_page",
                    url = %page_url,
                    error = %err,
                    "failed to fetch recipe page"
                );
                queue.mark_failed(entry.id, &err.to_string())?;
                summary.failed += 1;
                continue;
            }
        };

        let mut record = match extractor.extract(&html, &opts.source, &page_url) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    source = %opts.source,
                    stage = "extract",
                    url = %page_url,
                    error = %err,
                    "page did not yield a recipe"
                );
                queue.mark_failed(entry.id, &err.to_string())?;
                summary.failed += 1;
                continue;
            }
        };

        if let Some(image_url) = record.image_url.clone() {
            record.photo_data = download_photo(fetcher, &opts.source, &image_url).await;
        }

        let json = serde_json::to_vec(&record)?;
        match archive.add(&record.name, entry.id, &json)? {
            AddOutcome::Added { entry: archived } => {
                summary.archived += 1;
                info!(
                    source = %opts.source,
                    stage = "archived",
                    name = %record.name,
                    entry = %archived,
                    bytes = json.len(),
                    "stored recipe"
                );
            }
            AddOutcome::Duplicate { entry: existing } => {
                summary.skipped_duplicate += 1;
                info!(
                    source = %opts.source,
                    stage = "duplicate",
                    entry = %existing,
                    "recipe already archived; skipping"
                );
            }
        }

        queue.mark_scraped(entry.id)?;
    }

    info!(
        source = %opts.source,
        processed = summary.processed,
        archived = summary.archived,
        skipped = summary.skipped_duplicate,
        failed = summary.failed,
        "recipe batch complete"
    );

    Ok(summary)
}

/// Fetch and base64-encode the recipe photo. Image failures degrade to an
/// empty string; the record is archived without a photo.
async fn download_photo(fetcher: &SiteFetcher, source: &str, image_url: &str) -> String {
    let url = match Url::parse(image_url) {
        Ok(url) => url,
        Err(err) => {
            warn!(
                source,
                stage = "photo",
                url = %image_url,
                error = %err,
                "extracted image URL is invalid; archiving without photo"
            );
            return String::new();
        }
    };

    match fetcher.fetch_image(&url).await {
        Ok(bytes) => BASE64.encode(&bytes),
        Err(err) => {
            warn!(
                source,
                stage = "photo",
                url = %url,
                error = %err,
                "photo download failed; archiving without photo"
            );
            String::new()
        }
    }
}
