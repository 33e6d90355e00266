//! Phase 2: harvest every discovered URL once
//!
//! Pages go through the page fetcher and the content extractor; classified
//! downloads go through the asset fetcher and the tracker. A failure on one
//! URL is logged, counted and never stops the loop.

use crate::content::ContentExtractor;
use crate::crawler::context::CrawlContext;
use crate::crawler::fetcher::{Fetched, Fetcher};
use crate::crawler::frontier::{Discovery, EntryStatus};
use crate::download::{
    asset_file_name, content_file_name, Category, DownloadError, DownloadRecord, DownloadResult,
    DownloadTracker, HASH_WIDTHS,
};
use crate::output::{ErrorKind, RunStatus};
use crate::url::NormalizedUrl;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Runs phase 2 over the discovery result, in discovery order
///
/// Entries that failed or were not HTML during discovery are not fetched
/// again.
pub async fn harvest<P, A, E>(
    ctx: &mut CrawlContext,
    discovery: &Discovery,
    pages: &P,
    assets: &A,
    extractor: &E,
) -> RunStatus
where
    P: Fetcher,
    A: Fetcher,
    E: ContentExtractor,
{
    tracing::info!("Harvesting {} discovered URLs", discovery.len());

    for (position, entry) in discovery.entries.iter().enumerate() {
        if ctx.shutdown.is_requested() {
            tracing::warn!(
                "Harvest interrupted with {} URLs left",
                discovery.len() - position
            );
            return RunStatus::Interrupted;
        }

        match entry.status {
            EntryStatus::DeadEnd | EntryStatus::NotHtml => {
                tracing::debug!("Skipping {} ({:?} during discovery)", entry.url, entry.status);
            }
            EntryStatus::Asset(category) => {
                harvest_asset(ctx, assets, &entry.url, category).await;
            }
            EntryStatus::Pending | EntryStatus::Expanded { .. } | EntryStatus::DepthLimit => {
                harvest_page(ctx, pages, extractor, &entry.url).await;
            }
        }
    }

    RunStatus::Completed
}

async fn harvest_asset<A: Fetcher>(
    ctx: &mut CrawlContext,
    assets: &A,
    url: &NormalizedUrl,
    category: Category,
) {
    if ctx.tracker.is_downloaded(url.as_str()) {
        tracing::info!("Already downloaded, skipping: {}", url);
        ctx.stats.record_skipped();
        return;
    }

    let fetched = match assets.fetch(url.as_url()).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::warn!("Download failed for {} ({}): {}", url, category, e);
            ctx.stats.record_error(ErrorKind::Fetch);
            return;
        }
    };

    match save_asset(ctx, url, category, &fetched) {
        Ok(record) => {
            tracing::info!(
                "Downloaded {} ({} bytes) to {}",
                url,
                fetched.body.len(),
                record.local_path.display()
            );
            ctx.stats
                .record_downloaded(category, fetched.body.len() as u64);
        }
        Err(e) => {
            tracing::error!("Could not save {} ({}): {}", url, category, e);
            ctx.stats.record_error(ErrorKind::Download);
        }
    }
}

/// Writes the asset under its category directory, then records it
///
/// The identifier is recorded only once the file is in place; if recording
/// fails the file is removed again so the next run starts clean.
fn save_asset(
    ctx: &mut CrawlContext,
    url: &NormalizedUrl,
    category: Category,
    fetched: &Fetched,
) -> DownloadResult<DownloadRecord> {
    let extension = ctx
        .classifier
        .extension_for(url, category, &fetched.content_type);
    let dir = ctx.layout.category_dir(category);
    let path = choose_asset_path(&ctx.tracker, &dir, url, &extension)?;

    persist_bytes(&dir, &path, &fetched.body)?;

    match ctx.tracker.record_download(url.as_str(), category, &path) {
        Ok(record) => Ok(record),
        Err(e) => {
            if let Err(remove_err) = std::fs::remove_file(&path) {
                tracing::warn!("Could not remove {}: {}", path.display(), remove_err);
            }
            Err(DownloadError::Tracker(e))
        }
    }
}

/// Picks the first candidate name that does not belong to another resource
///
/// A candidate is usable when the tracker assigns it to this identifier, or
/// when nobody claims it and no file exists there yet.
fn choose_asset_path(
    tracker: &DownloadTracker,
    dir: &Path,
    url: &NormalizedUrl,
    extension: &str,
) -> DownloadResult<PathBuf> {
    for width in HASH_WIDTHS {
        let candidate = dir.join(asset_file_name(url, extension, width));
        let usable = match tracker.claimed_by(&candidate) {
            Some(owner) => owner == url.as_str(),
            None => !candidate.exists(),
        };
        if usable {
            return Ok(candidate);
        }
        tracing::debug!(
            "Name {} is taken, widening hash for {}",
            candidate.display(),
            url
        );
    }

    Err(DownloadError::NameExhausted {
        identifier: url.to_string(),
    })
}

/// Writes `bytes` to a temp file in `dir` and renames it to `path`
fn persist_bytes(dir: &Path, path: &Path, bytes: &[u8]) -> DownloadResult<()> {
    let write_error = |source| DownloadError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
    temp.write_all(bytes).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|e| DownloadError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

async fn harvest_page<P: Fetcher, E: ContentExtractor>(
    ctx: &mut CrawlContext,
    pages: &P,
    extractor: &E,
    url: &NormalizedUrl,
) {
    let fetched = match pages.fetch(url.as_url()).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::warn!("Unable to retrieve content for {}: {}", url, e);
            ctx.stats.record_error(ErrorKind::Fetch);
            return;
        }
    };

    if !fetched.is_html() {
        tracing::debug!("Not HTML ({}), no content saved: {}", fetched.content_type, url);
        return;
    }

    let text = match extractor.extract(&fetched.text(), &fetched.final_url) {
        Ok(Some(text)) => text,
        Ok(None) => {
            tracing::warn!("No main content found for: {}", url);
            return;
        }
        Err(e) => {
            tracing::warn!("Content extraction failed for {}: {}", url, e);
            ctx.stats.record_error(ErrorKind::Extraction);
            return;
        }
    };

    let dir = ctx.layout.content_dir();
    let path = dir.join(content_file_name(url));
    match persist_bytes(&dir, &path, text.as_bytes()) {
        Ok(()) => {
            tracing::info!("Content saved to {}", path.display());
            ctx.stats.record_page_saved();
        }
        Err(e) => {
            tracing::error!("Could not save content for {}: {}", url, e);
            ctx.stats.record_error(ErrorKind::Download);
        }
    }
}
