//! Crawler coordinator - session orchestration
//!
//! This module ties a run together:
//! - Building the session context and the fetch backends
//! - Running discovery, then harvesting
//! - Compacting the tracker and writing the report files

use crate::config::Config;
use crate::content::MainContentExtractor;
use crate::crawler::browser::BrowserFetcher;
use crate::crawler::context::{CrawlContext, ShutdownSignal};
use crate::crawler::fetcher::{FetchError, Fetched, Fetcher, HttpFetcher};
use crate::crawler::frontier::{discover, Discovery};
use crate::crawler::harvest::harvest;
use crate::output::{generate_report, generate_summary, ReportContext, RunStatus, SessionSnapshot};
use url::Url;

/// Fetcher used for pages, selected by `use_playwright`
pub enum PageBackend {
    Http(HttpFetcher),
    Browser(BrowserFetcher),
}

impl PageBackend {
    pub async fn from_config(config: &Config) -> crate::Result<Self> {
        if config.use_playwright {
            Ok(Self::Browser(BrowserFetcher::launch(config).await?))
        } else {
            Ok(Self::Http(HttpFetcher::from_config(config)?))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Browser(_) => "headless browser",
        }
    }

    /// Releases the browser, if any
    pub async fn close(self) {
        if let Self::Browser(browser) = self {
            browser.close().await;
        }
    }
}

impl Fetcher for PageBackend {
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError> {
        match self {
            Self::Http(fetcher) => fetcher.fetch(url).await,
            Self::Browser(fetcher) => fetcher.fetch(url).await,
        }
    }
}

/// Main coordinator structure
pub struct Coordinator {
    config: Config,
    context: CrawlContext,
    pages: PageBackend,
    assets: HttpFetcher,
    extractor: MainContentExtractor,
    config_hash: Option<String>,
}

impl Coordinator {
    /// Creates a coordinator ready to run
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Output directories exist and backends are up
    /// * `Err(HarvestError)` - Startup failed; nothing was fetched
    pub async fn new(config: Config, shutdown: ShutdownSignal) -> crate::Result<Self> {
        let context = CrawlContext::from_config(&config, shutdown)?;
        let assets = HttpFetcher::from_config(&config)?;
        let pages = PageBackend::from_config(&config).await?;

        tracing::info!(
            "Session ready: start {}, depth {}, page backend {}, {} tracked downloads",
            context.start_url(),
            context.max_depth,
            pages.name(),
            context.tracker.len()
        );

        Ok(Self {
            config,
            context,
            pages,
            assets,
            extractor: MainContentExtractor::new(),
            config_hash: None,
        })
    }

    /// Records the config hash in the report
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn context(&self) -> &CrawlContext {
        &self.context
    }

    /// Runs both phases and writes the run artifacts
    ///
    /// Per-URL failures only show up in the returned counters. Report and
    /// tracker-compaction failures are logged and do not fail the run.
    pub async fn run(mut self) -> crate::Result<SessionSnapshot> {
        tracing::info!("Phase 1: discovering URLs");
        let discovery = discover(&mut self.context, &self.pages).await;
        tracing::info!(
            "Phase 1 {}: {} URLs discovered",
            discovery.status.label(),
            discovery.len()
        );

        let status = match discovery.status {
            RunStatus::Interrupted => RunStatus::Interrupted,
            RunStatus::Completed => {
                tracing::info!("Phase 2: harvesting content and downloads");
                harvest(
                    &mut self.context,
                    &discovery,
                    &self.pages,
                    &self.assets,
                    &self.extractor,
                )
                .await
            }
        };

        let snapshot = self.finish(&discovery, status);
        self.pages.close().await;

        tracing::info!(
            "Run {} in {:.1}s: {} visited, {} pages saved, {} downloaded, {} errors",
            status.label(),
            snapshot.elapsed.as_secs_f64(),
            snapshot.counts.visited,
            snapshot.counts.pages_saved,
            snapshot.counts.downloaded_total(),
            snapshot.counts.errors_total()
        );
        Ok(snapshot)
    }

    fn finish(&mut self, discovery: &Discovery, status: RunStatus) -> SessionSnapshot {
        self.context.stats.finish();
        let snapshot = self.context.stats.snapshot();

        if let Err(e) = self.context.tracker.compact() {
            tracing::warn!(
                "Failed to compact {}: {}",
                self.context.tracker.path().display(),
                e
            );
        }

        let report_context = ReportContext {
            config: &self.config,
            config_hash: self.config_hash.as_deref(),
            status,
        };
        let urls: Vec<&str> = discovery.urls().map(|url| url.as_str()).collect();

        if let Err(e) = generate_report(&self.context.layout, &report_context, &snapshot, &urls) {
            tracing::error!("Failed to write report: {}", e);
        }
        if let Err(e) =
            generate_summary(&self.context.layout, &report_context, &snapshot, urls.len())
        {
            tracing::error!("Failed to write summary: {}", e);
        }

        snapshot
    }
}

/// Runs a complete session with Ctrl-C handling
///
/// This is the main entry point for library users. It will:
/// 1. Prepare the output directories and load the tracker
/// 2. Start the page and asset fetchers
/// 3. Discover, then harvest
/// 4. Write `crawler_report.txt` and `summary.txt`
pub async fn run_crawl(config: Config) -> crate::Result<SessionSnapshot> {
    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_ctrl_c();
    Coordinator::new(config, shutdown).await?.run().await
}
