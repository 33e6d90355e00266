//! Session context shared by both phases
//!
//! Everything a run mutates lives here and is passed explicitly to the
//! frontier and the harvester.

use crate::config::Config;
use crate::download::{DownloadClassifier, DownloadTracker};
use crate::output::{OutputLayout, SessionStats};
use crate::url::{normalize_start_url, NormalizeOptions, NormalizedUrl, ScopeFilter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop flag checked between URLs
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Sets the flag on the first Ctrl-C
    ///
    /// Must be called from within a tokio runtime.
    pub fn listen_for_ctrl_c(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing the current URL before stopping");
                signal.request();
            }
        });
    }
}

/// Mutable and immutable state of one harvesting session
pub struct CrawlContext {
    pub layout: OutputLayout,
    pub scope: ScopeFilter,
    pub classifier: DownloadClassifier,
    pub normalize: NormalizeOptions,
    pub tracker: DownloadTracker,
    pub stats: SessionStats,
    pub shutdown: ShutdownSignal,
    pub max_depth: u32,
}

impl CrawlContext {
    /// Builds the session: output directories, scope rules and tracker state
    pub fn from_config(config: &Config, shutdown: ShutdownSignal) -> crate::Result<Self> {
        let normalize = NormalizeOptions::from_config(config);
        let start = normalize_start_url(&config.start_url, &normalize)?;
        let scope = ScopeFilter::from_config(config, &start)?;
        let classifier = DownloadClassifier::new(&config.download_extensions);

        let layout = OutputLayout::new(config.base_dir.clone());
        layout.create_dirs()?;

        let tracker = DownloadTracker::load(&layout.tracker_file())?;
        let stats = SessionStats::new(start.as_str(), config.max_depth);

        Ok(Self {
            layout,
            scope,
            classifier,
            normalize,
            tracker,
            stats,
            shutdown,
            max_depth: config.max_depth,
        })
    }

    pub fn start_url(&self) -> &NormalizedUrl {
        self.scope.start()
    }
}
