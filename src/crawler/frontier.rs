//! Phase 1: depth-bounded breadth-first discovery
//!
//! Entries live in an arena (`Vec<FrontierEntry>`); the FIFO queue and the
//! visited index hold arena positions. Admission is the only way into the
//! arena and checks the visited index in the same step, so a URL is admitted
//! at most once per session whatever the number of links pointing at it.

use crate::crawler::context::CrawlContext;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::parse_html;
use crate::download::Category;
use crate::output::{ErrorKind, RunStatus};
use crate::url::{normalize_url, NormalizedUrl};
use std::collections::{HashMap, VecDeque};

/// What discovery did with an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Admitted, not yet dequeued
    Pending,
    /// Fetched and its links admitted
    Expanded { children: usize },
    /// At `max_depth`; kept but not fetched
    DepthLimit,
    /// Classified download; kept but not fetched
    Asset(Category),
    /// Fetched, but the response was not HTML
    NotHtml,
    /// Fetch failed; contributes no children
    DeadEnd,
}

/// One admitted URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: NormalizedUrl,
    pub depth: u32,
    /// Arena index of the entry that linked here (none for the start URL)
    pub parent: Option<usize>,
    pub status: EntryStatus,
}

/// Arena of admitted URLs with the FIFO of entries still to expand
#[derive(Debug)]
pub struct Frontier {
    entries: Vec<FrontierEntry>,
    queue: VecDeque<usize>,
    index: HashMap<NormalizedUrl, usize>,
}

impl Frontier {
    /// Creates a frontier holding only the start URL at depth 0
    pub fn new(start: NormalizedUrl) -> Self {
        let mut frontier = Self {
            entries: Vec::new(),
            queue: VecDeque::new(),
            index: HashMap::new(),
        };
        frontier.insert(start, 0, None);
        frontier
    }

    /// Admits `url` as a child of `parent` unless it was already admitted
    ///
    /// Returns the new arena index, or `None` for a known URL.
    pub fn admit(&mut self, url: NormalizedUrl, parent: usize) -> Option<usize> {
        if self.index.contains_key(&url) {
            return None;
        }
        let depth = self.entries[parent].depth + 1;
        Some(self.insert(url, depth, Some(parent)))
    }

    fn insert(&mut self, url: NormalizedUrl, depth: u32, parent: Option<usize>) -> usize {
        let idx = self.entries.len();
        self.index.insert(url.clone(), idx);
        self.entries.push(FrontierEntry {
            url,
            depth,
            parent,
            status: EntryStatus::Pending,
        });
        self.queue.push_back(idx);
        idx
    }

    fn next(&mut self) -> Option<usize> {
        self.queue.pop_front()
    }

    pub fn contains(&self, url: &NormalizedUrl) -> bool {
        self.index.contains_key(url)
    }

    pub fn entries(&self) -> &[FrontierEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of phase 1, in discovery order
#[derive(Debug)]
pub struct Discovery {
    pub entries: Vec<FrontierEntry>,
    pub status: RunStatus,
}

impl Discovery {
    pub fn urls(&self) -> impl Iterator<Item = &NormalizedUrl> {
        self.entries.iter().map(|entry| &entry.url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs phase 1 to completion (or until shutdown is requested)
///
/// # Algorithm
///
/// 1. Pop the head of the queue and count it visited
/// 2. Classified downloads are kept without fetching
/// 3. Entries at `max_depth` are kept without fetching
/// 4. Otherwise fetch once; a failure makes the entry a dead end
/// 5. Extract links, resolve them against the final URL, normalize,
///    scope-check and admit unseen ones at `depth + 1`
pub async fn discover<F: Fetcher>(ctx: &mut CrawlContext, fetcher: &F) -> Discovery {
    let mut frontier = Frontier::new(ctx.start_url().clone());
    let mut status = RunStatus::Completed;

    tracing::info!(
        "Discovering {} up to depth {}",
        ctx.start_url(),
        ctx.max_depth
    );

    while let Some(idx) = frontier.next() {
        if ctx.shutdown.is_requested() {
            tracing::warn!(
                "Discovery interrupted with {} URLs still queued",
                frontier.queue.len() + 1
            );
            status = RunStatus::Interrupted;
            break;
        }

        ctx.stats.record_visited();
        let entry_status = expand(ctx, fetcher, &mut frontier, idx).await;
        frontier.entries[idx].status = entry_status;

        if (idx + 1) % 50 == 0 {
            tracing::info!(
                "Progress: {} URLs visited, {} discovered, {} queued",
                idx + 1,
                frontier.len(),
                frontier.queue.len()
            );
        }
    }

    tracing::info!("Discovery finished: {} URLs", frontier.len());

    Discovery {
        entries: frontier.entries,
        status,
    }
}

async fn expand<F: Fetcher>(
    ctx: &mut CrawlContext,
    fetcher: &F,
    frontier: &mut Frontier,
    idx: usize,
) -> EntryStatus {
    let url = frontier.entries[idx].url.clone();
    let depth = frontier.entries[idx].depth;

    if let Some(category) = ctx.classifier.classify(&url) {
        tracing::debug!("Found {} download: {}", category, url);
        return EntryStatus::Asset(category);
    }

    if depth >= ctx.max_depth {
        tracing::debug!("Depth limit reached at {}", url);
        return EntryStatus::DepthLimit;
    }

    let fetched = match fetcher.fetch(url.as_url()).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::warn!("Discovery failed for {} (depth {}): {}", url, depth, e);
            ctx.stats.record_error(ErrorKind::Fetch);
            return EntryStatus::DeadEnd;
        }
    };

    if !fetched.is_html() {
        tracing::debug!("Not HTML ({}): {}", fetched.content_type, url);
        return EntryStatus::NotHtml;
    }

    let parsed = parse_html(&fetched.text());
    let mut children = 0;

    for raw in &parsed.links {
        let candidate = match normalize_url(raw, &fetched.final_url, &ctx.normalize) {
            Ok(candidate) => candidate,
            Err(e) => {
                tracing::trace!("Ignoring link {}: {}", raw, e);
                continue;
            }
        };

        if let Err(reason) = ctx.scope.check(&candidate) {
            tracing::debug!("Out of scope ({}): {}", reason, candidate);
            continue;
        }

        if frontier.admit(candidate, idx).is_some() {
            children += 1;
        }
    }

    tracing::info!(
        "Explored {} (depth {}): {} new links",
        url,
        depth,
        children
    );
    EntryStatus::Expanded { children }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::mock::{test_config, test_context, MockFetcher};
    use crate::url::{normalize_start_url, NormalizeOptions};
    use tempfile::TempDir;

    fn url(raw: &str) -> NormalizedUrl {
        normalize_start_url(raw, &NormalizeOptions::default()).unwrap()
    }

    fn urls(discovery: &Discovery) -> Vec<&str> {
        discovery.urls().map(|u| u.as_str()).collect()
    }

    #[test]
    fn test_admit_is_first_discovery_wins() {
        let mut frontier = Frontier::new(url("https://example.com/"));
        let a = frontier.admit(url("https://example.com/a"), 0).unwrap();
        assert_eq!(frontier.entries()[a].depth, 1);
        assert_eq!(frontier.entries()[a].parent, Some(0));

        let b = frontier.admit(url("https://example.com/b"), a).unwrap();
        assert_eq!(frontier.entries()[b].depth, 2);

        assert!(frontier.admit(url("https://example.com/a"), b).is_none());
        assert!(frontier.admit(url("https://example.com/"), a).is_none());
        assert_eq!(frontier.len(), 3);
        assert!(frontier.contains(&url("https://example.com/b")));
    }

    #[tokio::test]
    async fn test_scope_scenario() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), "https://example.com/", 1);
        let mut ctx = test_context(&config);

        let fetcher = MockFetcher::new().html(
            "https://example.com/",
            r#"<a href="/a">A</a>
               <a href="/excluded/b">B</a>
               <a href="https://other.com/c">C</a>"#,
        );

        let discovery = discover(&mut ctx, &fetcher).await;

        assert_eq!(urls(&discovery), vec!["https://example.com/", "https://example.com/a"]);
        assert_eq!(discovery.status, RunStatus::Completed);
        assert_eq!(fetcher.requests(), vec!["https://example.com/"]);
        assert_eq!(discovery.entries[1].status, EntryStatus::DepthLimit);
    }

    #[tokio::test]
    async fn test_max_depth_zero() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), "https://example.com/", 0);
        let mut ctx = test_context(&config);
        let fetcher = MockFetcher::new().html("https://example.com/", r#"<a href="/a">A</a>"#);

        let discovery = discover(&mut ctx, &fetcher).await;

        assert_eq!(urls(&discovery), vec!["https://example.com/"]);
        assert!(fetcher.requests().is_empty());
        assert_eq!(ctx.stats.snapshot().counts.visited, 1);
    }

    #[tokio::test]
    async fn test_cycles_and_duplicate_links() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), "https://example.com/", 5);
        let mut ctx = test_context(&config);

        let fetcher = MockFetcher::new()
            .html(
                "https://example.com/",
                r#"<a href="/a">A</a><a href="/a/">A again</a><a href="/a#top">A top</a>"#,
            )
            .html("https://example.com/a", r#"<a href="/b">B</a><a href="/">Home</a>"#)
            .html("https://example.com/b", r#"<a href="/a">A</a><a href="/">Home</a>"#);

        let discovery = discover(&mut ctx, &fetcher).await;

        assert_eq!(
            urls(&discovery),
            vec![
                "https://example.com/",
                "https://example.com/a",
                "https://example.com/b"
            ]
        );
        for page in ["https://example.com/", "https://example.com/a", "https://example.com/b"] {
            assert_eq!(fetcher.request_count(page), 1);
        }
        assert_eq!(discovery.entries[0].status, EntryStatus::Expanded { children: 1 });
        assert_eq!(discovery.entries[2].status, EntryStatus::Expanded { children: 0 });
    }

    #[tokio::test]
    async fn test_breadth_first_order_and_depths() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), "https://example.com/", 2);
        let mut ctx = test_context(&config);

        let fetcher = MockFetcher::new()
            .html("https://example.com/", r#"<a href="/a">A</a><a href="/b">B</a>"#)
            .html("https://example.com/a", r#"<a href="/a/deep">Deep</a>"#)
            .html("https://example.com/b", r#"<a href="/b/deep">Deep</a>"#)
            .html("https://example.com/a/deep", r#"<a href="/too-deep">X</a>"#);

        let discovery = discover(&mut ctx, &fetcher).await;

        assert_eq!(
            urls(&discovery),
            vec![
                "https://example.com/",
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/a/deep",
                "https://example.com/b/deep",
            ]
        );
        assert!(discovery.entries.iter().all(|e| e.depth <= 2));
        assert_eq!(fetcher.request_count("https://example.com/a/deep"), 0);
    }

    #[tokio::test]
    async fn test_failing_start_page() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), "https://example.com/", 2);
        let mut ctx = test_context(&config);
        let fetcher = MockFetcher::new().unreachable("https://example.com/");

        let discovery = discover(&mut ctx, &fetcher).await;

        assert_eq!(discovery.len(), 1);
        assert_eq!(discovery.entries[0].status, EntryStatus::DeadEnd);
        let counts = ctx.stats.snapshot().counts;
        assert_eq!(counts.visited, 1);
        assert_eq!(counts.errors_total(), 1);
    }

    #[tokio::test]
    async fn test_assets_are_not_fetched() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), "https://example.com/", 3);
        let mut ctx = test_context(&config);
        let fetcher = MockFetcher::new().html(
            "https://example.com/",
            r#"<a href="/files/doc.pdf">Doc</a><embed src="/img/plan.PNG">"#,
        );

        let discovery = discover(&mut ctx, &fetcher).await;

        assert_eq!(discovery.entries[1].status, EntryStatus::Asset(Category::Pdf));
        assert_eq!(discovery.entries[2].status, EntryStatus::Asset(Category::Image));
        assert_eq!(fetcher.requests(), vec!["https://example.com/"]);
    }

    #[tokio::test]
    async fn test_shutdown_stops_discovery() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), "https://example.com/", 2);
        let mut ctx = test_context(&config);
        ctx.shutdown.request();
        let fetcher = MockFetcher::new().html("https://example.com/", r#"<a href="/a">A</a>"#);

        let discovery = discover(&mut ctx, &fetcher).await;

        assert_eq!(discovery.status, RunStatus::Interrupted);
        assert!(fetcher.requests().is_empty());
        assert_eq!(discovery.entries[0].status, EntryStatus::Pending);
    }
}
