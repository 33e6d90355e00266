//! Session counters
//!
//! `SessionStats` is the only writer of the run's counters. The frontier and
//! the harvester report events to it; nothing reads it back during the run.

use crate::download::Category;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Kind of per-URL failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// Network, timeout or HTTP status failure
    Fetch,
    /// Content conversion failure
    Extraction,
    /// Writing or recording a download failed
    Download,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Fetch => "fetch",
            Self::Extraction => "extraction",
            Self::Download => "download",
        };
        f.write_str(label)
    }
}

/// Counter values of a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCounts {
    /// URLs taken off the frontier queue
    pub visited: u64,
    /// Pages whose extracted text was saved
    pub pages_saved: u64,
    /// Files downloaded per category
    pub downloaded: BTreeMap<Category, u64>,
    /// Bytes written for downloads
    pub bytes_downloaded: u64,
    /// Downloads skipped because the tracker already knew them
    pub skipped: u64,
    /// Failures per kind
    pub errors: BTreeMap<ErrorKind, u64>,
}

impl SessionCounts {
    pub fn downloaded_total(&self) -> u64 {
        self.downloaded.values().sum()
    }

    pub fn downloaded_in(&self, category: Category) -> u64 {
        self.downloaded.get(&category).copied().unwrap_or(0)
    }

    pub fn errors_total(&self) -> u64 {
        self.errors.values().sum()
    }

    pub fn errors_of(&self, kind: ErrorKind) -> u64 {
        self.errors.get(&kind).copied().unwrap_or(0)
    }
}

/// Event sink accumulating the counters of one run
#[derive(Debug)]
pub struct SessionStats {
    start_url: String,
    max_depth: u32,
    counts: SessionCounts,
    started_at: DateTime<Utc>,
    started: Instant,
    finished: Option<(DateTime<Utc>, Duration)>,
}

impl SessionStats {
    pub fn new(start_url: impl Into<String>, max_depth: u32) -> Self {
        Self {
            start_url: start_url.into(),
            max_depth,
            counts: SessionCounts::default(),
            started_at: Utc::now(),
            started: Instant::now(),
            finished: None,
        }
    }

    pub fn record_visited(&mut self) {
        self.counts.visited += 1;
    }

    pub fn record_page_saved(&mut self) {
        self.counts.pages_saved += 1;
    }

    pub fn record_downloaded(&mut self, category: Category, bytes: u64) {
        *self.counts.downloaded.entry(category).or_insert(0) += 1;
        self.counts.bytes_downloaded += bytes;
    }

    pub fn record_skipped(&mut self) {
        self.counts.skipped += 1;
    }

    pub fn record_error(&mut self, kind: ErrorKind) {
        *self.counts.errors.entry(kind).or_insert(0) += 1;
    }

    /// Freezes the end time; later calls keep the first value
    pub fn finish(&mut self) {
        if self.finished.is_none() {
            self.finished = Some((Utc::now(), self.started.elapsed()));
        }
    }

    /// Current counters plus timing
    ///
    /// Before `finish` the end time is "now".
    pub fn snapshot(&self) -> SessionSnapshot {
        let (ended_at, elapsed) = self
            .finished
            .unwrap_or_else(|| (Utc::now(), self.started.elapsed()));

        SessionSnapshot {
            start_url: self.start_url.clone(),
            max_depth: self.max_depth,
            counts: self.counts.clone(),
            started_at: self.started_at,
            ended_at,
            elapsed,
        }
    }
}

/// Immutable view of a session handed to report writers
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub start_url: String,
    pub max_depth: u32,
    pub counts: SessionCounts,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(snapshot: &SessionSnapshot) {
    let counts = &snapshot.counts;

    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Start URL: {}", snapshot.start_url);
    println!("  URLs visited: {}", counts.visited);
    println!("  Pages saved: {}", counts.pages_saved);
    println!("  Duration: {:.2}s", snapshot.elapsed.as_secs_f64());
    println!();

    println!("Downloads:");
    for category in Category::ALL {
        println!("  {}: {}", category, counts.downloaded_in(category));
    }
    println!("  Skipped (already present): {}", counts.skipped);
    println!("  Bytes written: {}", counts.bytes_downloaded);
    println!();

    if counts.errors_total() > 0 {
        println!("Errors:");
        for (kind, count) in &counts.errors {
            println!("  {}: {}", kind, count);
        }
        println!();
    }
}
