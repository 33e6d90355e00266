//! Crawler module for the two harvesting phases
//!
//! This module contains the core crawling logic, including:
//! - HTTP and headless-browser fetching with retry logic
//! - HTML link extraction
//! - Breadth-first discovery (phase 1)
//! - Content and download harvesting (phase 2)
//! - Overall session coordination

mod browser;
mod context;
mod coordinator;
mod fetcher;
mod frontier;
mod harvest;
mod parser;

#[cfg(test)]
mod mock;

pub use browser::BrowserFetcher;
pub use context::{CrawlContext, ShutdownSignal};
pub use coordinator::{run_crawl, Coordinator, PageBackend};
pub use fetcher::{build_http_client, FetchError, Fetched, Fetcher, HttpFetcher, RetryPolicy};
pub use frontier::{discover, Discovery, EntryStatus, Frontier, FrontierEntry};
pub use harvest::harvest;
pub use parser::{parse_html, ParsedPage};
