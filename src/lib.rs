//! Site-Harvester: a resumable two-phase website harvester
//!
//! This crate discovers the pages of a single site breadth-first up to a
//! configured depth, then harvests them: readable text for HTML pages and
//! categorized binary downloads for documents, images and PDFs. Downloads are
//! tracked on disk so repeated runs never fetch the same asset twice.

pub mod config;
pub mod content;
pub mod crawler;
pub mod download;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Harvester operations
///
/// Only startup can fail a run. Per-URL fetch, extraction and download
/// errors are counted by the crawler loops and never reach this type.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
///
/// At discovery time these are not failures of the run: a link that cannot be
/// normalized is simply never admitted to the frontier.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Link is not navigable: {0}")]
    NotNavigable(String),
}

/// Result type alias for Site-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Coordinator};
pub use download::Category;
pub use url::{normalize_url, NormalizeOptions, NormalizedUrl, ScopeFilter};
