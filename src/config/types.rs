use crate::download::Category;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Config file read when no path is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Main configuration structure for Site-Harvester
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// First page of the crawl; its host bounds the traversal
    pub start_url: String,

    /// Maximum number of link hops from the start URL
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Render pages through a headless browser instead of plain HTTP
    #[serde(default)]
    pub use_playwright: bool,

    /// Path substrings that keep a URL out of the crawl
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,

    /// File extensions harvested as downloads, by category
    #[serde(default = "default_download_extensions")]
    pub download_extensions: BTreeMap<Category, Vec<String>>,

    /// Regular expression tested against URL paths
    #[serde(default)]
    pub language_pattern: Option<String>,

    /// How `language_pattern` gates a path
    #[serde(default)]
    pub language_mode: LanguageMode,

    /// Output root directory
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Drop the whole query string during normalization
    #[serde(default)]
    pub strip_query: bool,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Extra attempts for transient fetch failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between attempts (milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// User-Agent header sent by the HTTP backend
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Policy applied by the locale gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMode {
    /// The path must match the pattern
    #[default]
    Require,
    /// The path must not match the pattern (it describes the other locales)
    Reject,
}

impl Config {
    /// Builds a configuration with every optional field at its default
    pub fn with_start_url(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            max_depth: default_max_depth(),
            use_playwright: false,
            excluded_paths: default_excluded_paths(),
            download_extensions: default_download_extensions(),
            language_pattern: None,
            language_mode: LanguageMode::default(),
            base_dir: default_base_dir(),
            strip_query: false,
            accept_invalid_certs: false,
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_max_depth() -> u32 {
    3
}

fn default_excluded_paths() -> Vec<String> {
    vec!["selecteur-de-produits".to_string()]
}

fn default_download_extensions() -> BTreeMap<Category, Vec<String>> {
    let to_vec = |exts: &[&str]| exts.iter().map(|e| e.to_string()).collect::<Vec<_>>();
    BTreeMap::from([
        (Category::Pdf, to_vec(&[".pdf"])),
        (
            Category::Image,
            to_vec(&[".png", ".jpg", ".jpeg", ".gif", ".svg"]),
        ),
        (
            Category::Doc,
            to_vec(&[".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx"]),
        ),
    ])
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("crawler_output")
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}
