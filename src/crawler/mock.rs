//! In-memory fetcher for unit tests

use crate::config::Config;
use crate::crawler::context::{CrawlContext, ShutdownSignal};
use crate::crawler::fetcher::{FetchError, Fetched, Fetcher};
use crate::download::Category;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;
use url::Url;

/// Config rooted in `dir` excluding `excluded` paths and harvesting PDFs and PNGs
pub fn test_config(dir: &Path, start_url: &str, max_depth: u32) -> Config {
    let mut config = Config::with_start_url(start_url);
    config.base_dir = dir.join("out");
    config.max_depth = max_depth;
    config.excluded_paths = vec!["excluded".to_string()];
    config.download_extensions = BTreeMap::from([
        (Category::Pdf, vec![".pdf".to_string()]),
        (Category::Image, vec![".png".to_string()]),
    ]);
    config
}

pub fn test_context(config: &Config) -> CrawlContext {
    CrawlContext::from_config(config, ShutdownSignal::new()).unwrap()
}

enum MockResponse {
    Body { content_type: String, body: Vec<u8> },
    Status(u16),
    Unreachable,
}

/// Serves canned responses keyed by exact URL and records every request
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, MockResponse>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            MockResponse::Body {
                content_type: "text/html; charset=utf-8".to_string(),
                body: body.as_bytes().to_vec(),
            },
        );
        self
    }

    pub fn asset(mut self, url: &str, content_type: &str, body: &[u8]) -> Self {
        self.responses.insert(
            url.to_string(),
            MockResponse::Body {
                content_type: content_type.to_string(),
                body: body.to_vec(),
            },
        );
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), MockResponse::Status(status));
        self
    }

    pub fn unreachable(mut self, url: &str) -> Self {
        self.responses
            .insert(url.to_string(), MockResponse::Unreachable);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.as_str() == url).count()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        match self.responses.get(url.as_str()) {
            Some(MockResponse::Body { content_type, body }) => Ok(Fetched {
                final_url: url.clone(),
                status: 200,
                content_type: content_type.clone(),
                body: body.clone(),
            }),
            Some(MockResponse::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            Some(MockResponse::Unreachable) => Err(FetchError::Connect {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
