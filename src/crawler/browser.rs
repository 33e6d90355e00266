//! Headless-browser page fetcher
//!
//! Used for pages only (`use_playwright = true`); assets always go through
//! the HTTP fetcher. The browser's event handler runs on its own task for the
//! lifetime of the fetcher.

use crate::config::Config;
use crate::crawler::fetcher::{FetchError, Fetched, Fetcher};
use crate::HarvestError;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Renders pages in headless Chromium and returns the resulting DOM
pub struct BrowserFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    timeout: Duration,
}

impl BrowserFetcher {
    /// Launches a headless browser configured from the session settings
    pub async fn launch(config: &Config) -> crate::Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let mut builder = BrowserConfig::builder()
            .request_timeout(timeout)
            .arg(format!("--user-agent={}", config.user_agent))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions");
        if config.accept_invalid_certs {
            builder = builder.arg("--ignore-certificate-errors");
        }

        let browser_config = builder
            .build()
            .map_err(|e| HarvestError::Browser(format!("Invalid browser config: {}", e)))?;

        tracing::info!("Launching headless browser");
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| HarvestError::Browser(format!("Failed to launch browser: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser handler event error: {}", e);
                }
            }
            tracing::debug!("Browser handler task completed");
        });

        Ok(Self {
            browser,
            handler,
            timeout,
        })
    }

    /// Closes the browser and stops its handler task
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        self.handler.abort();
    }

    async fn render(&self, url: &Url) -> Result<(String, Option<String>), FetchError> {
        let browser_error = |e: chromiumoxide::error::CdpError| FetchError::Browser {
            url: url.to_string(),
            message: e.to_string(),
        };

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(browser_error)?;

        let rendered = async {
            page.goto(url.as_str()).await?;
            page.wait_for_navigation().await?;
            let html = page.content().await?;
            let final_url = page.url().await?;
            Ok::<_, chromiumoxide::error::CdpError>((html, final_url))
        };

        let result = match tokio::time::timeout(self.timeout, rendered).await {
            Ok(result) => result.map_err(browser_error),
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        };

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", url, e);
        }

        result
    }
}

impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError> {
        let (html, final_url) = self.render(url).await?;

        let final_url = final_url
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or_else(|| url.clone());

        Ok(Fetched {
            final_url,
            status: 200,
            content_type: "text/html".to_string(),
            body: html.into_bytes(),
        })
    }
}
