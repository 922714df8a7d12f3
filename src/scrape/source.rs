//! Page retrieval for the scraper.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use url::Url;

use crate::config::ScraperConfig;
use crate::lifecycle::startup::StartupError;
use crate::scrape::ScrapeError;

/// Something that can fetch a page's HTML.
pub trait PageSource: Send + Sync {
    /// Fetch `url`, failing with [`ScrapeError::Status`] on a 4xx/5xx reply.
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<String, ScrapeError>> + Send;
}

/// Fetches pages over HTTP with a browser-like header set.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    pub fn new(config: &ScraperConfig) -> Result<Self, StartupError> {
        let mut headers = HeaderMap::new();
        for (name, value) in [
            (USER_AGENT, &config.user_agent),
            (ACCEPT, &config.accept),
            (ACCEPT_LANGUAGE, &config.accept_language),
        ] {
            let value = HeaderValue::from_str(value)
                .map_err(|e| StartupError::Config(format!("scraper {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.page_timeout_secs))
            .build()
            .map_err(|e| StartupError::HttpClient(e.to_string()))?;

        Ok(Self { client })
    }
}

impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &Url) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ScrapeError::Request(format!("{}: {}", url, e)))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::Request(format!("{}: {}", url, e)))
    }
}
