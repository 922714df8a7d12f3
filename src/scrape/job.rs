//! Sequential, paced crawl of an article's comment pages.

use std::time::Duration;

use url::Url;

use crate::config::ScraperConfig;
use crate::lifecycle::startup::StartupError;
use crate::observability::metrics;
use crate::scrape::extract::ForumSelectors;
use crate::scrape::source::PageSource;
use crate::scrape::{CommentRecord, ScrapeError, ScrapeResult};

/// State accumulated across page fetches for one article.
#[derive(Debug)]
pub struct ScrapeJob {
    pub base_url: Url,
    pub author: String,
    pub total_pages: u32,
    pub comments: Vec<CommentRecord>,
}

impl ScrapeJob {
    pub fn new(base_url: Url, author: String, total_pages: u32) -> Self {
        Self {
            base_url,
            author,
            total_pages: total_pages.max(1),
            comments: Vec::new(),
        }
    }

    pub fn finish(self) -> ScrapeResult {
        ScrapeResult {
            author_nickname: self.author,
            comments: self.comments,
        }
    }
}

/// `base` with `param=page`, replacing any existing value of `param`.
pub fn page_url(base: &Url, param: &str, page: u32) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(k, _)| k != param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(param, &page.to_string());
    url
}

/// Runs scrape jobs against a [`PageSource`].
#[derive(Debug)]
pub struct Scraper<S> {
    source: S,
    selectors: ForumSelectors,
    origin: Url,
    page_param: String,
    pace: Duration,
    max_pages: u32,
}

impl<S: PageSource> Scraper<S> {
    pub fn new(source: S, config: &ScraperConfig) -> Result<Self, StartupError> {
        let origin = Url::parse(&config.origin)
            .map_err(|e| StartupError::Config(format!("scraper.origin: {}", e)))?;
        let selectors = ForumSelectors::new().map_err(|e| StartupError::Config(e.to_string()))?;

        Ok(Self {
            source,
            selectors,
            origin,
            page_param: config.page_param.clone(),
            pace: Duration::from_millis(config.pace_ms),
            max_pages: config.max_pages.max(1),
        })
    }

    /// Author and every comment of the article at `base_url`.
    ///
    /// Pages are fetched one at a time in ascending order with a fixed pause
    /// after each, up to the configured page cap. Any failing page aborts the
    /// whole job.
    pub async fn scrape(&self, base_url: &str) -> Result<ScrapeResult, ScrapeError> {
        let base = Url::parse(base_url)
            .map_err(|e| ScrapeError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let landing = self.source.fetch(&base).await?;
        let (author, mut total_pages) = self.selectors.landing(&landing);
        if total_pages > self.max_pages {
            tracing::warn!(url = %base, total_pages, max_pages = self.max_pages, "Page count capped");
            total_pages = self.max_pages;
        }

        tracing::info!(url = %base, author = %author, total_pages, "Scraping article comments");

        let mut job = ScrapeJob::new(base, author, total_pages);
        for page in 1..=job.total_pages {
            let url = page_url(&job.base_url, &self.page_param, page);
            let html = self.source.fetch(&url).await?;

            let comments = self.selectors.comments(&html, &self.origin);
            tracing::debug!(page, count = comments.len(), "Page scraped");
            metrics::record_scrape_page(comments.len());
            job.comments.extend(comments);

            tokio::time::sleep(self.pace).await;
        }

        tracing::info!(url = %job.base_url, comments = job.comments.len(), "Scrape complete");
        Ok(job.finish())
    }
}
