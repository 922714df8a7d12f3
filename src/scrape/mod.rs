//! Paginated forum scraper.
//!
//! # Data Flow
//! ```text
//! POST /api/scrape {url}
//!     → source.rs (fetch article page)
//!     → extract.rs (author, highest page label)
//!     → job.rs (for page in 1..=N: fetch ?cpage=page, extract, pause)
//!     → {author_nickname, comments}
//! ```
//!
//! # Design Decisions
//! - Pages are fetched sequentially; aggregation order is fetch order
//! - A fixed pause follows every page fetch
//! - Any failing page fails the job; partial results are discarded
//! - Duplicate comments are kept as the source repeats them

pub mod extract;
pub mod job;
pub mod source;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use extract::{resolve_avatar, ForumSelectors};
pub use job::{page_url, ScrapeJob, Scraper};
pub use source::{HttpPageSource, PageSource};

/// Placeholder for missing author or avatar.
pub const NOT_FOUND: &str = "Not Found";

/// Inbound scrape request.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

/// One comment as it appears on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub user_nickname: String,
    pub avatar_url: String,
    pub content: String,
}

/// Aggregated scrape output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub author_nickname: String,
    pub comments: Vec<CommentRecord>,
}

/// Errors that abort a scrape job.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A page answered with a 4xx/5xx status.
    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    /// Network, timeout, or body read failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The requested article URL does not parse.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A built-in selector failed to compile.
    #[error("invalid selector: {0}")]
    Selector(String),
}
