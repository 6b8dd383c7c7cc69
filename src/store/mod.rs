//! Record stores.
//!
//! A record store yields every raw record of a named collection. Records
//! either come back from the local blob cache or from a live, paginated
//! endpoint that can write what it sees into that cache.

pub mod cache;
pub mod error;
pub mod paged_html;
pub mod paged_json;

pub use cache::BlobCache;
pub use error::FetchError;
pub use paged_html::{FieldSelector, PagedHtmlSource, SelectorSet};
pub use paged_json::PagedJsonSource;

use crate::models::RawRecord;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Source of raw records for a named collection.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch every record of `collection`.
    async fn fetch(&self, collection: &str) -> Result<FetchOutcome, FetchError>;
}

/// Records collected for one collection, plus how the fetch ended.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub records: Vec<RawRecord>,
    /// Pages requested successfully.
    pub pages_fetched: u32,
    /// Why pagination stopped early, if it did.
    pub aborted: Option<String>,
}

impl FetchOutcome {
    /// Outcome that ran to completion.
    pub fn complete(records: Vec<RawRecord>, pages_fetched: u32) -> Self {
        Self {
            records,
            pages_fetched,
            aborted: None,
        }
    }

    /// Whether pagination stopped because of a failure.
    pub fn is_partial(&self) -> bool {
        self.aborted.is_some()
    }
}

/// Pagination limits shared by the live sources.
#[derive(Debug, Clone)]
pub struct PageSettings {
    /// Upper bound on pages requested.
    pub max_pages: u32,
    /// Pause between two page requests.
    pub request_delay: Duration,
    /// Show a spinner while paging.
    pub show_progress: bool,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            max_pages: 20,
            request_delay: Duration::from_millis(200),
            show_progress: false,
        }
    }
}

/// Build the HTTP client used by the live sources.
pub fn http_client(user_agent: &str, timeout_seconds: u64) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(user_agent)
        .build()
        .map_err(FetchError::Client)
}

/// Spinner showing which page of a collection is being fetched.
fn page_spinner(collection: &str, show: bool) -> Option<ProgressBar> {
    if !show {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("{}: starting", collection));
    Some(pb)
}
