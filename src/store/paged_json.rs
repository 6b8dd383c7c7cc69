//! Paginated JSON search API.
//!
//! Requests `?text=<query>&page=<n>&per_page=<size>` page by page and reads
//! the `items` array and `pages` total from every response.

use super::{page_spinner, BlobCache, FetchError, FetchOutcome, PageSettings, RecordStore};
use crate::extract::fields;
use crate::models::RawRecord;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Live source backed by a paginated JSON endpoint.
pub struct PagedJsonSource {
    client: reqwest::Client,
    base_url: String,
    query: String,
    per_page: u32,
    settings: PageSettings,
    cache: Option<BlobCache>,
}

impl PagedJsonSource {
    /// Create a source for `base_url` searching for `query`.
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        query: impl Into<String>,
        per_page: u32,
        settings: PageSettings,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            query: query.into(),
            per_page,
            settings,
            cache: None,
        }
    }

    /// Persist every fetched item into `cache`, keyed by its `id`.
    pub fn with_cache(mut self, cache: BlobCache) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn fetch_page(&self, page: u32) -> Result<Value, FetchError> {
        let url = format!("{}?page={}", self.base_url, page);
        debug!("Requesting {}", url);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("text", self.query.clone()),
                ("page", page.to_string()),
                ("per_page", self.per_page.to_string()),
            ])
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| FetchError::Parse {
            what: url,
            reason: e.to_string(),
        })
    }

    fn persist(&self, collection: &str, record: &RawRecord) {
        let Some(cache) = &self.cache else {
            return;
        };

        match fields::text(record, "id") {
            Some(id) => {
                if let Err(e) = cache.put(collection, &id, record) {
                    warn!("Failed to cache item {}: {}", id, e);
                }
            }
            None => debug!("Item without id is not cached"),
        }
    }
}

#[async_trait]
impl RecordStore for PagedJsonSource {
    async fn fetch(&self, collection: &str) -> Result<FetchOutcome, FetchError> {
        let mut outcome = FetchOutcome::default();
        let spinner = page_spinner(collection, self.settings.show_progress);

        for page in 0..self.settings.max_pages {
            if page > 0 && !self.settings.request_delay.is_zero() {
                tokio::time::sleep(self.settings.request_delay).await;
            }

            if let Some(ref pb) = spinner {
                pb.set_message(format!("{}: page {}", collection, page + 1));
            }

            let body = match self.fetch_page(page).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Stopping {} at page {}: {}", collection, page + 1, e);
                    outcome.aborted = Some(e.to_string());
                    break;
                }
            };
            outcome.pages_fetched += 1;

            let items = body.get("items").and_then(Value::as_array);
            let Some(items) = items.filter(|items| !items.is_empty()) else {
                debug!("Page {} of {} is empty", page + 1, collection);
                break;
            };

            for item in items {
                match item {
                    Value::Object(record) => {
                        self.persist(collection, record);
                        outcome.records.push(record.clone());
                    }
                    other => warn!("Skipping malformed item in {}: {}", collection, other),
                }
            }

            let total_pages = body.get("pages").and_then(Value::as_u64);
            if total_pages.is_some_and(|total| total <= u64::from(page) + 1) {
                break;
            }
        }

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        info!(
            "Fetched {} items of {} from {} pages",
            outcome.records.len(),
            collection,
            outcome.pages_fetched
        );
        Ok(outcome)
    }
}
