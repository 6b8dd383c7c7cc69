//! Paginated HTML listings.
//!
//! Page URLs come from a template with a `{page}` placeholder. Every node
//! matched by the item selector becomes one raw record whose fields are the
//! trimmed text (or attribute) of the configured child selectors.

use super::{page_spinner, BlobCache, FetchError, FetchOutcome, PageSettings, RecordStore};
use crate::models::RawRecord;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use url::Url;

/// Where to read one field inside an item node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSelector {
    /// CSS selector relative to the item node.
    pub css: String,
    /// Attribute to read instead of the text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
}

impl FieldSelector {
    pub fn text(css: &str) -> Self {
        Self {
            css: css.to_string(),
            attr: None,
        }
    }

    pub fn attr(css: &str, attr: &str) -> Self {
        Self {
            css: css.to_string(),
            attr: Some(attr.to_string()),
        }
    }
}

/// Selectors describing one HTML listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorSet {
    /// Selector matching every item node on a page.
    pub item: String,
    /// Attribute of the item node holding its identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_attr: Option<String>,
    /// Field name to selector.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSelector>,
}

struct CompiledField {
    name: String,
    selector: Selector,
    attr: Option<String>,
}

struct CompiledSelectors {
    item: Selector,
    id_attr: Option<String>,
    fields: Vec<CompiledField>,
}

fn compile(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|_| FetchError::InvalidSelector(css.to_string()))
}

impl CompiledSelectors {
    fn new(set: &SelectorSet) -> Result<Self, FetchError> {
        let fields = set
            .fields
            .iter()
            .map(|(name, field)| {
                Ok(CompiledField {
                    name: name.clone(),
                    selector: compile(&field.css)?,
                    attr: field.attr.clone(),
                })
            })
            .collect::<Result<Vec<_>, FetchError>>()?;

        Ok(Self {
            item: compile(&set.item)?,
            id_attr: set.id_attr.clone(),
            fields,
        })
    }
}

/// Live source backed by paginated HTML pages.
pub struct PagedHtmlSource {
    client: reqwest::Client,
    url_template: String,
    first_page: u32,
    selectors: CompiledSelectors,
    settings: PageSettings,
    cache: Option<BlobCache>,
}

impl PagedHtmlSource {
    /// Create a source. Fails if any selector does not parse.
    pub fn new(
        client: reqwest::Client,
        url_template: impl Into<String>,
        first_page: u32,
        selectors: &SelectorSet,
        settings: PageSettings,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            client,
            url_template: url_template.into(),
            first_page,
            selectors: CompiledSelectors::new(selectors)?,
            settings,
            cache: None,
        })
    }

    /// Persist every item that has an identifier into `cache`.
    pub fn with_cache(mut self, cache: BlobCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// URLs to visit, in order.
    fn page_urls(&self) -> Vec<String> {
        if !self.url_template.contains("{page}") {
            return vec![self.url_template.clone()];
        }

        (self.first_page..self.first_page + self.settings.max_pages)
            .map(|page| self.url_template.replace("{page}", &page.to_string()))
            .collect()
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        debug!("Requesting {}", url);

        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(transport)
    }

    fn persist(&self, collection: &str, record: &RawRecord) {
        let (Some(cache), Some(key)) = (&self.cache, record_key(record)) else {
            return;
        };
        if let Err(e) = cache.put(collection, &key, record) {
            warn!("Failed to cache item {}: {}", key, e);
        }
    }
}

/// Cache key of a scraped item: its id, or all of its fields joined in
/// name order when the page gives no id.
fn record_key(record: &RawRecord) -> Option<String> {
    if let Some(Value::String(id)) = record.get("id") {
        return Some(id.clone());
    }

    let mut fields: Vec<(&String, &str)> = record
        .iter()
        .filter_map(|(name, value)| value.as_str().map(|v| (name, v)))
        .collect();
    if fields.is_empty() {
        return None;
    }

    fields.sort_by(|a, b| a.0.cmp(b.0));
    let parts: Vec<&str> = fields.into_iter().map(|(_, v)| v).collect();
    Some(parts.join(" | "))
}

/// Extract records from one page.
///
/// Returns `None` when the page has no item nodes at all.
fn extract_items(html: &str, page_url: &str, selectors: &CompiledSelectors) -> Option<Vec<RawRecord>> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let items: Vec<RawRecord> = document
        .select(&selectors.item)
        .map(|node| extract_item(node, base.as_ref(), selectors))
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn extract_item(node: ElementRef<'_>, base: Option<&Url>, selectors: &CompiledSelectors) -> RawRecord {
    let mut record = RawRecord::new();

    if let Some(id) = selectors
        .id_attr
        .as_deref()
        .and_then(|attr| node.value().attr(attr))
        .map(str::trim)
        .filter(|id| !id.is_empty())
    {
        record.insert("id".to_string(), Value::String(id.to_string()));
    }

    for field in &selectors.fields {
        let Some(element) = node.select(&field.selector).next() else {
            continue;
        };

        let value = match field.attr.as_deref() {
            Some("href") => element.value().attr("href").map(|href| resolve(base, href)),
            Some(attr) => element.value().attr(attr).map(|v| v.trim().to_string()),
            None => Some(collapse_whitespace(element)),
        };

        if let Some(value) = value.filter(|v| !v.is_empty()) {
            record.insert(field.name.clone(), Value::String(value));
        }
    }

    record
}

fn collapse_whitespace(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    let href = href.trim();
    base.and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string())
}

#[async_trait]
impl RecordStore for PagedHtmlSource {
    async fn fetch(&self, collection: &str) -> Result<FetchOutcome, FetchError> {
        let mut outcome = FetchOutcome::default();
        let spinner = page_spinner(collection, self.settings.show_progress);

        for (index, url) in self.page_urls().iter().enumerate() {
            if index > 0 && !self.settings.request_delay.is_zero() {
                tokio::time::sleep(self.settings.request_delay).await;
            }

            if let Some(ref pb) = spinner {
                pb.set_message(format!("{}: {}", collection, url));
            }

            let html = match self.fetch_page(url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Stopping {} at {}: {}", collection, url, e);
                    outcome.aborted = Some(e.to_string());
                    break;
                }
            };
            outcome.pages_fetched += 1;

            match extract_items(&html, url, &self.selectors) {
                Some(items) => {
                    debug!("{} items on {}", items.len(), url);
                    for item in items {
                        self.persist(collection, &item);
                        outcome.records.push(item);
                    }
                }
                None => warn!("No items found on {}; the page layout may have changed", url),
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
