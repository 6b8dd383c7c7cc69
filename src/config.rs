//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.listing-stats.toml` files.

use crate::cli::{Args, Command};
use crate::store::{FieldSelector, SelectorSet};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".listing-stats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Job vacancy API settings.
    #[serde(default)]
    pub vacancies: VacanciesConfig,

    /// Article hub settings.
    #[serde(default)]
    pub articles: ArticlesConfig,

    /// Conference schedule settings.
    #[serde(default)]
    pub talks: TalksConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding cached raw records.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Pause between two page requests, in milliseconds.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Rows shown in top-N tables.
    #[serde(default = "default_top")]
    pub top: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            request_delay_ms: default_request_delay(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            top: default_top(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".listing-stats-cache")
}

fn default_request_delay() -> u64 {
    200 // stay under five requests per second
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_top() -> usize {
    10
}

/// Paginated JSON vacancy search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacanciesConfig {
    /// Search endpoint.
    #[serde(default = "default_vacancies_url")]
    pub base_url: String,

    /// Full-text search query.
    #[serde(default = "default_query")]
    pub query: String,

    /// Maximum pages to request.
    #[serde(default = "default_vacancy_pages")]
    pub pages: u32,

    /// Items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for VacanciesConfig {
    fn default() -> Self {
        Self {
            base_url: default_vacancies_url(),
            query: default_query(),
            pages: default_vacancy_pages(),
            per_page: default_per_page(),
        }
    }
}

fn default_vacancies_url() -> String {
    "https://api.hh.ru/vacancies".to_string()
}

fn default_query() -> String {
    "C# OR .NET".to_string()
}

fn default_vacancy_pages() -> u32 {
    20
}

fn default_per_page() -> u32 {
    100
}

/// Article hub listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlesConfig {
    /// Site root; hub paths are appended to it.
    #[serde(default = "default_articles_url")]
    pub base_url: String,

    /// Hub reported by `articles` and used as the first side of `compare`.
    #[serde(default = "default_hub")]
    pub hub: String,

    /// Second hub for `compare`.
    #[serde(default = "default_second_hub")]
    pub second_hub: String,

    /// Page path appended to the hub; `{page}` is replaced by the number.
    #[serde(default = "default_page_path")]
    pub page_path: String,

    /// Number of the first page.
    #[serde(default = "default_first_page")]
    pub first_page: u32,

    /// Maximum pages to request per hub.
    #[serde(default = "default_article_pages")]
    pub pages: u32,

    /// Selectors for one article card.
    #[serde(default = "default_article_selectors")]
    pub selectors: SelectorSet,
}

impl Default for ArticlesConfig {
    fn default() -> Self {
        Self {
            base_url: default_articles_url(),
            hub: default_hub(),
            second_hub: default_second_hub(),
            page_path: default_page_path(),
            first_page: default_first_page(),
            pages: default_article_pages(),
            selectors: default_article_selectors(),
        }
    }
}

impl ArticlesConfig {
    /// Page URL template for a hub.
    pub fn url_template(&self, hub: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            hub.trim_matches('/'),
            self.page_path.trim_start_matches('/')
        )
    }
}

fn default_articles_url() -> String {
    "https://habr.com".to_string()
}

fn default_hub() -> String {
    "ru/hub/net".to_string()
}

fn default_second_hub() -> String {
    "ru/hub/csharp".to_string()
}

fn default_page_path() -> String {
    "page{page}/".to_string()
}

fn default_first_page() -> u32 {
    1
}

fn default_article_pages() -> u32 {
    245
}

fn default_article_selectors() -> SelectorSet {
    let fields: BTreeMap<String, FieldSelector> = [
        ("title", FieldSelector::text("a.tm-title__link")),
        ("link", FieldSelector::attr("a.tm-title__link", "href")),
        ("author", FieldSelector::text("a.tm-user-info__username")),
        ("published", FieldSelector::attr("time", "datetime")),
        ("rating", FieldSelector::text("span.tm-votes-meter__value")),
        ("views", FieldSelector::text("span.tm-icon-counter__value")),
        (
            "comments",
            FieldSelector::text("span.tm-article-comments-counter-link__value"),
        ),
    ]
    .into_iter()
    .map(|(name, selector)| (name.to_string(), selector))
    .collect();

    SelectorSet {
        item: "article.tm-articles-list__item".to_string(),
        id_attr: Some("id".to_string()),
        fields,
    }
}

/// Conference schedule page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalksConfig {
    /// Schedule page URL.
    #[serde(default = "default_schedule_url")]
    pub schedule_url: String,

    /// Selectors for one talk card.
    #[serde(default = "default_talk_selectors")]
    pub selectors: SelectorSet,
}

impl Default for TalksConfig {
    fn default() -> Self {
        Self {
            schedule_url: default_schedule_url(),
            selectors: default_talk_selectors(),
        }
    }
}

fn default_schedule_url() -> String {
    "https://dotnext.ru/schedule/table/".to_string()
}

fn default_talk_selectors() -> SelectorSet {
    let fields: BTreeMap<String, FieldSelector> = [
        ("company", FieldSelector::text("p.speakerCard__company")),
        ("speaker", FieldSelector::text("a.speakerCard__link")),
        ("title", FieldSelector::text("h3.talkCard__heading")),
    ]
    .into_iter()
    .map(|(name, selector)| (name.to_string(), selector))
    .collect();

    SelectorSet {
        item: "div.talkCard__main".to_string(),
        id_attr: None,
        fields,
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings and only
    /// override values that were given explicitly.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref dir) = args.cache_dir {
            self.general.cache_dir = dir.clone();
        }
        if let Some(delay) = args.delay_ms {
            self.general.request_delay_ms = delay;
        }
        if let Some(timeout) = args.timeout {
            self.general.timeout_seconds = timeout;
        }
        if let Some(top) = args.top {
            self.general.top = top;
        }

        match &args.command {
            Some(Command::Talks { url }) => {
                if let Some(url) = url {
                    self.talks.schedule_url = url.clone();
                }
            }
            Some(Command::Vacancies {
                query,
                pages,
                per_page,
            }) => {
                if let Some(query) = query {
                    self.vacancies.query = query.clone();
                }
                if let Some(pages) = pages {
                    self.vacancies.pages = *pages;
                }
                if let Some(per_page) = per_page {
                    self.vacancies.per_page = *per_page;
                }
            }
            Some(Command::Articles { hub, pages }) => {
                if let Some(hub) = hub {
                    self.articles.hub = hub.clone();
                }
                if let Some(pages) = pages {
                    self.articles.pages = *pages;
                }
            }
            Some(Command::Compare {
                first_hub,
                second_hub,
                pages,
            }) => {
                if let Some(hub) = first_hub {
                    self.articles.hub = hub.clone();
                }
                if let Some(hub) = second_hub {
                    self.articles.second_hub = hub.clone();
                }
                if let Some(pages) = pages {
                    self.articles.pages = *pages;
                }
            }
            None => {}
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
