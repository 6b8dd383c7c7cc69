//! listing-stats - grouped statistics over scraped listings
//!
//! Fetches conference talks, job vacancies or hub articles, caches the raw
//! items as JSON blobs and prints fixed-width statistics tables.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (configuration, invalid selectors, cache IO, etc.)

mod analysis;
mod cli;
mod config;
mod extract;
mod models;
mod report;
mod store;

use anyhow::{Context, Result};
use cli::{Args, Command};
use config::{Config, CONFIG_FILE};
use extract::ListingKind;
use models::NormalizedRecord;
use std::time::Duration;
use store::{BlobCache, PageSettings, PagedHtmlSource, PagedJsonSource, RecordStore, SelectorSet};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("listing-stats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default configuration file.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    println!("Edit it to change endpoints, selectors, paging and the cache directory.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Settings shared by every collection of one run.
struct RunContext {
    config: Config,
    cache: BlobCache,
    offline: bool,
    persist: bool,
    show_progress: bool,
}

impl RunContext {
    fn new(config: Config, args: &Args) -> Self {
        let cache = BlobCache::new(config.general.cache_dir.clone());
        Self {
            config,
            cache,
            offline: args.offline,
            persist: !args.no_cache && !args.offline,
            show_progress: !args.quiet,
        }
    }

    fn settings(&self, max_pages: u32) -> PageSettings {
        PageSettings {
            max_pages,
            request_delay: Duration::from_millis(self.config.general.request_delay_ms),
            show_progress: self.show_progress,
        }
    }

    fn client(&self) -> Result<reqwest::Client> {
        let general = &self.config.general;
        Ok(store::http_client(&general.user_agent, general.timeout_seconds)?)
    }

    fn vacancy_store(&self) -> Result<Box<dyn RecordStore>> {
        if self.offline {
            return Ok(Box::new(self.cache.clone()));
        }

        let vacancies = &self.config.vacancies;
        let source = PagedJsonSource::new(
            self.client()?,
            vacancies.base_url.clone(),
            vacancies.query.clone(),
            vacancies.per_page,
            self.settings(vacancies.pages),
        );

        Ok(if self.persist {
            Box::new(source.with_cache(self.cache.clone()))
        } else {
            Box::new(source)
        })
    }

    fn html_store(
        &self,
        url_template: String,
        first_page: u32,
        selectors: &SelectorSet,
        max_pages: u32,
    ) -> Result<Box<dyn RecordStore>> {
        if self.offline {
            return Ok(Box::new(self.cache.clone()));
        }

        let source = PagedHtmlSource::new(
            self.client()?,
            url_template,
            first_page,
            selectors,
            self.settings(max_pages),
        )
        .context("Invalid selector configuration")?;

        Ok(if self.persist {
            Box::new(source.with_cache(self.cache.clone()))
        } else {
            Box::new(source)
        })
    }

    fn hub_store(&self, hub: &str) -> Result<Box<dyn RecordStore>> {
        let articles = &self.config.articles;
        self.html_store(
            articles.url_template(hub),
            articles.first_page,
            &articles.selectors,
            articles.pages,
        )
    }
}

/// Fetch one collection and normalize what arrived.
///
/// A fetch that stopped early still returns the records it collected.
async fn collect(
    store: &dyn RecordStore,
    collection: &str,
    kind: ListingKind,
) -> Result<Vec<NormalizedRecord>> {
    let outcome = store
        .fetch(collection)
        .await
        .with_context(|| format!("Failed to fetch {}", collection))?;

    if outcome.is_partial() {
        let reason = outcome.aborted.as_deref().unwrap_or("unknown");
        warn!(
            "{} is incomplete after {} pages ({}); reporting {} records",
            collection,
            outcome.pages_fetched,
            reason,
            outcome.records.len()
        );
    }

    let records = kind.normalize_all(&outcome.records);
    info!("Normalized {} records of {}", records.len(), collection);
    Ok(records)
}

/// Fetch two hubs concurrently; both finish before either result is used.
async fn collect_hubs(
    first_store: &dyn RecordStore,
    first_hub: &str,
    second_store: &dyn RecordStore,
    second_hub: &str,
) -> Result<(Vec<NormalizedRecord>, Vec<NormalizedRecord>)> {
    let (first, second) = tokio::join!(
        collect(first_store, first_hub, ListingKind::Article),
        collect(second_store, second_hub, ListingKind::Article),
    );
    Ok((first?, second?))
}

/// Run the selected report. Aggregation and rendering always run on
/// whatever records survived fetching.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let Some(command) = args.command.clone() else {
        anyhow::bail!("No subcommand given");
    };

    let ctx = RunContext::new(config, &args);
    info!("Cache directory: {}", ctx.cache.root().display());
    let top = ctx.config.general.top;

    let output = match command {
        Command::Talks { .. } => {
            let talks = &ctx.config.talks;
            let store = ctx.html_store(talks.schedule_url.clone(), 1, &talks.selectors, 1)?;
            let records = collect(store.as_ref(), "talks", ListingKind::Talk).await?;
            report::generate_talks_report(&talks.schedule_url, &records)
        }
        Command::Vacancies { .. } => {
            let store = ctx.vacancy_store()?;
            let records = collect(store.as_ref(), "vacancies", ListingKind::Vacancy).await?;
            report::generate_vacancies_report(&records, top)
        }
        Command::Articles { .. } => {
            let hub = ctx.config.articles.hub.clone();
            let store = ctx.hub_store(&hub)?;
            let records = collect(store.as_ref(), &hub, ListingKind::Article).await?;
            report::generate_articles_report(&hub, &records, top)
        }
        Command::Compare { .. } => {
            let first_hub = ctx.config.articles.hub.clone();
            let second_hub = ctx.config.articles.second_hub.clone();
            let first_store = ctx.hub_store(&first_hub)?;
            let second_store = ctx.hub_store(&second_hub)?;

            let (first, second) =
                collect_hubs(first_store.as_ref(), &first_hub, second_store.as_ref(), &second_hub).await?;

            report::generate_compare_report(&first_hub, &first, &second_hub, &second)
        }
    };

    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::partition;
    use crate::models::RawRecord;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn vacancy(id: u32, employer: &str, from: u32, to: u32) -> Value {
        json!({
            "id": id.to_string(),
            "name": format!("Vacancy {}", id),
            "employer": {"name": employer},
            "area": {"name": "Moscow"},
            "salary": {"from": from, "to": to}
        })
    }

    async fn mount_page(server: &MockServer, page: u32, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/vacancies"))
            .and(query_param("page", page.to_string()))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_partial_fetch_is_still_reported() {
        let server = MockServer::start().await;
        let first = json!({"items": [vacancy(1, "Acme", 100, 200), vacancy(2, "Acme", 200, 300)], "pages": 5});
        let second = json!({"items": [vacancy(3, "Globex", 400, 400), vacancy(4, "Acme", 100, 100)], "pages": 5});
        let fourth = json!({"items": [vacancy(5, "Initech", 900, 900)], "pages": 5});
        mount_page(&server, 0, ResponseTemplate::new(200).set_body_json(first)).await;
        mount_page(&server, 1, ResponseTemplate::new(200).set_body_json(second)).await;
        mount_page(&server, 2, ResponseTemplate::new(502)).await;
        mount_page(&server, 3, ResponseTemplate::new(200).set_body_json(fourth)).await;

        let source = PagedJsonSource::new(
            reqwest::Client::new(),
            format!("{}/vacancies", server.uri()),
            "Rust",
            2,
            PageSettings {
                max_pages: 5,
                request_delay: Duration::ZERO,
                show_progress: false,
            },
        );

        let records = collect(&source, "vacancies", ListingKind::Vacancy).await.unwrap();
        let report = report::generate_vacancies_report(&records, 10);

        assert_eq!(records.len(), 4);
        assert!(report.contains("Total vacancies: 4"));
        assert!(report.contains("Vacancies with salary: 4"));
        assert!(report.contains("Average salary: 225"));
        assert!(report.contains("Maximum salary: 400"));
        assert!(report.contains(&format!("|{:<40}|{:<19}|{:<16}|", "Acme", 3, 167)));
        assert!(!report.contains("Initech"));
    }

    #[tokio::test]
    async fn test_two_hubs_are_joined_before_comparing() {
        let dir = TempDir::new().unwrap();
        let cache = BlobCache::new(dir.path());
        for (hub, ids) in [("ru/hub/net", [1, 2, 3]), ("ru/hub/csharp", [2, 3, 4])] {
            for id in ids {
                let id = id.to_string();
                let raw = record(json!({"id": id, "title": format!("Article {}", id), "author": "ann"}));
                cache.put(hub, &id, &raw).unwrap();
            }
        }

        let (first, second) = collect_hubs(&cache, "ru/hub/net", &cache, "ru/hub/csharp")
            .await
            .unwrap();
        let parts = partition(&first, &second);

        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 3);
        assert_eq!(parts.only_a.len(), 1);
        assert_eq!(parts.common.len(), 2);
        assert_eq!(parts.only_b.len(), 1);
        assert_eq!(parts.union_len(), 4);

        let report = report::generate_compare_report("ru/hub/net", &first, "ru/hub/csharp", &second);
        assert!(report.contains("In both: 2"));
        assert!(report.contains("Distinct articles: 4"));
    }
}
