//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// listing-stats - grouped statistics over scraped listings
///
/// Fetch conference talks, job vacancies or hub articles, cache the raw
/// items locally and print tables of counts and averages.
///
/// Examples:
///   listing-stats talks
///   listing-stats vacancies --query "Rust" --pages 5
///   listing-stats articles --hub ru/hub/net --pages 10
///   listing-stats --offline compare
///   listing-stats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .listing-stats.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory for cached raw records
    #[arg(long, value_name = "DIR", env = "LISTING_STATS_CACHE", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Replay records from the cache instead of fetching
    #[arg(long, conflicts_with = "no_cache", global = true)]
    pub offline: bool,

    /// Do not write fetched records to the cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Pause between page requests in milliseconds
    #[arg(long, value_name = "MS", global = true)]
    pub delay_ms: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Rows shown in top-N tables
    #[arg(long, value_name = "COUNT", global = true)]
    pub top: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .listing-stats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Listing collection to report on.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Talks per company from a conference schedule page
    Talks {
        /// Schedule page URL
        #[arg(long, value_name = "URL")]
        url: Option<String>,
    },

    /// Vacancy statistics from a paginated job search API
    Vacancies {
        /// Search query
        #[arg(long, value_name = "TEXT")]
        query: Option<String>,

        /// Maximum pages to request
        #[arg(long, value_name = "COUNT")]
        pages: Option<u32>,

        /// Vacancies per page
        #[arg(long, value_name = "COUNT")]
        per_page: Option<u32>,
    },

    /// Article statistics for one hub
    Articles {
        /// Hub path, e.g. ru/hub/net
        #[arg(long, value_name = "PATH")]
        hub: Option<String>,

        /// Maximum pages to request
        #[arg(long, value_name = "COUNT")]
        pages: Option<u32>,
    },

    /// Exclusive and common articles of two hubs
    Compare {
        /// First hub path
        #[arg(long, value_name = "PATH")]
        first_hub: Option<String>,

        /// Second hub path
        #[arg(long, value_name = "PATH")]
        second_hub: Option<String>,

        /// Maximum pages to request per hub
        #[arg(long, value_name = "COUNT")]
        pages: Option<u32>,
    },
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let Some(ref command) = self.command else {
            return Err("A subcommand is required: talks, vacancies, articles or compare".to_string());
        };

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        match command {
            Command::Talks { url: Some(url) } => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err("Schedule URL must start with 'http://' or 'https://'".to_string());
                }
            }
            Command::Vacancies {
                pages, per_page, ..
            } => {
                if *pages == Some(0) {
                    return Err("--pages must be at least 1".to_string());
                }
                if *per_page == Some(0) {
                    return Err("--per-page must be at least 1".to_string());
                }
            }
            Command::Articles { pages, .. } | Command::Compare { pages, .. } => {
                if *pages == Some(0) {
                    return Err("--pages must be at least 1".to_string());
                }
            }
            Command::Talks { url: None } => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
