//! TOML configuration of scrapers and stocks.
//!
//! A configuration file has two sections: `[[scraper]]` entries declaring
//! the sites to use and their parallelism, and `[[stock]]` entries listing
//! the stocks with their quote sources. Disabled entries are skipped.
//! [`Config::plan`] resolves the file into the runner's inputs.
//!
//! ```toml
//! [[scraper]]
//! name = "borsaitaliana"
//! workers = 2
//!
//! [[stock]]
//! name = "Acme"
//! isin = "IT0001234567"
//!
//! [[stock.source]]
//! scraper = "borsaitaliana"
//! url = "https://www.borsaitaliana.it/azioni/acme"
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::scrape::{Scraper, ScraperKind, Source, Stock};

/// Configuration errors, all surfaced before anything runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read configuration {path}: {source}")]
    Read {
        /// Path that failed to open.
        path: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The file is not valid TOML.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A scraper entry without a name.
    #[error("scraper name must be defined")]
    UnnamedScraper,

    /// Two scraper entries share a name.
    #[error("scraper name already used: {0:?}")]
    DuplicateScraper(String),

    /// A stock entry without a name.
    #[error("stock name must be defined")]
    UnnamedStock,

    /// Two stock entries share a name.
    #[error("stock name already used: {0:?}")]
    DuplicateStock(String),

    /// A scraper name or source URL that cannot be resolved.
    #[error(transparent)]
    Scrape(#[from] crate::scrape::ScrapeError),
}

/// One `[[scraper]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Registry name of the scraper.
    pub name: String,
    /// Parallel instances; defaults to 1.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Skip this scraper (and every source using it).
    #[serde(default)]
    pub disabled: bool,
}

fn default_workers() -> usize {
    1
}

/// One `[[stock]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct StockConfig {
    /// Unique stock name.
    pub name: String,
    /// ISIN code.
    #[serde(default)]
    pub isin: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Skip this stock entirely.
    #[serde(default)]
    pub disabled: bool,
    /// Bare source URLs; the scraper is resolved from each URL.
    #[serde(default)]
    pub urls: Vec<String>,
    /// Explicit sources.
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

/// One `[[stock.source]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Scraper name; resolved from the URL when omitted.
    #[serde(default)]
    pub scraper: Option<String>,
    /// Quote page URL.
    pub url: String,
    /// Skip this source.
    #[serde(default)]
    pub disabled: bool,
}

/// The parsed configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Scraper declarations.
    #[serde(default, rename = "scraper")]
    pub scrapers: Vec<ScraperConfig>,
    /// Stock declarations.
    #[serde(default, rename = "stock")]
    pub stocks: Vec<StockConfig>,
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for scraper in &self.scrapers {
            if scraper.name.is_empty() {
                return Err(ConfigError::UnnamedScraper);
            }
            if !seen.insert(scraper.name.as_str()) {
                return Err(ConfigError::DuplicateScraper(scraper.name.clone()));
            }
        }

        let mut seen = HashSet::new();
        for stock in &self.stocks {
            if stock.name.is_empty() {
                return Err(ConfigError::UnnamedStock);
            }
            if !seen.insert(stock.name.as_str()) {
                return Err(ConfigError::DuplicateStock(stock.name.clone()));
            }
        }
        Ok(())
    }

    /// Resolve the configuration into runner inputs.
    ///
    /// Disabled scrapers, stocks and sources are skipped; sources without a
    /// scraper name are resolved from their URL; a stock left without any
    /// enabled source is dropped with a warning.
    pub fn plan(&self) -> Result<(Vec<Scraper>, Vec<Stock>), ConfigError> {
        let mut disabled = HashSet::new();
        let mut scrapers = Vec::new();
        for entry in &self.scrapers {
            if entry.disabled {
                disabled.insert(entry.name.as_str());
                continue;
            }
            let kind = ScraperKind::from_name(&entry.name)?;
            scrapers.push(Scraper {
                kind,
                workers: entry.workers,
            });
        }

        let mut stocks = Vec::new();
        for entry in &self.stocks {
            if entry.disabled {
                continue;
            }

            let mut sources = Vec::new();
            for source in &entry.sources {
                if source.disabled {
                    continue;
                }
                let kind = match &source.scraper {
                    Some(name) => {
                        if disabled.contains(name.as_str()) {
                            continue;
                        }
                        ScraperKind::from_name(name)?
                    }
                    None => {
                        let kind = ScraperKind::from_url(&source.url)?;
                        if disabled.contains(kind.name()) {
                            continue;
                        }
                        kind
                    }
                };
                sources.push(Source {
                    kind,
                    url: source.url.clone(),
                });
            }
            for url in &entry.urls {
                let kind = ScraperKind::from_url(url)?;
                if disabled.contains(kind.name()) {
                    continue;
                }
                sources.push(Source {
                    kind,
                    url: url.clone(),
                });
            }

            if sources.is_empty() {
                warn!(stock = %entry.name, "stock has no enabled sources, skipped");
                continue;
            }
            stocks.push(Stock {
                name: entry.name.clone(),
                isin: entry.isin.clone(),
                description: entry.description.clone(),
                sources,
            });
        }

        Ok((scrapers, stocks))
    }
}
