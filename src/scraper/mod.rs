//! Providers and dispatch. Fetch seam, shared client and error, the two provider
//! adapters, and the [`NovelScraper`] facade that selects between them.

mod client;
mod error;

pub mod fichub;
pub mod royalroad;

pub use client::{Fetch, PoliteClient, PoliteClientBuilder, DEFAULT_DELAY_SECS};
pub use error::ScraperError;

use crate::model::{NovelInfo, Provider};
use std::path::{Path, PathBuf};

/// Implemented by each provider adapter.
///
/// `initialize` does whatever must happen before chapters can be downloaded
/// (Royal Road reads its chapter table; FicHub has nothing to do). `download`
/// writes every chapter under the output directory and returns the written paths.
pub trait Scraper {
    fn novel(&self) -> &NovelInfo;

    fn initialize(&mut self, fetcher: &mut dyn Fetch) -> Result<(), ScraperError>;

    fn download(
        &mut self,
        fetcher: &mut dyn Fetch,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScraperError>;
}

/// Per-run provider options.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    /// Royal Road: read at most this many table rows. `None` or `<= 0` reads all.
    pub chapter_limit: Option<i64>,
    /// FicHub: export API endpoint. Defaults to [`fichub::FICHUB_API_URL`].
    pub fichub_api_url: Option<String>,
}

/// Scraper bound to one provider and novel.
#[derive(Debug)]
pub enum NovelScraper {
    RoyalRoad(royalroad::RoyalRoadScraper),
    Fichub(fichub::FichubScraper),
}

impl NovelScraper {
    pub fn new(provider: Provider, novel: NovelInfo, options: &ScrapeOptions) -> Self {
        match provider {
            Provider::RoyalRoad => NovelScraper::RoyalRoad(royalroad::RoyalRoadScraper::new(
                novel,
                options.chapter_limit,
            )),
            Provider::Fichub => NovelScraper::Fichub(match &options.fichub_api_url {
                Some(api) => fichub::FichubScraper::with_api_url(novel, api.clone()),
                None => fichub::FichubScraper::new(novel),
            }),
        }
    }

    /// Resolve a provider name (case-insensitive) and bind it to `novel`.
    pub fn from_provider_name(
        name: &str,
        novel: NovelInfo,
        options: &ScrapeOptions,
    ) -> Result<Self, ScraperError> {
        let provider: Provider = name.parse()?;
        Ok(Self::new(provider, novel, options))
    }

    pub fn provider(&self) -> Provider {
        match self {
            NovelScraper::RoyalRoad(_) => Provider::RoyalRoad,
            NovelScraper::Fichub(_) => Provider::Fichub,
        }
    }

    fn inner(&mut self) -> &mut dyn Scraper {
        match self {
            NovelScraper::RoyalRoad(s) => s,
            NovelScraper::Fichub(s) => s,
        }
    }

    pub fn novel(&self) -> &NovelInfo {
        match self {
            NovelScraper::RoyalRoad(s) => s.novel(),
            NovelScraper::Fichub(s) => s.novel(),
        }
    }

    pub fn initialize(&mut self, fetcher: &mut dyn Fetch) -> Result<(), ScraperError> {
        self.inner().initialize(fetcher)
    }

    pub fn download(
        &mut self,
        fetcher: &mut dyn Fetch,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScraperError> {
        self.inner().download(fetcher, out_dir)
    }

    /// `initialize` followed by `download`.
    pub fn run(
        &mut self,
        fetcher: &mut dyn Fetch,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScraperError> {
        self.initialize(fetcher)?;
        self.download(fetcher, out_dir)
    }
}
