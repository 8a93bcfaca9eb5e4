//! novel-scrapers: download novel chapters from Royal Road or FicHub into per-chapter text files.

pub mod cli;
pub mod config;
pub mod extract;
pub mod logging;
pub mod model;
pub mod scraper;
pub mod sink;

// Re-exports for CLI and consumers.
pub use crate::model::{ChapterLocator, ChapterRecord, NovelInfo, Provider};
pub use crate::scraper::{
    Fetch, NovelScraper, PoliteClient, PoliteClientBuilder, ScrapeOptions, Scraper, ScraperError,
};
