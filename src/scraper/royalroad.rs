//! Royal Road adapter. Reads the chapter table on the fiction page, then fetches
//! each chapter page and writes its text as soon as it is extracted.

use crate::extract::{parse_selector, visible_text};
use crate::model::{ChapterLocator, NovelInfo};
use crate::scraper::{Fetch, Scraper, ScraperError};
use crate::sink;
use reqwest::Url;
use scraper::Html;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

pub const ROYALROAD_BASE: &str = "https://www.royalroad.com";

/// Resolve `link` against the Royal Road origin. Absolute URLs pass through unchanged.
pub fn resolve_url(link: &str) -> Result<String, ScraperError> {
    let base = Url::parse(ROYALROAD_BASE).map_err(|e| ScraperError::InvalidUrl {
        input: ROYALROAD_BASE.to_string(),
        reason: e.to_string(),
    })?;
    base.join(link.trim())
        .map(|u| u.to_string())
        .map_err(|e| ScraperError::InvalidUrl {
            input: link.to_string(),
            reason: e.to_string(),
        })
}

/// Parse the fiction page's chapter table into locators, skipping the header row.
///
/// `limit` caps the number of rows read; `None` or a value `<= 0` reads them all.
pub fn parse_chapter_table(
    html: &str,
    url: &str,
    limit: Option<i64>,
) -> Result<Vec<ChapterLocator>, ScraperError> {
    let doc = Html::parse_document(html);
    let table_sel = parse_selector("table#chapters")?;
    let row_sel = parse_selector("tr")?;
    let cell_sel = parse_selector("td")?;
    let anchor_sel = parse_selector("a")?;
    let date_cell_sel = parse_selector("td.text-right")?;
    let titled_sel = parse_selector("a [title]")?;

    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| ScraperError::ListingNotFound {
            url: url.to_string(),
        })?;

    let rows: Vec<_> = table.select(&row_sel).skip(1).collect();
    let take = match limit {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
        _ => rows.len(),
    };

    let mut locators = Vec::with_capacity(take.min(rows.len()));
    for (i, row) in rows.into_iter().take(take).enumerate() {
        let row_no = i + 1;
        let anchor = row
            .select(&cell_sel)
            .next()
            .and_then(|cell| cell.select(&anchor_sel).next())
            .ok_or_else(|| ScraperError::MalformedListingRow {
                row: row_no,
                reason: "first cell has no chapter link".to_string(),
            })?;
        let name = anchor.text().collect::<String>().trim().to_string();
        let link = anchor
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ScraperError::MalformedListingRow {
                row: row_no,
                reason: "chapter link has no href".to_string(),
            })?
            .to_string();
        let published = row
            .select(&date_cell_sel)
            .next()
            .and_then(|cell| cell.select(&titled_sel).next())
            .and_then(|el| el.value().attr("title"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        locators.push(ChapterLocator {
            name,
            link,
            published,
        });
    }
    Ok(locators)
}

/// Extract the text of a chapter page's `div.chapter-content`.
pub fn parse_chapter_content(html: &str, chapter: &str, url: &str) -> Result<String, ScraperError> {
    let doc = Html::parse_document(html);
    let content_sel = parse_selector("div.chapter-content")?;
    let content = doc
        .select(&content_sel)
        .next()
        .ok_or_else(|| ScraperError::ContentNotFound {
            chapter: chapter.to_string(),
            url: url.to_string(),
        })?;
    Ok(visible_text(content, |_| false))
}

/// Fetch the chapter table for a novel. Site-relative novel URLs are resolved against Royal Road.
pub fn fetch_chapter_list(
    fetcher: &mut dyn Fetch,
    novel: &NovelInfo,
    limit: Option<i64>,
) -> Result<Vec<ChapterLocator>, ScraperError> {
    info!("> Fetching chapter links for {}...", novel.name);
    let url = resolve_url(&novel.url)?;
    let html = fetcher.get_text(&url)?;

    let start = Instant::now();
    let chapters = parse_chapter_table(&html, &url, limit).inspect_err(|e| {
        error!(url = %url, error = %e, "could not read chapter table");
    })?;
    info!(
        "Fetched {} chapters in {:.2} seconds",
        chapters.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(chapters)
}

/// Fetch one chapter, extract its text, and write it under `out_dir`.
///
/// The file is named from the sanitized chapter name unless `filename` is given.
pub fn scrape_chapter(
    fetcher: &mut dyn Fetch,
    chapter: &ChapterLocator,
    out_dir: &Path,
    filename: Option<&str>,
) -> Result<PathBuf, ScraperError> {
    let url = resolve_url(&chapter.link)?;
    debug!("Scraping chapter: {}", chapter.name);
    debug!("Chapter URL: {}", url);

    let filename = match filename {
        Some(f) => f.to_string(),
        None => sink::chapter_filename(&chapter.name),
    };

    let html = fetcher.get_text(&url).inspect_err(|e| {
        error!("Failed to fetch chapter page: {}", e);
    })?;
    let text = parse_chapter_content(&html, &chapter.name, &url).inspect_err(|e| {
        error!("{}", e);
    })?;

    sink::ensure_dir(out_dir)?;
    sink::write_chapter(out_dir, &filename, &text)
}

/// Royal Road scraper. `initialize` reads the chapter table; `download` fetches every chapter.
#[derive(Debug)]
pub struct RoyalRoadScraper {
    novel: NovelInfo,
    limit: Option<i64>,
    chapters: Option<Vec<ChapterLocator>>,
}

impl RoyalRoadScraper {
    pub fn new(novel: NovelInfo, limit: Option<i64>) -> Self {
        Self {
            novel,
            limit,
            chapters: None,
        }
    }

    /// Chapters found by `initialize`; `None` until it has run.
    pub fn chapters(&self) -> Option<&[ChapterLocator]> {
        self.chapters.as_deref()
    }
}

impl Scraper for RoyalRoadScraper {
    fn novel(&self) -> &NovelInfo {
        &self.novel
    }

    fn initialize(&mut self, fetcher: &mut dyn Fetch) -> Result<(), ScraperError> {
        self.chapters = Some(fetch_chapter_list(fetcher, &self.novel, self.limit)?);
        Ok(())
    }

    fn download(
        &mut self,
        fetcher: &mut dyn Fetch,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScraperError> {
        let chapters = self.chapters.as_ref().ok_or(ScraperError::NotInitialized)?;
        if chapters.is_empty() {
            return Err(ScraperError::NoChaptersDownloaded);
        }
        sink::ensure_dir(out_dir)?;

        let mut written = Vec::with_capacity(chapters.len());
        for chapter in chapters {
            let path = scrape_chapter(fetcher, chapter, out_dir, None)?;
            info!("Downloaded chapter {} to {}", chapter.name, path.display());
            written.push(path);
        }
        Ok(written)
    }
}
