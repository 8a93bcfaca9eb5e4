//! FicHub adapter. Asks the FicHub API for an HTML export of the story, saves the
//! zipped export into the output directory, unpacks it in place, and splits the
//! document into numbered chapter files.

use crate::extract::extract_fichub_chapters;
use crate::model::NovelInfo;
use crate::scraper::{Fetch, Scraper, ScraperError};
use crate::sink;
use reqwest::Url;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub const FICHUB_API_URL: &str = "https://fichub.net/api/v0/epub";

/// Reply from the FicHub export API. Only the fields used here are decoded.
#[derive(Debug, Deserialize)]
struct ExportResponse {
    #[serde(default)]
    err: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    urls: Option<ExportUrls>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    meta: Option<ExportMeta>,
}

#[derive(Debug, Deserialize)]
struct ExportUrls {
    #[serde(default)]
    html: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExportMeta {
    #[serde(default)]
    title: Option<String>,
}

fn export_error(url: &str, reason: impl Into<String>) -> ScraperError {
    ScraperError::Export {
        url: url.to_string(),
        reason: reason.into(),
    }
}

/// Request an HTML export of `novel` and save the zip under `out_dir`. Returns the archive path.
pub fn fetch_html_zip(
    fetcher: &mut dyn Fetch,
    api_url: &str,
    novel: &NovelInfo,
    out_dir: &Path,
) -> Result<PathBuf, ScraperError> {
    info!("{}", novel.url);
    let request = Url::parse_with_params(api_url, &[("q", novel.url.as_str())]).map_err(|e| {
        ScraperError::InvalidUrl {
            input: api_url.to_string(),
            reason: e.to_string(),
        }
    })?;
    let body = fetcher.get_text(request.as_str())?;
    let reply: ExportResponse = serde_json::from_str(&body)
        .map_err(|e| export_error(&novel.url, format!("unreadable API reply: {}", e)))?;
    if reply.err != 0 {
        let reason = reply
            .msg
            .unwrap_or_else(|| format!("API returned error code {}", reply.err));
        error!(url = %novel.url, reason = %reason, "FicHub export failed");
        return Err(export_error(&novel.url, reason));
    }

    let link = reply
        .urls
        .and_then(|u| u.html)
        .or(reply.html_url)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| export_error(&novel.url, "API reply has no HTML export link"))?;
    let download = request
        .join(&link)
        .map_err(|e| export_error(&novel.url, format!("bad export link {:?}: {}", link, e)))?;
    debug!(url = %download, "downloading export");
    let bytes = fetcher.get_bytes(download.as_str())?;

    let stem = reply
        .meta
        .and_then(|m| m.title)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| novel.name.clone());
    let path = out_dir.join(format!("{}.zip", sink::sanitize_filename(stem.trim())));
    std::fs::write(&path, bytes).map_err(|e| {
        error!(path = %path.display(), error = %e, "failed to save export");
        ScraperError::io(&path, e)
    })?;
    debug!(path = %path.display(), "saved export");
    Ok(path)
}

/// The single `.zip` file in `dir`. Fails when there is none or more than one.
pub fn find_zip_file(dir: &Path) -> Result<PathBuf, ScraperError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ScraperError::io(dir, e))?;
    let mut zips = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ScraperError::io(dir, e))?.path();
        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
        if is_zip && path.is_file() {
            zips.push(path);
        }
    }
    match zips.len() {
        0 => Err(ScraperError::ArchiveNotFound {
            dir: dir.to_path_buf(),
        }),
        1 => Ok(zips.remove(0)),
        count => Err(ScraperError::AmbiguousArchive {
            dir: dir.to_path_buf(),
            count,
        }),
    }
}

/// Unpack `archive` into its own directory and return the HTML document's path.
///
/// The document is expected to share the archive's base name; otherwise the first
/// `.html` entry in the archive is used.
pub fn unpack_html(archive: &Path) -> Result<PathBuf, ScraperError> {
    let dir = archive.parent().unwrap_or_else(|| Path::new("."));
    let file = File::open(archive).map_err(|e| ScraperError::io(archive, e))?;
    let zip_err = |e| ScraperError::Archive {
        path: archive.to_path_buf(),
        source: e,
    };
    let mut zip = zip::ZipArchive::new(file).map_err(zip_err)?;
    zip.extract(dir).map_err(zip_err)?;

    let expected = archive.with_extension("html");
    if expected.is_file() {
        return Ok(expected);
    }
    let first_html = zip
        .file_names()
        .find(|name| name.to_ascii_lowercase().ends_with(".html"))
        .map(|name| dir.join(name));
    first_html.ok_or_else(|| ScraperError::ArchiveNotFound {
        dir: dir.to_path_buf(),
    })
}

/// FicHub scraper. Everything happens in `download`; there is no listing step.
#[derive(Debug)]
pub struct FichubScraper {
    novel: NovelInfo,
    api_url: String,
}

impl FichubScraper {
    pub fn new(novel: NovelInfo) -> Self {
        Self::with_api_url(novel, FICHUB_API_URL)
    }

    pub fn with_api_url(novel: NovelInfo, api_url: impl Into<String>) -> Self {
        Self {
            novel,
            api_url: api_url.into(),
        }
    }
}

impl Scraper for FichubScraper {
    fn novel(&self) -> &NovelInfo {
        &self.novel
    }

    fn initialize(&mut self, _fetcher: &mut dyn Fetch) -> Result<(), ScraperError> {
        Ok(())
    }

    fn download(
        &mut self,
        fetcher: &mut dyn Fetch,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScraperError> {
        sink::ensure_dir(out_dir)?;
        let saved = fetch_html_zip(fetcher, &self.api_url, &self.novel, out_dir)?;
        let archive = if saved.is_file() {
            saved
        } else {
            find_zip_file(out_dir)?
        };
        let html_path = unpack_html(&archive)?;
        debug!(path = %html_path.display(), "reading export document");
        let html = std::fs::read_to_string(&html_path).map_err(|e| ScraperError::io(&html_path, e))?;

        let chapters = extract_fichub_chapters(&html)?;
        if chapters.is_empty() {
            error!(path = %html_path.display(), "export has no chapter blocks");
            return Err(ScraperError::NoChaptersDownloaded);
        }
        sink::write_numbered_chapters(out_dir, &chapters)
    }
}
