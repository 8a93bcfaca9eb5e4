//! Shared error type for the providers, the fetch layer, and the file sink.

use std::path::PathBuf;
use thiserror::Error;

/// Every failure aborts the current download and surfaces to the caller unchanged.
#[derive(Debug, Error)]
pub enum ScraperError {
    // Configuration
    #[error("Unknown provider '{name}'. Use 'royal road' or 'fichub'.")]
    UnknownProvider { name: String },

    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    // Expected page structure missing
    #[error("Could not find chapter table on the page: {url}")]
    ListingNotFound { url: String },

    #[error("Chapter table row {row} is malformed: {reason}")]
    MalformedListingRow { row: usize, reason: String },

    #[error("Could not find chapter content for '{chapter}' at {url}")]
    ContentNotFound { chapter: String, url: String },

    #[error("No zip file found in {}", dir.display())]
    ArchiveNotFound { dir: PathBuf },

    #[error("Found {count} zip files in {}; expected one", dir.display())]
    AmbiguousArchive { dir: PathBuf, count: usize },

    // Transport
    #[error("Network error: could not reach {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("FicHub export failed for {url}: {reason}")]
    Export { url: String, reason: String },

    // I/O
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    // Protocol / empty result
    #[error("No chapters to download. Call initialize before download.")]
    NotInitialized,

    #[error("No chapters downloaded.")]
    NoChaptersDownloaded,
}

impl ScraperError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScraperError::Io {
            path: path.into(),
            source,
        }
    }
}
