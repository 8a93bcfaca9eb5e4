//! Data model shared by the providers and the file sink.

use crate::scraper::ScraperError;
use std::fmt;
use std::str::FromStr;

/// Reference to one chapter, taken from a row of the Royal Road chapter table.
///
/// `link` is kept exactly as it appears in the table (usually site-relative).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterLocator {
    pub name: String,
    pub link: String,
    /// Publish date as shown in the row's tooltip. Empty when the row has none.
    pub published: String,
}

/// One resolved chapter, ready to be written out. Order follows the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRecord {
    pub title: String,
    pub content: String,
}

/// Novel metadata supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NovelInfo {
    pub name: String,
    pub url: String,
}

impl NovelInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Supported source. Parsed case-insensitively from the names the CLI accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    RoyalRoad,
    Fichub,
}

impl Provider {
    /// Canonical user-facing name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::RoyalRoad => "royal road",
            Provider::Fichub => "fichub",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "royal road" | "royalroad" | "rr" => Ok(Provider::RoyalRoad),
            "fichub" => Ok(Provider::Fichub),
            _ => Err(ScraperError::UnknownProvider {
                name: s.to_string(),
            }),
        }
    }
}
