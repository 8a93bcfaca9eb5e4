//! Optional TOML config. `--config <path>` names a file explicitly; otherwise
//! ./novel-scrapers.toml, then <user config dir>/novel-scrapers/config.toml.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOCAL_CONFIG_FILE: &str = "novel-scrapers.toml";

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Default output directory when --output-dir is not set. Paths are relative to CWD.
    pub output_dir: Option<PathBuf>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Delay in seconds between requests.
    pub request_delay_secs: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Royal Road: read at most this many chapters from the table (0 or negative means all).
    pub chapter_limit: Option<i64>,
    /// Also write logs to this file.
    pub log_file: Option<PathBuf>,
    /// FicHub export API endpoint.
    pub fichub_api_url: Option<String>,
}

/// Config file problems. A missing file in the search path is not an error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    /// Read and parse one config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load `explicit` when given (it must exist). Otherwise use the first file
    /// found in [`search_paths`], or defaults when there is none.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        match search_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::from_path(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Where `Config::load` looks, in order.
pub fn search_paths() -> Vec<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    let user = dirs::config_dir().map(|d| d.join("novel-scrapers").join("config.toml"));
    std::iter::once(local).chain(user).collect()
}
