//! Logging setup.
//!
//! Builds a tracing subscriber from a [`LogConfig`] instead of installing one
//! globally; the binary scopes it to the run with
//! `tracing::subscriber::with_default`, and tests can do the same with their own
//! writer.

use std::path::PathBuf;
use thiserror::Error;
use tracing::{Level, Subscriber};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for this crate's events. `RUST_LOG` overrides it when set.
    pub level: Level,
    /// Write human-readable lines to stdout.
    pub console: bool,
    /// Also append to this file.
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            console: true,
            log_file: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Cannot create log directory {}: {source}", path.display())]
    Dir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open log file {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: InitError,
    },
}

/// Build the subscriber described by `config`.
pub fn subscriber(config: &LogConfig) -> Result<impl Subscriber + Send + Sync + 'static, LogError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,novel_scrapers={}", config.level))
    });

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.console {
        let console_layer = fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_writer(std::io::stdout)
            .boxed();
        layers.push(console_layer);
    }

    if let Some(path) = &config.log_file {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "debug.log".to_string());
        std::fs::create_dir_all(&dir).map_err(|e| LogError::Dir {
            path: dir.clone(),
            source: e,
        })?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(name)
            .build(&dir)
            .map_err(|e| LogError::File {
                path: path.clone(),
                source: e,
            })?;
        let file_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_writer(appender)
            .boxed();
        layers.push(file_layer);
    }

    Ok(tracing_subscriber::registry().with(layers).with(env_filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_logs_info_to_console() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(config.console);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn log_file_receives_events() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("logs").join("debug.log");
        let config = LogConfig {
            level: Level::DEBUG,
            console: false,
            log_file: Some(path.clone()),
        };
        let sub = subscriber(&config)?;
        tracing::subscriber::with_default(sub, || {
            tracing::info!("Fetched 3 chapters in 0.10 seconds");
        });
        let contents = std::fs::read_to_string(&path)?;
        assert!(contents.contains("Fetched 3 chapters"));
        assert!(contents.contains("INFO"));
        Ok(())
    }
}
