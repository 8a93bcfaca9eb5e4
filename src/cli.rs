//! CLI parsing and orchestration. Parses args, merges the config file, sets up
//! logging for the run, and drives the selected provider. Failures are reported
//! on stderr; only clap's own argument errors change the exit status.

use crate::config::{Config, ConfigError};
use crate::logging::{self, LogConfig, LogError};
use crate::model::{NovelInfo, Provider};
use crate::scraper::{NovelScraper, ScrapeOptions, ScraperError, DEFAULT_DELAY_SECS};
use crate::PoliteClient;
use clap::{Parser, Subcommand};
use std::error::Error as _;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, Level};

pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LogError),

    #[error("Error occurred while downloading: {0}")]
    Scraper(#[from] ScraperError),
}

/// Write `err` to `out`, followed by its cause chain when `verbose` is set.
pub fn report_error(err: &CliRunError, verbose: bool, out: &mut impl Write) {
    let _ = writeln!(out, "{}", err);
    if verbose {
        let mut source = err.source();
        while let Some(s) = source {
            let _ = writeln!(out, "  cause: {}", s);
            source = s.source();
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "novel-scrapers")]
#[command(about = "Download novel chapters from Royal Road or FicHub as text files")]
#[command(
    after_help = "Config file keys (output_dir, user_agent, request_delay_secs, timeout_secs, chapter_limit, log_file, fichub_api_url) are read from --config, ./novel-scrapers.toml or the user config directory. CLI flags override config."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Read settings from this TOML file instead of searching for one.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug lines (URLs, filenames) and print the error cause chain.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download chapters using the specified provider.
    Download(DownloadArgs),
}

#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    /// The provider to scrape from: "royal road" or "fichub" (case-insensitive).
    #[arg(long, value_parser = parse_provider)]
    pub provider: Provider,

    /// Name of the novel.
    #[arg(long)]
    pub novel_name: String,

    /// URL of the novel.
    #[arg(long)]
    pub novel_url: String,

    /// Output directory for downloaded chapters (default: ./output).
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Royal Road: download only the first N chapters (0 or negative means all).
    #[arg(long, allow_negative_numbers = true)]
    pub chapters: Option<i64>,

    /// Delay between requests in seconds (overrides config; default 1).
    #[arg(long)]
    pub delay: Option<u64>,

    /// Request timeout in seconds (overrides config).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,
}

fn parse_provider(s: &str) -> Result<Provider, String> {
    s.parse::<Provider>().map_err(|e| e.to_string())
}

/// Effective settings for one download after merging flags over the config file.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    output_dir: PathBuf,
    delay_secs: u64,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
    chapter_limit: Option<i64>,
    fichub_api_url: Option<String>,
}

fn resolve_settings(args: &DownloadArgs, config: &Config) -> Settings {
    Settings {
        output_dir: args
            .output_dir
            .clone()
            .or_else(|| config.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        delay_secs: args
            .delay
            .or(config.request_delay_secs)
            .unwrap_or(DEFAULT_DELAY_SECS),
        timeout_secs: args.timeout.or(config.timeout_secs),
        user_agent: args
            .user_agent
            .clone()
            .or_else(|| config.user_agent.clone()),
        chapter_limit: args.chapters.or(config.chapter_limit),
        fichub_api_url: config.fichub_api_url.clone(),
    }
}

fn log_config(args: &Args, config: &Config) -> LogConfig {
    LogConfig {
        level: if args.verbose { Level::DEBUG } else { Level::INFO },
        console: true,
        log_file: args.log_file.clone().or_else(|| config.log_file.clone()),
    }
}

fn download(args: &DownloadArgs, config: &Config) -> Result<PathBuf, CliRunError> {
    let settings = resolve_settings(args, config);

    let mut builder = PoliteClient::builder().delay_secs(settings.delay_secs);
    if let Some(secs) = settings.timeout_secs {
        builder = builder.timeout_secs(secs);
    }
    if let Some(ua) = settings.user_agent {
        builder = builder.user_agent(ua);
    }
    let mut client = builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

    let options = ScrapeOptions {
        chapter_limit: settings.chapter_limit,
        fichub_api_url: settings.fichub_api_url,
    };
    let novel = NovelInfo::new(&args.novel_name, &args.novel_url);
    let mut scraper = NovelScraper::new(args.provider, novel, &options);
    let written = scraper
        .run(&mut client, &settings.output_dir)
        .inspect_err(|e| error!("Error occurred while downloading: {}", e))?;
    info!(
        provider = %args.provider,
        chapters = written.len(),
        "download complete"
    );
    Ok(settings.output_dir)
}

/// Entry point for the CLI. Returns the output directory on success.
pub fn run(args: &Args) -> Result<PathBuf, CliRunError> {
    let config = Config::load(args.config.as_deref())?;
    let subscriber = logging::subscriber(&log_config(args, &config))?;

    tracing::subscriber::with_default(subscriber, || match &args.command {
        Command::Download(download_args) => {
            let output_dir = download(download_args, &config)?;
            println!(
                "Successfully downloaded chapters to {}",
                output_dir.display()
            );
            Ok(output_dir)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("novel-scrapers").chain(argv.iter().copied()))
    }

    fn download_args(args: &Args) -> &DownloadArgs {
        match &args.command {
            Command::Download(d) => d,
        }
    }

    #[test]
    fn parse_download_command() -> Result<(), clap::Error> {
        let args = parse(&[
            "download",
            "--provider",
            "Royal Road",
            "--novel-name",
            "Mother of Learning",
            "--novel-url",
            "https://www.royalroad.com/fiction/21220/mother-of-learning",
        ])?;
        let d = download_args(&args);
        assert_eq!(d.provider, Provider::RoyalRoad);
        assert_eq!(d.novel_name, "Mother of Learning");
        assert!(d.output_dir.is_none());
        assert!(!args.verbose);
        Ok(())
    }

    #[test]
    fn parse_provider_case_insensitive() {
        assert_eq!(parse_provider("FICHUB").unwrap(), Provider::Fichub);
        assert_eq!(parse_provider("royal road").unwrap(), Provider::RoyalRoad);
        assert_eq!(parse_provider("ROYAL ROAD").unwrap(), Provider::RoyalRoad);
    }

    #[test]
    fn parse_provider_invalid() {
        let err = parse_provider("wattpad").unwrap_err();
        assert!(err.contains("wattpad"));
    }

    #[test]
    fn unknown_provider_is_rejected_by_clap() {
        let result = parse(&[
            "download",
            "--provider",
            "wattpad",
            "--novel-name",
            "x",
            "--novel-url",
            "y",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_required_args_rejected() {
        assert!(parse(&["download", "--provider", "fichub"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() -> Result<(), clap::Error> {
        let args = parse(&[
            "download",
            "--provider",
            "fichub",
            "--novel-name",
            "x",
            "--novel-url",
            "y",
            "--chapters",
            "-1",
            "-v",
            "--log-file",
            "debug.log",
        ])?;
        assert!(args.verbose);
        assert_eq!(args.log_file, Some(PathBuf::from("debug.log")));
        assert_eq!(download_args(&args).chapters, Some(-1));
        Ok(())
    }

    #[test]
    fn settings_default_without_flags_or_config() -> Result<(), clap::Error> {
        let args = parse(&[
            "download",
            "--provider",
            "fichub",
            "--novel-name",
            "x",
            "--novel-url",
            "y",
        ])?;
        let s = resolve_settings(download_args(&args), &Config::default());
        assert_eq!(s.output_dir, PathBuf::from("output"));
        assert_eq!(s.delay_secs, DEFAULT_DELAY_SECS);
        assert_eq!(s.timeout_secs, None);
        assert_eq!(s.chapter_limit, None);
        Ok(())
    }

    #[test]
    fn flags_override_config() -> Result<(), clap::Error> {
        let args = parse(&[
            "download",
            "--provider",
            "royal road",
            "--novel-name",
            "x",
            "--novel-url",
            "y",
            "--output-dir",
            "cli-out",
            "--delay",
            "0",
        ])?;
        let config = Config {
            output_dir: Some(PathBuf::from("cfg-out")),
            request_delay_secs: Some(5),
            timeout_secs: Some(20),
            chapter_limit: Some(3),
            ..Default::default()
        };
        let s = resolve_settings(download_args(&args), &config);
        assert_eq!(s.output_dir, PathBuf::from("cli-out"));
        assert_eq!(s.delay_secs, 0);
        assert_eq!(s.timeout_secs, Some(20));
        assert_eq!(s.chapter_limit, Some(3));
        Ok(())
    }

    #[test]
    fn verbose_raises_log_level() -> Result<(), clap::Error> {
        let args = parse(&[
            "--verbose",
            "download",
            "--provider",
            "fichub",
            "--novel-name",
            "x",
            "--novel-url",
            "y",
        ])?;
        let config = Config {
            log_file: Some(PathBuf::from("cfg.log")),
            ..Default::default()
        };
        let lc = log_config(&args, &config);
        assert_eq!(lc.level, Level::DEBUG);
        assert_eq!(lc.log_file, Some(PathBuf::from("cfg.log")));
        Ok(())
    }

    #[test]
    fn report_error_prints_download_failure() {
        let err = CliRunError::from(ScraperError::HttpStatus {
            status: 404,
            url: "https://www.royalroad.com/fiction/1".into(),
        });
        let mut out = Vec::new();
        report_error(&err, false, &mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Error occurred while downloading: "));
        assert!(text.contains("404"));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn report_error_verbose_adds_cause_chain() {
        let err = CliRunError::from(ScraperError::io(
            "output/1.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        ));
        let mut out = Vec::new();
        report_error(&err, true, &mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  cause: "));
        assert!(text.contains("denied"));
    }

    #[test]
    fn config_error_is_shown_as_is() {
        let err = CliRunError::from(ConfigError::Read {
            path: PathBuf::from("missing.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        });
        assert!(err.to_string().starts_with("Cannot read config missing.toml"));
    }

    #[test]
    fn run_reports_missing_explicit_config() -> Result<(), clap::Error> {
        let args = parse(&[
            "download",
            "--provider",
            "fichub",
            "--novel-name",
            "x",
            "--novel-url",
            "y",
            "--config",
            "/nonexistent/novel-scrapers.toml",
        ])?;
        assert!(matches!(
            run(&args),
            Err(CliRunError::Config(ConfigError::Read { .. }))
        ));
        Ok(())
    }

    #[test]
    fn scraper_error_message_has_prefix() {
        let e = CliRunError::from(ScraperError::NotInitialized);
        assert!(e
            .to_string()
            .starts_with("Error occurred while downloading: "));
    }
}
