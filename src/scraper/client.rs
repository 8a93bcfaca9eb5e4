//! Blocking HTTP client with a politeness delay between requests, and the
//! [`Fetch`] seam the providers download through.

use crate::scraper::ScraperError;
use std::time::{Duration, Instant};
use tracing::{debug, error};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; novel-scrapers/0.1; +https://github.com/novel-scrapers)";
/// Seconds to wait between consecutive requests.
pub const DEFAULT_DELAY_SECS: u64 = 1;
const MAX_REDIRECTS: usize = 10;

/// Source of raw documents. Implemented by [`PoliteClient`]; tests substitute canned pages.
pub trait Fetch {
    /// GET `url` and return the body decoded as text. Non-2xx statuses are errors.
    fn get_text(&mut self, url: &str) -> Result<String, ScraperError>;

    /// GET `url` and return the raw body. Non-2xx statuses are errors.
    fn get_bytes(&mut self, url: &str) -> Result<Vec<u8>, ScraperError>;
}

/// Blocking HTTP client that enforces a delay between requests.
#[derive(Debug)]
pub struct PoliteClient {
    inner: reqwest::blocking::Client,
    delay: Duration,
    last_request: Option<Instant>,
}

impl PoliteClient {
    /// Build a polite client with default User-Agent and delay.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    pub fn builder() -> PoliteClientBuilder {
        PoliteClientBuilder::default()
    }

    /// Perform a GET request. Sleeps until the configured delay has passed since the last request.
    pub fn get(&mut self, url: &str) -> Result<reqwest::blocking::Response, ScraperError> {
        self.wait_delay();
        debug!(url, "GET");
        let result = self.inner.get(url).send();
        self.last_request = Some(Instant::now());
        let response = result.map_err(|e| {
            error!(url, error = %e, "request failed");
            ScraperError::Network {
                url: url.to_string(),
                source: e,
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            error!(url, status = status.as_u16(), "request returned error status");
            return Err(ScraperError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn wait_delay(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
    }
}

impl Fetch for PoliteClient {
    fn get_text(&mut self, url: &str) -> Result<String, ScraperError> {
        self.get(url)?.text().map_err(|e| ScraperError::BodyRead {
            url: url.to_string(),
            source: e,
        })
    }

    fn get_bytes(&mut self, url: &str) -> Result<Vec<u8>, ScraperError> {
        self.get(url)?
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ScraperError::BodyRead {
                url: url.to_string(),
                source: e,
            })
    }
}

/// Builder for PoliteClient with optional User-Agent, delay, and timeout.
#[derive(Debug)]
pub struct PoliteClientBuilder {
    user_agent: Option<String>,
    delay_secs: u64,
    timeout_secs: Option<u64>,
}

impl Default for PoliteClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            delay_secs: DEFAULT_DELAY_SECS,
            timeout_secs: None,
        }
    }
}

impl PoliteClientBuilder {
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set delay between requests in seconds. Default 1; 0 disables it.
    pub fn delay_secs(mut self, secs: u64) -> Self {
        self.delay_secs = secs;
        self
    }

    /// Set request timeout in seconds. Unset keeps reqwest's default.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> Result<PoliteClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let mut builder = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(PoliteClient {
            inner: builder.build()?,
            delay: Duration::from_secs(self.delay_secs),
            last_request: None,
        })
    }
}
