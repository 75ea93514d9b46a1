//! Shared HTTP plumbing for the scholarly source clients.
//!
//! Every client owns one [`SourceHttp`]: a `reqwest` client, a minimum
//! inter-request interval and a retry policy. Requests run strictly one at a
//! time, so the rate limiter only needs the timestamp of the previous call.

use std::time::{Duration, Instant};

use rand::Rng;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use super::domain::{EnrichmentError, EnrichmentSource};

/// User agent sent when a source has none configured.
pub const DEFAULT_USER_AGENT: &str = concat!("bibfeed/", env!("CARGO_PKG_VERSION"));

/// Upper bound of the random delay added when the limiter has to wait.
const MAX_JITTER_SECS: f64 = 0.1;

/// Connection and retry settings for one source.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub base_url: String,
    /// Minimum time between two requests
    pub rate_limit: Duration,
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base backoff; attempt `n` waits `backoff * 2^n`
    pub backoff: Duration,
    pub user_agent: String,
}

impl ClientSettings {
    /// Settings with the common defaults and the given endpoint.
    pub fn new(base_url: impl Into<String>, rate_limit: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            rate_limit,
            timeout: Duration::from_secs(15),
            max_retries: 3,
            backoff: Duration::from_millis(500),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Add a `mailto:` contact to the default user agent.
    ///
    /// Crossref routes requests that identify a contact to its polite pool.
    pub fn with_contact(mut self, email: Option<&str>) -> Self {
        if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) {
            self.user_agent = format!("{} (mailto:{})", DEFAULT_USER_AGENT, email);
        }
        self
    }

    /// Wait before retry number `attempt` (zero based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Enforces a minimum interval between consecutive requests.
#[derive(Debug)]
pub struct RateLimiter {
    source: EnrichmentSource,
    min_interval: Duration,
    last_request: Option<Instant>,
    request_count: u64,
    log_every: u64,
}

impl RateLimiter {
    pub fn new(source: EnrichmentSource, min_interval: Duration, log_every: u64) -> Self {
        Self {
            source,
            min_interval,
            last_request: None,
            request_count: 0,
            log_every: log_every.max(1),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Sleep until the next request is allowed, then count it.
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let jitter = rand::rng().random_range(0.0..MAX_JITTER_SECS);
                let wait = self.min_interval - elapsed + Duration::from_secs_f64(jitter);
                debug!(source = %self.source, wait_ms = wait.as_millis() as u64, "Rate limiting");
                tokio::time::sleep(wait).await;
            }
        }

        self.last_request = Some(Instant::now());
        self.request_count += 1;

        if self.request_count % self.log_every == 0 {
            info!(
                "{} API: {} requests made",
                self.source.display_name(),
                self.request_count
            );
        }
    }
}

/// Rate-limited, retrying HTTP GET client for one source.
pub struct SourceHttp {
    source: EnrichmentSource,
    http_client: reqwest::Client,
    settings: ClientSettings,
    limiter: RateLimiter,
}

impl SourceHttp {
    /// Build the client. `log_every` controls the request counter log line.
    pub fn new(
        source: EnrichmentSource,
        settings: ClientSettings,
        log_every: u64,
    ) -> Result<Self, EnrichmentError> {
        let http_client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout)
            .build()
            .map_err(|e| EnrichmentError::Network(format!("failed to build HTTP client: {}", e)))?;

        let limiter = RateLimiter::new(source, settings.rate_limit, log_every);

        Ok(Self {
            source,
            http_client,
            settings,
            limiter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    /// Requests sent so far, retries included.
    pub fn request_count(&self) -> u64 {
        self.limiter.request_count()
    }

    pub fn min_interval(&self) -> Duration {
        self.limiter.min_interval()
    }

    /// GET `url` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &mut self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, String)],
    ) -> Result<T, EnrichmentError> {
        let body = self.get_text(url, query, headers).await?;
        serde_json::from_str(&body).map_err(|e| EnrichmentError::Parse(e.to_string()))
    }

    /// GET `url` with retries, returning the body text.
    ///
    /// Retryable failures (429, 5xx, timeouts, connection errors) are retried
    /// up to `max_retries` times with exponential backoff. Everything else is
    /// returned immediately.
    pub async fn get_text(
        &mut self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, String)],
    ) -> Result<String, EnrichmentError> {
        let mut attempt = 0;
        loop {
            self.limiter.acquire().await;

            match self.send_once(url, query, headers).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.settings.max_retries => {
                    let wait = self.settings.backoff_for(attempt);
                    warn!(
                        "{} request failed ({}), retrying in {:.1}s (attempt {}/{})",
                        self.source.display_name(),
                        e,
                        wait.as_secs_f64(),
                        attempt + 1,
                        self.settings.max_retries
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        error!(
                            "{} request failed after {} retries: {}",
                            self.source.display_name(),
                            self.settings.max_retries,
                            e
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn send_once(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, String)],
    ) -> Result<String, EnrichmentError> {
        let mut request = self.http_client.get(url).query(query);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request.send().await.map_err(map_transport_error)?;

        check_status(response.status())?;

        response.text().await.map_err(map_transport_error)
    }
}

/// Map an HTTP status to the error taxonomy. Success maps to `Ok`.
pub fn check_status(status: reqwest::StatusCode) -> Result<(), EnrichmentError> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status.as_u16() {
        404 => EnrichmentError::NotFound,
        403 => EnrichmentError::AccessDenied,
        429 => EnrichmentError::RateLimited,
        code if status.is_server_error() => EnrichmentError::Server(code),
        code => EnrichmentError::Api {
            status: code,
            message: status.canonical_reason().unwrap_or("Unknown").to_string(),
        },
    })
}

fn map_transport_error(e: reqwest::Error) -> EnrichmentError {
    if e.is_timeout() {
        EnrichmentError::Timeout(e.to_string())
    } else if e.is_decode() {
        EnrichmentError::Parse(e.to_string())
    } else {
        EnrichmentError::Network(e.to_string())
    }
}

/// Log a failed lookup at the level its kind deserves.
///
/// Clients call this right before turning an `Err` into `None`.
pub fn log_lookup_failure(source: EnrichmentSource, what: &str, err: &EnrichmentError) {
    let name = source.display_name();
    match err {
        EnrichmentError::NotFound => info!("{}: not found: {}", name, what),
        EnrichmentError::NoMatch(_) => info!("{}: no suitable match for {}", name, what),
        EnrichmentError::AccessDenied if source == EnrichmentSource::SemanticScholar => {
            error!("{} access denied for {} (HTTP 403) - check API key", name, what)
        }
        EnrichmentError::AccessDenied => error!("{} access denied for {}", name, what),
        EnrichmentError::InvalidDoi(_)
        | EnrichmentError::TitleTooShort(_)
        | EnrichmentError::Unsupported(_) => debug!("{}: skipped {}: {}", name, what, err),
        EnrichmentError::Parse(_) => warn!("{}: malformed response for {}: {}", name, what, err),
        // Retry exhaustion was already logged by the retry loop
        _ => debug!("{}: giving up on {}: {}", name, what, err),
    }
}
