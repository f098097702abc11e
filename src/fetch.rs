//! Feed fetching with linear backoff retry logic.
//!
//! # Architecture
//!
//! - [`FetchFeed`]: one attempt at downloading and parsing a feed
//! - [`HttpFeedFetcher`]: the reqwest-backed implementation
//! - [`RetryFetch`]: decorator that retries any [`FetchFeed`] and absorbs
//!   the final failure, implementing [`FeedSource`]
//!
//! # Retry Strategy
//!
//! A fetch is retried on transport errors, non-success status codes,
//! unparseable bodies, and feeds with no entries. Before attempt `n + 1` the
//! task sleeps `base_delay * n`. When every attempt fails the error is logged
//! and an empty entry list is returned.

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::feed::parse_feed;
use crate::models::RawEntry;
use reqwest::Client;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// A single attempt at fetching the entries behind a feed URL.
///
/// # Errors
///
/// Implementations return a [`FetchError`] for transport failures, non-success
/// status codes, unparseable bodies and feeds without entries.
pub trait FetchFeed {
    async fn fetch_once(&self, url: &str) -> Result<Vec<RawEntry>, FetchError>;
}

/// Entries for a query URL, with failures already absorbed.
///
/// The collection controller only sees this trait, so an empty vector is the
/// only possible "failure" at that level.
pub trait FeedSource {
    async fn entries(&self, url: &str) -> Vec<RawEntry>;
}

/// Build the shared HTTP client: fixed identity header and default timeout.
pub fn build_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .build()
}

/// Downloads a feed with reqwest and parses it.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl FetchFeed for HttpFeedFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_once(&self, url: &str) -> Result<Vec<RawEntry>, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        let entries = parse_feed(&body)?;
        if entries.is_empty() {
            return Err(FetchError::Empty);
        }
        debug!(count = entries.len(), bytes = body.len(), "Parsed feed");
        Ok(entries)
    }
}

/// Wrapper that adds retry with linear backoff to any [`FetchFeed`].
pub struct RetryFetch<T> {
    inner: T,
    /// Total attempts, including the first.
    max_attempts: usize,
    base_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: FetchFeed,
{
    /// Wrap `inner` with retries.
    ///
    /// # Arguments
    ///
    /// * `inner` - The fetcher to retry
    /// * `max_attempts` - Total attempts including the first; `0` is treated as `1`
    /// * `base_delay` - Sleep after failed attempt `n` is `base_delay * n`
    pub fn new(inner: T, max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay slept after failed attempt number `attempt` (1-based).
    fn delay_after(&self, attempt: usize) -> Duration {
        self.base_delay
            .saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX))
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .finish()
    }
}

impl<T> FeedSource for RetryFetch<T>
where
    T: FetchFeed,
{
    /// Fetch `url`, retrying with linear backoff.
    ///
    /// # Returns
    ///
    /// The feed's entries, or an empty vector once every attempt has failed.
    #[instrument(level = "info", skip(self))]
    async fn entries(&self, url: &str) -> Vec<RawEntry> {
        let total_t0 = Instant::now();

        for attempt in 1..=self.max_attempts {
            let attempt_t0 = Instant::now();
            match self.inner.fetch_once(url).await {
                Ok(entries) => return entries,
                Err(e) => {
                    let elapsed_ms_attempt = attempt_t0.elapsed().as_millis();
                    if attempt == self.max_attempts {
                        warn!(
                            attempt,
                            max = self.max_attempts,
                            elapsed_ms_total = total_t0.elapsed().as_millis(),
                            error = %e,
                            "Feed empty or failed after all retries; treating as no entries"
                        );
                        break;
                    }
                    let delay = self.delay_after(attempt);
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_attempt,
                        ?delay,
                        error = %e,
                        "Feed fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ONE_ITEM: &str = r#"<rss version="2.0"><channel><item>
        <title>Peso mexicano cierra estable</title>
        <link>https://www.elfinanciero.com.mx/mercados/peso</link>
        <pubDate>Thu, 09 Oct 2025 14:05:00 GMT</pubDate>
      </item></channel></rss>"#;

    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl FetchFeed for Flaky {
        async fn fetch_once(&self, _url: &str) -> Result<Vec<RawEntry>, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(FetchError::Status(503))
            } else {
                Ok(vec![RawEntry {
                    title: "ok".into(),
                    ..Default::default()
                }])
            }
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_after_failures() {
        let retry = RetryFetch::new(
            Flaky { failures: 2, calls: AtomicUsize::new(0) },
            3,
            Duration::ZERO,
        );
        let entries = retry.entries("http://feed").await;
        assert_eq!(entries.len(), 1);
        assert_eq!(retry.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_yields_empty() {
        let retry = RetryFetch::new(
            Flaky { failures: usize::MAX, calls: AtomicUsize::new(0) },
            3,
            Duration::ZERO,
        );
        assert!(retry.entries("http://feed").await.is_empty());
        assert_eq!(retry.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_grows_linearly() {
        let retry = RetryFetch::new(
            Flaky { failures: 0, calls: AtomicUsize::new(0) },
            3,
            Duration::from_millis(1200),
        );
        assert_eq!(retry.delay_after(1), Duration::from_millis(1200));
        assert_eq!(retry.delay_after(2), Duration::from_millis(2400));
    }

    #[tokio::test]
    async fn test_http_fetcher_retries_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss/search"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rss/search"))
            .and(header("user-agent", "digest-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ONE_ITEM))
            .mount(&server)
            .await;

        let config = FetchConfig {
            user_agent: "digest-test/1.0".into(),
            ..FetchConfig::default()
        };
        let fetcher = HttpFeedFetcher::new(build_client(&config).unwrap());
        let retry = RetryFetch::new(fetcher, 3, Duration::from_millis(5));
        let entries = retry.entries(&format!("{}/rss/search?q=peso", server.uri())).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Peso mexicano cierra estable");
    }

    #[tokio::test]
    async fn test_http_fetcher_retries_empty_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<rss version="2.0"><channel></channel></rss>"#),
            )
            .expect(3)
            .mount(&server)
            .await;

        let client = build_client(&FetchConfig::default()).unwrap();
        let retry = RetryFetch::new(HttpFeedFetcher::new(client), 3, Duration::ZERO);
        let entries = retry.entries(&format!("{}/rss/search", server.uri())).await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_http_fetcher_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let client = build_client(&FetchConfig::default()).unwrap();
        let err = HttpFeedFetcher::new(client)
            .fetch_once(&server.uri())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }
}
