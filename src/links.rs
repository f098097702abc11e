//! Canonical link and source domain resolution.
//!
//! The search aggregator wraps most article links in its own redirect pages.
//! A wrapped link is unwrapped from its `url` query parameter when present,
//! otherwise by following the redirect chain with a HEAD request. Resolution
//! never fails: the original link is kept when nothing better is found.
//!
//! The display domain never names the aggregator. When resolution ends on an
//! aggregator host, the domain comes from the feed's source hint, or is left
//! empty when there is none.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

static HOST_FALLBACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://([^/?#]+)").unwrap());

/// A link after unwrapping, with its display domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub url: String,
    pub domain: String,
}

#[derive(Debug, Clone)]
pub struct LinkResolver {
    client: Client,
    aggregator_hosts: Vec<String>,
    head_timeout: Duration,
}

impl LinkResolver {
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client used for HEAD requests
    /// * `aggregator_hosts` - Hosts whose links are unwrapped; subdomains match too
    /// * `head_timeout` - Timeout for each HEAD request
    pub fn new(client: Client, aggregator_hosts: Vec<String>, head_timeout: Duration) -> Self {
        let aggregator_hosts = aggregator_hosts
            .into_iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        Self {
            client,
            aggregator_hosts,
            head_timeout,
        }
    }

    /// True when `host` is an aggregator host or one of its subdomains.
    fn is_aggregator(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.aggregator_hosts
            .iter()
            .any(|a| host == *a || host.ends_with(&format!(".{a}")))
    }

    /// True when `link` parses as a URL whose host is an aggregator host.
    fn is_aggregator_link(&self, link: &str) -> bool {
        Url::parse(link)
            .ok()
            .and_then(|u| u.host_str().map(|h| self.is_aggregator(h)))
            .unwrap_or(false)
    }

    /// Resolve a feed link to the publisher URL and its domain.
    ///
    /// # Arguments
    ///
    /// * `link` - The link as found in the feed entry
    /// * `source_hint` - Publisher home page named by the feed, if any
    ///
    /// # Returns
    ///
    /// The unwrapped URL (or `link` itself when unwrapping fails) and its
    /// display domain. When the URL is still on an aggregator host the domain
    /// is taken from `source_hint`, or left empty.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self, link: &str, source_hint: Option<&str>) -> ResolvedLink {
        let url = self.unwrap_link(link).await;
        if !self.is_aggregator_link(&url) {
            let domain = domain_of(&url);
            return ResolvedLink { url, domain };
        }

        let domain = source_hint
            .filter(|hint| !self.is_aggregator_link(hint))
            .map(domain_of)
            .unwrap_or_default();
        debug!(%url, %domain, "Link still on aggregator; domain from source hint");
        ResolvedLink { url, domain }
    }

    async fn unwrap_link(&self, link: &str) -> String {
        let Ok(parsed) = Url::parse(link) else {
            return link.to_string();
        };
        let Some(host) = parsed.host_str() else {
            return link.to_string();
        };
        if !self.is_aggregator(host) {
            return link.to_string();
        }

        if let Some(target) = url_param(&parsed) {
            debug!(%target, "Unwrapped aggregator link from url parameter");
            return target;
        }

        match self
            .client
            .head(link)
            .timeout(self.head_timeout)
            .send()
            .await
        {
            // Publishers often refuse HEAD; the redirect chain already named them.
            Ok(resp) if !self.is_aggregator_link(resp.url().as_str()) => {
                let target = resp.url().to_string();
                debug!(%target, status = resp.status().as_u16(), "Unwrapped aggregator link by following redirects");
                target
            }
            Ok(resp) => {
                debug!(status = resp.status().as_u16(), "HEAD did not leave the aggregator; keeping original");
                link.to_string()
            }
            Err(e) => {
                debug!(error = %e, "HEAD on aggregator link failed; keeping original");
                link.to_string()
            }
        }
    }
}

/// The `url` query parameter, if it holds an absolute http(s) URL.
fn url_param(parsed: &Url) -> Option<String> {
    parsed
        .query_pairs()
        .find(|(k, _)| k == "url")
        .map(|(_, v)| v.into_owned())
        .filter(|v| Url::parse(v).is_ok_and(|u| matches!(u.scheme(), "http" | "https")))
}

/// Display domain of a link: lower-cased host without a leading `www.` and
/// without the default HTTPS port. Non-default ports are kept. Links that do
/// not parse as URLs get a best-effort regex extraction; no host yields `""`.
pub fn domain_of(link: &str) -> String {
    let host = match Url::parse(link) {
        Ok(u) => match (u.host_str(), u.port()) {
            (Some(h), Some(p)) if p != 443 => format!("{h}:{p}"),
            (Some(h), _) => h.to_string(),
            (None, _) => String::new(),
        },
        Err(_) => HOST_FALLBACK
            .captures(link)
            .map(|c| c[1].to_string())
            .unwrap_or_default(),
    };
    normalize_host(&host)
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let host = host.strip_suffix(":443").unwrap_or(host);
    host.to_string()
}
