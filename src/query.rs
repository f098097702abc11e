//! Search query construction.
//!
//! A topic's terms are OR-joined, optionally followed by a `site:` clause for
//! the preferred sources, and closed with a `when:<N>d` recency window.

use crate::config::SearchConfig;
use crate::models::{Scope, Topic};
use itertools::Itertools;
use std::collections::BTreeSet;

/// Build the query string for one (topic, scope) pair.
///
/// ```text
/// (Nafin OR Bancomext) (site:eleconomista.com.mx OR site:reuters.com) when:1d
/// ```
///
/// The site clause is omitted for [`Scope::AnySource`] or when no preferred
/// domains are configured. Topics are validated non-empty at config load.
pub fn build_query(
    terms: &[String],
    scope: Scope,
    preferred: &BTreeSet<String>,
    window_days: u32,
) -> String {
    let mut query = format!("({})", terms.iter().map(|t| t.trim()).join(" OR "));
    if scope.is_restricted() && !preferred.is_empty() {
        let sites = preferred.iter().map(|d| format!("site:{d}")).join(" OR ");
        query.push_str(&format!(" ({sites})"));
    }
    query.push_str(&format!(" when:{window_days}d"));
    query
}

/// Full RSS search URL for a query, with the configured locale parameters.
pub fn search_url(search: &SearchConfig, query: &str) -> String {
    format!(
        "{}?q={}&hl={}&gl={}&ceid={}",
        search.endpoint,
        urlencoding::encode(query),
        urlencoding::encode(&search.hl),
        urlencoding::encode(&search.gl),
        urlencoding::encode(&search.ceid),
    )
}

/// Query URL for a topic under a scope.
pub fn topic_url(
    topic: &Topic,
    scope: Scope,
    preferred: &BTreeSet<String>,
    search: &SearchConfig,
) -> String {
    let query = build_query(&topic.terms, scope, preferred, search.window_days);
    search_url(search, &query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(ts: &[&str]) -> Vec<String> {
        ts.iter().map(|s| s.to_string()).collect()
    }

    fn domains(ds: &[&str]) -> BTreeSet<String> {
        ds.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unrestricted_query() {
        let q = build_query(&terms(&["Nafin", "Bancomext"]), Scope::AnySource, &domains(&["x.com"]), 1);
        assert_eq!(q, "(Nafin OR Bancomext) when:1d");
    }

    #[test]
    fn test_restricted_query_has_site_clause() {
        let q = build_query(
            &terms(&["Nafin", "Bancomext"]),
            Scope::PreferredOnly,
            &domains(&["reuters.com", "eleconomista.com.mx"]),
            1,
        );
        assert_eq!(
            q,
            "(Nafin OR Bancomext) (site:eleconomista.com.mx OR site:reuters.com) when:1d"
        );
    }

    #[test]
    fn test_restricted_query_without_preferred_domains() {
        let q = build_query(&terms(&["FIRA"]), Scope::PreferredOnly, &BTreeSet::new(), 2);
        assert_eq!(q, "(FIRA) when:2d");
    }

    #[test]
    fn test_search_url_encodes_query_and_locale() {
        let search = SearchConfig::default();
        let url = search_url(&search, "(Plan México) when:1d");
        assert_eq!(
            url,
            "https://news.google.com/rss/search?q=%28Plan%20M%C3%A9xico%29%20when%3A1d&hl=es-419&gl=MX&ceid=MX%3Aes-419"
        );
    }

    #[test]
    fn test_topic_url_uses_window() {
        let mut search = SearchConfig::default();
        search.endpoint = "http://127.0.0.1:9/rss".into();
        let topic = Topic::new("Inversión", ["IED México"]);
        let url = topic_url(&topic, Scope::AnySource, &BTreeSet::new(), &search);
        assert!(url.starts_with("http://127.0.0.1:9/rss?q=%28IED%20M%C3%A9xico%29%20when%3A1d"));
    }
}
