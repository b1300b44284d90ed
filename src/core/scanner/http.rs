// src/core/scanner/http.rs

use tracing::{debug, info, warn};

use crate::core::models::{ProbeResult, SitemapEntry};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

/// Conventional sitemap locations, probed in this order.
const SITEMAP_CANDIDATES: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/sitemap/sitemap.xml"];

/// Client settings shared by every HTTP-based prober. Redirects are followed
/// with reqwest's default policy, so probers see the final status.
pub fn client_builder(user_agent: &str, timeout: Duration) -> reqwest::ClientBuilder {
    reqwest::Client::builder().user_agent(user_agent).timeout(timeout)
}

/// Builds the HTTP client shared by every HTTP-based prober of one scan.
pub fn build_client(user_agent: &str, timeout: Duration) -> ProbeResult<reqwest::Client> {
    client_builder(user_agent, timeout)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))
}

/// The scheme decision for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    pub url: String,
    /// Why HTTPS was abandoned, when it was.
    pub fallback_reason: Option<String>,
}

/// Tries `https://domain` once and falls back to `http://domain` when the
/// request fails outright or the server answers with a 5xx status.
///
/// The decision is made once per scan and reused by every HTTP prober.
pub async fn select_base_url(client: &reqwest::Client, domain: &str) -> BaseUrl {
    let secure = format!("https://{}", domain);
    debug!(url = %secure, "Probing HTTPS availability.");

    let fallback_reason = match client.get(&secure).send().await {
        Ok(response) if response.status().is_server_error() => {
            Some(format!("HTTPS answered {}", response.status()))
        }
        Ok(response) => {
            info!(url = %secure, status = %response.status(), "Using HTTPS.");
            None
        }
        Err(e) => Some(format!("HTTPS request failed: {}", e)),
    };

    match fallback_reason {
        None => BaseUrl { url: secure, fallback_reason: None },
        Some(reason) => {
            warn!(target = domain, reason = %reason, "Falling back to plain HTTP.");
            BaseUrl { url: format!("http://{}", domain), fallback_reason: Some(reason) }
        }
    }
}

/// Fetches `/robots.txt`. Anything other than a 2xx answer yields an empty string.
pub async fn fetch_robots_txt(client: &reqwest::Client, base_url: &str) -> String {
    let url = format!("{}/robots.txt", base_url.trim_end_matches('/'));
    debug!(url = %url, "Fetching robots.txt.");

    let response = match client.get(&url).send().await {
        Ok(res) if res.status().is_success() => res,
        Ok(res) => {
            debug!(url = %url, status = %res.status(), "robots.txt not available.");
            return String::new();
        }
        Err(e) => {
            debug!(url = %url, error = %e, "robots.txt request failed.");
            return String::new();
        }
    };

    match response.text().await {
        Ok(body) => {
            info!(bytes = body.len(), "robots.txt retrieved.");
            body
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Failed to read robots.txt body.");
            String::new()
        }
    }
}

/// Probes the conventional sitemap locations and parses the first one that
/// answers 200 with at least one URL. Later candidates are not consulted once
/// a sitemap yields entries.
pub async fn discover_sitemap(client: &reqwest::Client, base_url: &str) -> Vec<SitemapEntry> {
    let base = base_url.trim_end_matches('/');

    for path in SITEMAP_CANDIDATES {
        let url = format!("{base}{path}");
        let body = match client.get(&url).send().await {
            Ok(res) if res.status() == reqwest::StatusCode::OK => match res.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to read sitemap body.");
                    continue;
                }
            },
            Ok(res) => {
                debug!(url = %url, status = %res.status(), "Sitemap candidate not found.");
                continue;
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Sitemap request failed.");
                continue;
            }
        };

        let entries = parse_sitemap(&body);
        if !entries.is_empty() {
            info!(url = %url, entries = entries.len(), "Sitemap parsed.");
            return entries;
        }
        debug!(url = %url, "Sitemap candidate held no URLs.");
    }

    Vec::new()
}

/// Extracts every `<loc>` value from a sitemap body.
///
/// A `<loc>` directly inside `<sitemap>` is a reference to a child sitemap;
/// every other `<loc>` is a page. Pages come first, then child references,
/// each in document order.
pub fn parse_sitemap(body: &str) -> Vec<SitemapEntry> {
    let document = Html::parse_document(body);
    let Ok(loc_selector) = Selector::parse("loc") else {
        return Vec::new();
    };

    let mut pages = Vec::new();
    let mut children = Vec::new();
    for loc in document.select(&loc_selector) {
        let text = loc.text().collect::<String>().trim().to_string();
        if text.is_empty() {
            continue;
        }
        let in_sitemap = loc
            .parent()
            .and_then(ElementRef::wrap)
            .is_some_and(|parent| parent.value().name() == "sitemap");
        if in_sitemap {
            children.push(SitemapEntry::ChildSitemap(text));
        } else {
            pages.push(SitemapEntry::Page(text));
        }
    }

    pages.extend(children);
    pages
}
