// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// --- Reusable Result Types ---

/// Outcome of a prober whose failure is only a human-readable message.
pub type ProbeResult<T> = Result<T, String>;

// --- Sitemap Models ---

/// One URL discovered in a sitemap.
///
/// A `<loc>` nested inside `<sitemap>` points at another sitemap file rather
/// than a page, so it is tagged separately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum SitemapEntry {
    Page(String),
    ChildSitemap(String),
}

impl SitemapEntry {
    pub fn url(&self) -> &str {
        match self {
            SitemapEntry::Page(url) | SitemapEntry::ChildSitemap(url) => url,
        }
    }

    pub fn is_child_sitemap(&self) -> bool {
        matches!(self, SitemapEntry::ChildSitemap(_))
    }
}

impl fmt::Display for SitemapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SitemapEntry::Page(url) => write!(f, "{url}"),
            SitemapEntry::ChildSitemap(url) => write!(f, "// referenced sitemap: {url}"),
        }
    }
}

// --- Path Prober Models ---

/// A candidate path that answered with 200 or 403.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HiddenPath {
    pub url: String,
    pub status: u16,
    pub reason: Option<String>,
}

impl fmt::Display for HiddenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{} [{} {}]", self.url, self.status, reason),
            None => write!(f, "{} [{}]", self.url, self.status),
        }
    }
}

// --- Main Result ---

/// The aggregate produced by one scan of one domain.
///
/// `None` on an optional field means the probe was not attempted or could not
/// produce anything; `Some` of an empty collection means it ran and found nothing.
/// Every recoverable failure lands in `errors`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScanResult {
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub open_ports: BTreeSet<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technologies: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois: Option<BTreeMap<String, String>>,
    pub robots_txt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitemap_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitemap_pages: Option<Vec<SitemapEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden_paths: Option<Vec<HiddenPath>>,
    pub errors: Vec<String>,
    #[serde(rename = "scan_completed_at", skip_serializing_if = "Option::is_none")]
    pub scan_completed_at: Option<DateTime<Utc>>,
}

impl ScanResult {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            ..Default::default()
        }
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Stores the discovered sitemap entries in both sitemap fields.
    ///
    /// `sitemap_urls` is the flat string view: referenced sitemaps keep their
    /// tag there so they never read as pages.
    pub fn record_sitemap(&mut self, entries: Vec<SitemapEntry>) {
        if entries.is_empty() {
            self.record_error("no sitemap.xml found or empty");
        }
        self.sitemap_urls = Some(entries.iter().map(SitemapEntry::to_string).collect());
        self.sitemap_pages = Some(entries);
    }
}
