// src/core/scanner/fingerprint_scanner.rs

use tracing::{debug, error, info};
use crate::core::models::ProbeResult;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};
use std::collections::BTreeMap;

/// Defines the different types of checks that can be performed to identify a technology.
enum Check<'a> {
    /// The response status line, e.g. "200 OK".
    Status,
    /// The verbatim value of a response header.
    Header(&'a str),
    /// A substring of the `Link` header.
    LinkHeader(&'a str),
    /// Any response header whose name contains the substring.
    HeaderName(&'a str),
    /// Any of the substrings in the lowercased body.
    Body(&'a [&'a str]),
    /// Any of the first substrings and any of the second in the lowercased body.
    BodyBoth(&'a [&'a str], &'a [&'a str]),
    /// A regex over the lowercased body.
    BodyRegex(&'a Lazy<Regex>),
    /// The `content` of `<meta name="generator">`.
    Generator,
}

/// A rule that writes one key of the technology map when its check matches.
struct FingerprintRule<'a> {
    /// The signal name (e.g. "CMS").
    key: &'a str,
    /// Fixed value to record. `None` records what the check captured.
    value: Option<&'a str>,
    check: Check<'a>,
}

const REACT_MARKERS: &[&str] = &[
    "react-dom",
    "react.production.min.js",
    "react.development.js",
    "__reactfiber",
    "data-reactroot",
];
const VUE_MARKERS: &[&str] = &["vue.min.js", "vue.runtime", "data-v-", "__vue__"];

static RE_NG_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r#"ng-version="?[\d.]+"#).unwrap());
static RE_JQUERY: Lazy<Regex> = Lazy::new(|| Regex::new(r"jquery(-[\d.]+)?(\.min)?\.js").unwrap());

/// Evaluated top to bottom against a single map. A later match for a key
/// overwrites an earlier one, so more specific evidence sits lower down.
static RULES: &[FingerprintRule] = &[
    FingerprintRule { key: "Status", value: None, check: Check::Status },
    FingerprintRule { key: "Server", value: None, check: Check::Header("server") },
    FingerprintRule { key: "X-Powered-By", value: None, check: Check::Header("x-powered-by") },
    FingerprintRule { key: "API", value: Some("API Platform (likely)"), check: Check::LinkHeader("api-platform") },
    FingerprintRule { key: "CMS", value: Some("WordPress (REST API indicator)"), check: Check::LinkHeader(r#"rel="https://api.w.org/""#) },
    // Vendor headers.
    FingerprintRule { key: "Backend", value: Some("Django"), check: Check::HeaderName("x-django") },
    FingerprintRule { key: "Backend", value: Some("Laravel"), check: Check::HeaderName("x-laravel") },
    FingerprintRule { key: "Framework", value: Some("Next.js"), check: Check::HeaderName("x-nextjs") },
    FingerprintRule { key: "Framework", value: Some("Next.js (Vercel)"), check: Check::HeaderName("x-vercel") },
    FingerprintRule { key: "Framework", value: Some("Nuxt.js"), check: Check::HeaderName("x-nuxt") },
    FingerprintRule { key: "Framework", value: Some("Remix"), check: Check::HeaderName("x-remix") },
    FingerprintRule { key: "Framework", value: Some("Svelte"), check: Check::HeaderName("x-svelte") },
    FingerprintRule { key: "Framework", value: Some("SvelteKit"), check: Check::HeaderName("x-sveltekit") },
    FingerprintRule { key: "Framework", value: Some("Vue"), check: Check::HeaderName("x-vue") },
    FingerprintRule { key: "Framework", value: Some("Astro"), check: Check::HeaderName("x-astro") },
    // CMS and platforms.
    FingerprintRule { key: "CMS", value: Some("WordPress"), check: Check::Body(&["wp-content", "wp-includes", "wordpress", "wp-json"]) },
    FingerprintRule { key: "CMS", value: Some("Drupal"), check: Check::Body(&["drupal", "sites/all", "sites/default/files"]) },
    FingerprintRule { key: "CMS", value: Some("Joomla"), check: Check::Body(&["joomla", "/media/jui/"]) },
    FingerprintRule { key: "Platform", value: Some("Shopify"), check: Check::Body(&["shopify", "cdn.shopify.com"]) },
    // Front-end frameworks.
    FingerprintRule { key: "Frontend", value: Some("React"), check: Check::Body(REACT_MARKERS) },
    FingerprintRule { key: "Framework", value: Some("Next.js"), check: Check::BodyBoth(REACT_MARKERS, &["next/", "_next/"]) },
    FingerprintRule { key: "Frontend", value: Some("Vue.js"), check: Check::Body(VUE_MARKERS) },
    FingerprintRule { key: "Frontend", value: Some("Vue.js"), check: Check::BodyBoth(&["createapp"], &["vue"]) },
    FingerprintRule { key: "Framework", value: Some("Nuxt"), check: Check::BodyBoth(VUE_MARKERS, &["nuxt"]) },
    FingerprintRule { key: "Frontend", value: Some("Angular"), check: Check::Body(&["angular.min.js", "ng-app", "ng-csp"]) },
    FingerprintRule { key: "Frontend", value: Some("Angular"), check: Check::BodyRegex(&RE_NG_VERSION) },
    FingerprintRule { key: "Frontend", value: Some("Svelte"), check: Check::Body(&["svelte/internal", "svelte-", "data-svelte"]) },
    // Shared libraries.
    FingerprintRule { key: "Library", value: Some("jQuery"), check: Check::BodyRegex(&RE_JQUERY) },
    FingerprintRule { key: "Library", value: Some("Lodash (likely)"), check: Check::Body(&["lodash", "_.assign"]) },
    FingerprintRule { key: "Generator", value: None, check: Check::Generator },
    // Body hints for meta-frameworks.
    FingerprintRule { key: "Framework", value: Some("Next.js"), check: Check::Body(&["next/static", "_next/static", "next/head"]) },
    FingerprintRule { key: "Framework", value: Some("Nuxt"), check: Check::Body(&["nuxt", "__nuxt"]) },
    FingerprintRule { key: "Framework", value: Some("Astro"), check: Check::Body(&["astro", "astro-island"]) },
    FingerprintRule { key: "Framework", value: Some("Svelte / SvelteKit"), check: Check::Body(&["svelte", "svelte-", "data-svelte"]) },
    FingerprintRule { key: "Backend", value: Some("Laravel (likely)"), check: Check::Body(&["laravel-mix", "/js/app.js?id="]) },
];

/// Runs a technology fingerprinting scan against the base URL.
///
/// It sends a single GET request, then applies [`RULES`] in order to the
/// status line, headers and body.
pub async fn run_fingerprint_scan(client: &reqwest::Client, base_url: &str) -> ProbeResult<BTreeMap<String, String>> {
    info!(url = base_url, "Starting fingerprint scan.");

    let response = match client.get(base_url).send().await {
        Ok(res) => {
            info!(status = %res.status(), "Received HTTP response.");
            res
        }
        Err(e) => {
            error!(url = base_url, error = %e, "HTTP request failed");
            return Err(format!("HTTP request failed: {}", e));
        }
    };

    let status = response.status();
    let status_line = match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    };
    let headers = response.headers().clone();

    let body = match response.text().await {
        Ok(text) => {
            debug!(bytes = %text.len(), "Successfully read response body.");
            text
        }
        Err(e) => {
            error!(error = %e, "Failed to read response body");
            return Err(format!("Failed to read response body: {}", e));
        }
    };

    let technologies = fingerprint(&status_line, &headers, &body);
    info!(count = %technologies.len(), "Fingerprint scan finished.");
    Ok(technologies)
}

/// Applies every rule to an already fetched response.
pub fn fingerprint(status_line: &str, headers: &HeaderMap, body: &str) -> BTreeMap<String, String> {
    let lower_body = body.to_lowercase();
    let document = Html::parse_document(body);
    let mut found = BTreeMap::new();

    debug!(total_rules = %RULES.len(), "Applying fingerprinting rules.");
    for rule in RULES {
        let captured = match &rule.check {
            Check::Status => Some(status_line.to_string()),
            Check::Header(name) => header_value(headers, name),
            Check::LinkHeader(needle) => {
                header_value(headers, "link").filter(|link| link.contains(needle)).map(|_| String::new())
            }
            Check::HeaderName(needle) => {
                headers.keys().any(|name| name.as_str().contains(needle)).then(String::new)
            }
            Check::Body(needles) => contains_any(&lower_body, needles).then(String::new),
            Check::BodyBoth(first, second) => {
                (contains_any(&lower_body, first) && contains_any(&lower_body, second)).then(String::new)
            }
            Check::BodyRegex(re) => re.is_match(&lower_body).then(String::new),
            Check::Generator => generator_meta(&document),
        };

        if let Some(captured) = captured {
            let value = rule.value.map(str::to_string).unwrap_or(captured);
            if let Some(previous) = found.insert(rule.key.to_string(), value.clone()) {
                if previous != value {
                    debug!(key = rule.key, %previous, %value, "Later rule overrides signal.");
                }
            }
        }
    }

    found
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| v.to_str().map(str::to_string).unwrap_or_else(|_| "[Invalid UTF-8]".to_string()))
        .filter(|v| !v.is_empty())
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Reads the `content` of the first `<meta name="generator">` tag.
fn generator_meta(doc: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name][content]").ok()?;
    doc.select(&selector)
        .find(|el| el.value().attr("name").is_some_and(|n| n.eq_ignore_ascii_case("generator")))
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::test_support::{spawn_http_server, test_client, MockResponse};
    use reqwest::header::{HeaderName, HeaderValue};
    use std::collections::HashMap;
    use std::time::Duration;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn status_and_server_headers_are_verbatim() {
        let found = fingerprint(
            "200 OK",
            &headers(&[("server", "nginx/1.25.3"), ("x-powered-by", "PHP/8.2.1")]),
            "",
        );

        assert_eq!(found["Status"], "200 OK");
        assert_eq!(found["Server"], "nginx/1.25.3");
        assert_eq!(found["X-Powered-By"], "PHP/8.2.1");
    }

    #[test]
    fn link_header_flags_wordpress_api() {
        let found = fingerprint(
            "200 OK",
            &headers(&[("link", r#"<https://example.com/wp-json/>; rel="https://api.w.org/""#)]),
            "",
        );
        assert_eq!(found["CMS"], "WordPress (REST API indicator)");
    }

    #[test]
    fn body_evidence_overrides_link_header() {
        let found = fingerprint(
            "200 OK",
            &headers(&[("link", r#"<https://example.com/wp-json/>; rel="https://api.w.org/""#)]),
            r#"<link rel="stylesheet" href="/wp-content/themes/x/style.css">"#,
        );
        assert_eq!(found["CMS"], "WordPress");
    }

    #[test]
    fn later_cms_rule_wins() {
        let found = fingerprint("200 OK", &HeaderMap::new(), "Powered by WordPress, migrated to Drupal");
        assert_eq!(found["CMS"], "Drupal");
    }

    #[test]
    fn sveltekit_header_is_more_specific_than_svelte() {
        let found = fingerprint("200 OK", &headers(&[("x-sveltekit-page", "true")]), "");
        assert_eq!(found["Framework"], "SvelteKit");
    }

    #[test]
    fn vendor_headers_identify_backend() {
        let found = fingerprint("200 OK", &headers(&[("x-laravel-session", "1")]), "");
        assert_eq!(found["Backend"], "Laravel");
    }

    #[test]
    fn react_with_next_assets() {
        let body = r#"<div id="__next" data-reactroot=""></div><script src="/_next/static/chunks/main.js"></script>"#;
        let found = fingerprint("200 OK", &HeaderMap::new(), body);

        assert_eq!(found["Frontend"], "React");
        assert_eq!(found["Framework"], "Next.js");
    }

    #[test]
    fn angular_version_attribute_and_libraries() {
        let body = r#"<app-root ng-version="17.0.1"></app-root><script src="/js/jquery-3.7.1.min.js"></script>"#;
        let found = fingerprint("200 OK", &HeaderMap::new(), body);

        assert_eq!(found["Frontend"], "Angular");
        assert_eq!(found["Library"], "jQuery");
    }

    #[test]
    fn lodash_overrides_jquery_as_library() {
        let found = fingerprint("200 OK", &HeaderMap::new(), "jquery.min.js lodash.min.js");
        assert_eq!(found["Library"], "Lodash (likely)");
    }

    #[test]
    fn generator_meta_is_extracted() {
        let body = r#"<html><head><meta name="Generator" content=" Hugo 0.120.4 "></head></html>"#;
        let found = fingerprint("200 OK", &HeaderMap::new(), body);
        assert_eq!(found["Generator"], "Hugo 0.120.4");
    }

    #[test]
    fn plain_page_only_reports_status() {
        let found = fingerprint("404 Not Found", &HeaderMap::new(), "<html><body>Nothing here</body></html>");
        assert_eq!(found, BTreeMap::from([("Status".to_string(), "404 Not Found".to_string())]));
    }

    #[tokio::test]
    async fn fetches_and_fingerprints_base_url() {
        let routes = HashMap::from([(
            "/".to_string(),
            MockResponse::ok("<script src=\"https://cdn.shopify.com/s/app.js\"></script>")
                .header("Server", "cloudflare"),
        )]);
        let addr = spawn_http_server(routes, Duration::ZERO).await;
        let client = test_client(Duration::from_secs(5));

        let found = run_fingerprint_scan(&client, &format!("http://{addr}/")).await.unwrap();

        assert_eq!(found["Status"], "200 OK");
        assert_eq!(found["Server"], "cloudflare");
        assert_eq!(found["Platform"], "Shopify");
    }

    #[tokio::test]
    async fn unreachable_target_is_an_error() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = test_client(Duration::from_secs(5));

        assert!(run_fingerprint_scan(&client, &format!("http://127.0.0.1:{port}/")).await.is_err());
    }
}
