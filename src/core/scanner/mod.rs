// src/core/scanner/mod.rs

// This file acts as the public interface for the `scanner` module.
// It declares every prober and hosts the orchestrator that runs them.
pub mod fingerprint_scanner;
pub mod http;
pub mod path_scanner;
pub mod port_scanner;
pub mod resolver;
pub mod whois;

#[cfg(test)]
pub(crate) mod test_support;

use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::core::error::ScanError;
use crate::core::models::ScanResult;
use self::fingerprint_scanner::run_fingerprint_scan;
use self::http::{build_client, discover_sitemap, fetch_robots_txt, select_base_url};
use self::path_scanner::probe_paths;
use self::port_scanner::probe_ports;
use self::resolver::resolve;
use self::whois::WhoisClient;

/// Executes every prober against `domain` and folds the outcomes into one
/// [`ScanResult`].
///
/// The HTTP scheme is settled first and shared by all HTTP probers. After
/// that the probers run concurrently through `tokio::join!`, which is also the
/// point where the orchestrator waits for all of them. A prober failure
/// becomes an entry in `errors`; only an empty domain aborts the scan.
pub async fn run_full_scan(domain: &str, config: &ScanConfig) -> Result<ScanResult, ScanError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(ScanError::EmptyDomain);
    }

    info!(target = domain, "Starting full scan.");
    let mut result = ScanResult::new(domain);

    let client = match build_client(&config.user_agent, config.http_timeout) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "HTTP probers disabled.");
            result.record_error(e);
            None
        }
    };

    let base_url = match &client {
        Some(client) => {
            let base = select_base_url(client, domain).await;
            if let Some(reason) = &base.fallback_reason {
                result.record_error(format!("{reason}; falling back to {}", base.url));
            }
            Some(base.url)
        }
        None => None,
    };

    let whois_client = WhoisClient::new(config.whois_server.clone(), config.whois_port, config.whois_timeout);

    let (ip, open_ports, whois_outcome, http_outcome) = tokio::join!(
        resolve(domain, config.dns_timeout),
        probe_ports(domain, config.ports(), config.port_timeout),
        whois_client.lookup(domain),
        async {
            match (&client, &base_url) {
                (Some(client), Some(base)) => Some(tokio::join!(
                    run_fingerprint_scan(client, base),
                    fetch_robots_txt(client, base),
                    discover_sitemap(client, base),
                    probe_paths(client, base, &config.wordlist, config.path_concurrency),
                )),
                _ => None,
            }
        }
    );

    match ip {
        Ok(ip) => result.ip = Some(ip.to_string()),
        Err(e) => result.record_error(e.to_string()),
    }

    result.open_ports = open_ports;

    match whois_outcome {
        Ok(fields) => result.whois = Some(fields),
        Err(e) => {
            result.record_error(format!("WHOIS lookup failed: {e}"));
            result.whois = Some(whois::failure_record(domain, &e));
        }
    }

    if let Some((technologies, robots_txt, sitemap, hidden_paths)) = http_outcome {
        match technologies {
            Ok(technologies) => result.technologies = Some(technologies),
            Err(e) => result.record_error(format!("Technology detection failed: {e}")),
        }

        result.robots_txt = robots_txt;

        result.record_sitemap(sitemap);

        match hidden_paths {
            Ok(paths) => result.hidden_paths = Some(paths),
            Err(e) => result.record_error(e.to_string()),
        }
    }

    result.scan_completed_at = Some(chrono::Utc::now());
    info!(
        target = domain,
        open_ports = result.open_ports.len(),
        errors = result.errors.len(),
        "Full scan finished."
    );
    Ok(result)
}
