// src/config.rs

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Ports probed when the caller does not supply its own list.
pub const DEFAULT_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 135, 139, 143, 443, 445, 993, 995, 1723, 3000, 3306, 3389,
    5173, 5900, 8080, 8443,
];

/// Maximum number of path probes in flight at once.
pub const DEFAULT_PATH_CONCURRENCY: usize = 12;

/// Tunables for a single scan.
///
/// Every field has a default, so a caller only overrides what it cares about.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Candidate TCP ports. `None` or an empty list selects [`DEFAULT_PORTS`].
    pub ports: Option<Vec<u16>>,
    pub port_timeout: Duration,
    pub http_timeout: Duration,
    pub whois_timeout: Duration,
    pub dns_timeout: Duration,
    pub wordlist: PathBuf,
    pub path_concurrency: usize,
    /// Root WHOIS authority queried for the referral.
    pub whois_server: String,
    pub whois_port: u16,
    pub user_agent: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ports: None,
            port_timeout: Duration::from_secs(2),
            http_timeout: Duration::from_secs(10),
            whois_timeout: Duration::from_secs(10),
            dns_timeout: Duration::from_secs(5),
            wordlist: PathBuf::from("wordlist.txt"),
            path_concurrency: DEFAULT_PATH_CONCURRENCY,
            whois_server: "whois.iana.org".to_string(),
            whois_port: 43,
            user_agent: "WebRadar/0.1".to_string(),
        }
    }
}

impl ScanConfig {
    pub fn ports(&self) -> &[u16] {
        self.ports
            .as_deref()
            .filter(|ports| !ports.is_empty())
            .unwrap_or(DEFAULT_PORTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_list_has_common_services() {
        let config = ScanConfig::default();
        assert_eq!(config.ports().len(), 22);
        assert!(config.ports().contains(&443));
        assert!(config.ports().contains(&5173));
    }

    #[test]
    fn explicit_ports_replace_defaults() {
        let config = ScanConfig {
            ports: Some(vec![8000, 9000]),
            ..Default::default()
        };
        assert_eq!(config.ports(), &[8000, 9000]);
        assert_eq!(config.path_concurrency, 12);
    }

    #[test]
    fn empty_port_list_selects_defaults() {
        let config = ScanConfig {
            ports: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(config.ports(), DEFAULT_PORTS);
    }
}
