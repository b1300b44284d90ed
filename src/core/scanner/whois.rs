// src/core/scanner/whois.rs

use tracing::{debug, info, warn};

use crate::core::error::WhoisError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Key holding the full registry answer when no known field matched.
pub const RAW_RESPONSE_KEY: &str = "raw_response";

static RE_REFERRAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)whois:\s*(\S+)").unwrap());

static RE_OWNER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)Registrant Name:[ \t]*(.*)$").unwrap());
static RE_ORGANIZATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)Registrant Organization:[ \t]*(.*)$").unwrap());
static RE_REGISTRAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)Registrar:[ \t]*(.*)$").unwrap());
static RE_CREATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)Creation Date:[ \t]*(.*)$").unwrap());
static RE_EXPIRATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)Expiration Date:[ \t]*(.*)$").unwrap());
static RE_UPDATED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)Updated Date:[ \t]*(.*)$").unwrap());
static RE_NAME_SERVER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)Name Server:[ \t]*(.*)$").unwrap());
static RE_STATUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)Status:[ \t]*(.*)$").unwrap());

/// Output field name paired with the line pattern that fills it. The first
/// matching line wins for each field.
static FIELD_PATTERNS: &[(&str, &Lazy<Regex>)] = &[
    ("owner", &RE_OWNER),
    ("organization", &RE_ORGANIZATION),
    ("registrar", &RE_REGISTRAR),
    ("creation_date", &RE_CREATION),
    ("expiration_date", &RE_EXPIRATION),
    ("updated_date", &RE_UPDATED),
    ("name_server", &RE_NAME_SERVER),
    ("status", &RE_STATUS),
];

/// Two-hop WHOIS client: ask the root authority who serves the domain, then
/// ask that server.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    root_server: String,
    port: u16,
    timeout: Duration,
}

impl WhoisClient {
    pub fn new(root_server: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self { root_server: root_server.into(), port, timeout }
    }

    /// Runs the full lookup and reports which hop failed, if any.
    pub async fn lookup(&self, domain: &str) -> Result<BTreeMap<String, String>, WhoisError> {
        info!(target = domain, root = %self.root_server, "Starting WHOIS lookup.");

        let root_response = self.query(&self.root_server, domain).await?;
        let referral = extract_referral(&root_response).ok_or_else(|| {
            warn!(target = domain, "Root WHOIS answer carried no referral.");
            WhoisError::NoReferral
        })?;
        debug!(target = domain, referral, "Following WHOIS referral.");

        let registry_response = self.query(referral, domain).await?;
        let fields = parse_whois_response(domain, &registry_response);
        info!(target = domain, fields = fields.len(), "WHOIS lookup finished.");
        Ok(fields)
    }

    /// One request/response exchange: send the domain terminated by CRLF and
    /// read until the server closes the connection.
    async fn query(&self, server: &str, domain: &str) -> Result<String, WhoisError> {
        debug!(server, port = self.port, "Connecting to WHOIS server.");
        let connect = TcpStream::connect((server, self.port));
        let mut stream = tokio::time::timeout(self.timeout, connect)
            .await
            .map_err(|_| self.timed_out(server))?
            .map_err(|source| WhoisError::Connect { server: server.to_string(), source })?;

        let exchange = async {
            stream.write_all(format!("{domain}\r\n").as_bytes()).await?;
            let mut raw = Vec::new();
            stream.read_to_end(&mut raw).await?;
            Ok::<_, std::io::Error>(raw)
        };
        let raw = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| self.timed_out(server))?
            .map_err(|source| WhoisError::Io { server: server.to_string(), source })?;

        debug!(server, bytes = raw.len(), "WHOIS response received.");
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    fn timed_out(&self, server: &str) -> WhoisError {
        warn!(server, timeout = ?self.timeout, "WHOIS exchange timed out.");
        WhoisError::Timeout { server: server.to_string(), timeout: self.timeout }
    }
}

/// Finds the first `whois: <server>` marker in a root authority answer.
pub fn extract_referral(response: &str) -> Option<&str> {
    RE_REFERRAL
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Extracts the known registry fields from `response`.
///
/// The mapping always holds `domain`. When none of the field patterns match,
/// the whole response is kept under [`RAW_RESPONSE_KEY`] instead.
pub fn parse_whois_response(domain: &str, response: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    fields.insert("domain".to_string(), domain.to_string());

    for (name, pattern) in FIELD_PATTERNS {
        if let Some(value) = pattern.captures(response).and_then(|caps| caps.get(1)) {
            fields.insert(name.to_string(), value.as_str().trim().to_string());
        }
    }

    if fields.len() == 1 {
        debug!(target = domain, "No WHOIS field recognised, keeping raw response.");
        fields.insert(RAW_RESPONSE_KEY.to_string(), response.to_string());
    }
    fields
}

/// The mapping reported for a lookup that failed at either hop.
pub fn failure_record(domain: &str, error: &WhoisError) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("domain".to_string(), domain.to_string()),
        ("error".to_string(), error.to_string()),
    ])
}
