// src/core/error.rs

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The only failure that aborts a whole scan.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScanError {
    #[error("domain must not be empty")]
    EmptyDomain,
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("DNS lookup for {domain} failed: {source}")]
    Lookup {
        domain: String,
        #[source]
        source: hickory_resolver::error::ResolveError,
    },
    #[error("DNS lookup for {0} returned no addresses")]
    NoAddress(String),
}

#[derive(Error, Debug)]
pub enum WhoisError {
    #[error("connection to {server} failed: {source}")]
    Connect {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{server} did not answer within {timeout:?}")]
    Timeout { server: String, timeout: Duration },
    #[error("exchange with {server} failed: {source}")]
    Io {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no referral server found")]
    NoReferral,
}

#[derive(Error, Debug)]
pub enum PathProbeError {
    #[error("wordlist {} could not be read: {source}", .path.display())]
    WordlistUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
