// src/core/scanner/resolver.rs

use tracing::{debug, info, warn};

use crate::core::error::ResolveError;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use std::time::Duration;

/// Builds a resolver from the system configuration, falling back to the
/// built-in public defaults when none is available.
fn build_resolver(timeout: Duration) -> TokioAsyncResolver {
    match hickory_resolver::system_conf::read_system_conf() {
        Ok((config, mut opts)) => {
            opts.timeout = timeout;
            opts.attempts = 1;
            TokioAsyncResolver::tokio(config, opts)
        }
        Err(e) => {
            debug!(error = %e, "No usable system resolver configuration, using defaults.");
            let mut opts = ResolverOpts::default();
            opts.timeout = timeout;
            opts.attempts = 1;
            TokioAsyncResolver::tokio(ResolverConfig::default(), opts)
        }
    }
}

/// Resolves `domain` to a single address.
///
/// When the lookup returns several addresses the first one is taken in
/// whatever order the resolver produced them. No ordering is imposed here.
pub async fn resolve(domain: &str, timeout: Duration) -> Result<IpAddr, ResolveError> {
    debug!(target = domain, "Resolving domain.");
    let resolver = build_resolver(timeout);

    let lookup = resolver.lookup_ip(domain).await.map_err(|e| {
        warn!(target = domain, error = %e, "DNS lookup failed.");
        ResolveError::Lookup {
            domain: domain.to_string(),
            source: e,
        }
    })?;

    let ip = lookup
        .iter()
        .next()
        .ok_or_else(|| ResolveError::NoAddress(domain.to_string()))?;
    info!(target = domain, %ip, "Domain resolved.");
    Ok(ip)
}
