// src/core/scanner/path_scanner.rs

use tracing::{debug, info, warn};

use crate::core::error::PathProbeError;
use crate::core::models::HiddenPath;
use reqwest::StatusCode;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

/// Counting admission gate for path probes.
///
/// Admission waits until one of `limit` slots is free. The gate also tracks
/// how many admitted probes are in flight and the highest count seen.
#[derive(Debug)]
pub struct AdmissionGate {
    slots: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// A held slot. The slot is released when the ticket is dropped.
pub struct Admission {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for Admission {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AdmissionGate {
    pub fn new(limit: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(limit.max(1))),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn admit(&self) -> Admission {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .unwrap_or_else(|_| unreachable!("the admission semaphore is never closed"));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Admission { _permit: permit, in_flight: Arc::clone(&self.in_flight) }
    }

    /// Highest number of simultaneously admitted probes so far.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Turns wordlist text into path segments: blank lines and `#` comments are
/// skipped, surrounding whitespace and slashes are stripped.
pub fn parse_wordlist(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.trim_matches('/').to_string())
        .collect()
}

/// Reads the wordlist at `wordlist` and probes each entry under `base_url`.
///
/// Only an unreadable file is an error. Undecodable bytes are replaced.
pub async fn probe_paths(
    client: &reqwest::Client,
    base_url: &str,
    wordlist: &Path,
    concurrency: usize,
) -> Result<Vec<HiddenPath>, PathProbeError> {
    let bytes = tokio::fs::read(wordlist).await.map_err(|source| {
        warn!(wordlist = %wordlist.display(), error = %source, "Wordlist unavailable, skipping path scan.");
        PathProbeError::WordlistUnavailable { path: wordlist.to_path_buf(), source }
    })?;
    // Invalid UTF-8 is replaced per character; the line still counts.
    let candidates = parse_wordlist(&String::from_utf8_lossy(&bytes));
    let gate = AdmissionGate::new(concurrency);
    Ok(probe_candidates(client, base_url, &candidates, &gate).await)
}

/// Sends a HEAD request per candidate through `gate`.
///
/// A candidate is reported when it answers 200 or 403; other statuses and
/// transport errors are dropped. Results keep wordlist order.
pub async fn probe_candidates(
    client: &reqwest::Client,
    base_url: &str,
    candidates: &[String],
    gate: &AdmissionGate,
) -> Vec<HiddenPath> {
    let base = base_url.trim_end_matches('/');
    info!(base, candidates = candidates.len(), "Starting path scan.");

    let found = Arc::new(Mutex::new(Vec::new()));
    let mut workers = JoinSet::new();

    for (index, segment) in candidates.iter().enumerate() {
        // Blocks here until a slot frees up.
        let admission = gate.admit().await;
        let client = client.clone();
        let found = Arc::clone(&found);
        let url = format!("{base}/{segment}");

        reap_finished(&mut workers);
        workers.spawn(async move {
            let _admission = admission;
            match client.head(&url).send().await {
                Ok(response) if is_interesting(response.status()) => {
                    let status = response.status();
                    debug!(url = %url, %status, "Path found.");
                    found.lock().await.push((
                        index,
                        HiddenPath {
                            url,
                            status: status.as_u16(),
                            reason: status.canonical_reason().map(str::to_string),
                        },
                    ));
                }
                Ok(response) => debug!(url = %url, status = %response.status(), "Path not found."),
                Err(e) => debug!(url = %url, error = %e, "Path probe failed."),
            }
        });
    }

    // Join point: every dispatched probe has finished before results are read.
    while let Some(outcome) = workers.join_next().await {
        if let Err(e) = outcome {
            warn!(error = %e, "Path probe task failed.");
        }
    }

    let mut found = std::mem::take(&mut *found.lock().await);
    found.sort_by_key(|(index, _)| *index);
    info!(found = found.len(), peak_in_flight = gate.peak(), "Path scan finished.");
    found.into_iter().map(|(_, path)| path).collect()
}

/// Drops the handles of probes that already finished.
fn reap_finished(workers: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(outcome) = workers.try_join_next() {
        if let Err(e) = outcome {
            warn!(error = %e, "Path probe task failed.");
        }
        reaped += 1;
    }
    reaped
}

fn is_interesting(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::FORBIDDEN
}
