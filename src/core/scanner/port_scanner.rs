// src/core/scanner/port_scanner.rs

use tracing::{debug, info, warn};

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Tests TCP reachability of every port in `ports` against `host`.
///
/// One connect attempt per port, all running concurrently. A port is open when
/// the handshake completes within `timeout`; the stream is dropped straight
/// away. Refused, unreachable and timed-out ports are simply left out.
pub async fn probe_ports(host: &str, ports: &[u16], timeout: Duration) -> BTreeSet<u16> {
    info!(target = host, candidates = ports.len(), "Starting port scan.");

    let open = Arc::new(Mutex::new(BTreeSet::new()));
    let mut workers = JoinSet::new();

    for &port in ports {
        let host = host.to_string();
        let open = Arc::clone(&open);
        workers.spawn(async move {
            if probe_port(&host, port, timeout).await {
                open.lock().await.insert(port);
            }
        });
    }

    // Join point: every attempt has finished before the set is read.
    while let Some(outcome) = workers.join_next().await {
        if let Err(e) = outcome {
            warn!(error = %e, "Port probe task failed.");
        }
    }

    let open = std::mem::take(&mut *open.lock().await);
    info!(target = host, open = open.len(), "Port scan finished.");
    open
}

async fn probe_port(host: &str, port: u16, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => {
            debug!(target = host, port, "Port open.");
            true
        }
        Ok(Err(e)) => {
            debug!(target = host, port, error = %e, "Port closed.");
            false
        }
        Err(_) => {
            debug!(target = host, port, "Port timed out.");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn finds_listening_ports_only() {
        let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let second = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open_a = first.local_addr().unwrap().port();
        let open_b = second.local_addr().unwrap().port();
        let closed = closed_port().await;

        let found = probe_ports("127.0.0.1", &[open_a, closed, open_b], Duration::from_secs(1)).await;

        assert_eq!(found, BTreeSet::from([open_a, open_b]));
    }

    #[tokio::test]
    async fn repeated_scans_agree() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap().port();
        let closed = closed_port().await;
        let ports = [open, closed];

        let first = probe_ports("127.0.0.1", &ports, Duration::from_secs(1)).await;
        let second = probe_ports("127.0.0.1", &ports, Duration::from_secs(1)).await;

        assert_eq!(first, second);
        assert_eq!(first, BTreeSet::from([open]));
    }

    #[tokio::test]
    async fn duplicate_candidates_collapse() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap().port();

        let found = probe_ports("127.0.0.1", &[open, open, open], Duration::from_secs(1)).await;

        assert_eq!(found.len(), 1);
    }
}
