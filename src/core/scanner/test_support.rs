// src/core/scanner/test_support.rs

//! Loopback servers used by the prober tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use super::http::client_builder;

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub reason: &'static str,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockResponse {
    pub fn new(status: u16, reason: &'static str) -> Self {
        Self { status, reason, headers: Vec::new(), body: String::new() }
    }

    pub fn ok(body: &str) -> Self {
        Self::new(200, "OK").body(body)
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// The production client, except that it talks to the loopback servers
/// directly whatever proxy the environment configures.
pub fn test_client(timeout: Duration) -> reqwest::Client {
    client_builder("WebRadar-test", timeout).no_proxy().build().unwrap()
}

/// Starts a minimal HTTP/1.1 responder on 127.0.0.1.
///
/// Requests are routed by exact path; unknown paths get a 404. Each response
/// is held back by `delay` so concurrent requests overlap.
pub async fn spawn_http_server(routes: HashMap<String, MockResponse>, delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else { return };
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&buf);
                let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
                let method = request_line.next().unwrap_or_default().to_string();
                let path = request_line.next().unwrap_or_default().to_string();

                tokio::time::sleep(delay).await;

                let response = routes
                    .get(&path)
                    .cloned()
                    .unwrap_or_else(|| MockResponse::new(404, "Not Found"));
                let mut out = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                    response.status,
                    response.reason,
                    response.body.len()
                );
                for (name, value) in &response.headers {
                    out.push_str(&format!("{name}: {value}\r\n"));
                }
                out.push_str("\r\n");
                if method != "HEAD" {
                    out.push_str(&response.body);
                }
                let _ = stream.write_all(out.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}

/// Starts a line-oriented WHOIS-style responder on 127.0.0.1.
///
/// The n-th connection reads one request line and receives `responses[n]`,
/// after which the server closes the connection. Request lines are captured
/// verbatim, terminator included.
pub async fn spawn_whois_server(responses: Vec<String>) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let queries = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&queries);

    tokio::spawn(async move {
        for response in responses {
            let Ok((stream, _)) = listener.accept().await else { return };
            let (reader, mut writer) = stream.into_split();
            let mut line = String::new();
            let _ = BufReader::new(reader).read_line(&mut line).await;
            captured.lock().await.push(line);
            let _ = writer.write_all(response.as_bytes()).await;
            let _ = writer.shutdown().await;
        }
    });

    (addr, queries)
}
