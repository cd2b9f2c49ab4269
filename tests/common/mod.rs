//! Shared integration-test harness: a minimal local HTTP server with a
//! canned response, plus helpers for building probe configurations that
//! keep runs to a single pass.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use redprobe::config::ProbeConfig;

/// A local HTTP server answering every request with one canned response.
pub struct FixtureServer {
    addr: std::net::SocketAddr,
    hits: Arc<AtomicU64>,
}

impl FixtureServer {
    /// Starts a fixture answering with the given status and body.
    pub async fn start(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind fixture listener");
        let addr = listener.local_addr().expect("fixture has no local addr");
        let hits = Arc::new(AtomicU64::new(0));

        let body = body.to_string();
        let hit_counter = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                hit_counter.fetch_add(1, Ordering::SeqCst);
                let body = body.clone();
                tokio::spawn(async move {
                    serve_one(stream, status, &body).await;
                });
            }
        });

        Self { addr, hits }
    }

    /// Base URL of the fixture.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// The port the fixture listens on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Number of connections accepted so far.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Reads one HTTP request and writes the canned response.
async fn serve_one(mut stream: tokio::net::TcpStream, status: u16, body: &str) {
    // Read until the end of the request headers, then drain any declared
    // body so the client sees a clean exchange.
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let Ok(n) = stream.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_header_end(&buf) {
            break pos;
        }
        if buf.len() > 64 * 1024 {
            return;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body_read = buf.len() - (header_end + 4);
    while body_read < content_length {
        let Ok(n) = stream.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            break;
        }
        body_read += n;
    }

    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        403 => "Forbidden",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Unknown",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len(),
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// A probe configuration whose inter-pass delays exceed any test
/// duration, so every strategy executes exactly one pass.
pub fn single_pass_config() -> ProbeConfig {
    ProbeConfig {
        flood_tick_ms: 60_000,
        attempt_delay_ms: 60_000,
        credential_delay_ms: 60_000,
        port_delay_ms: 1,
        ..ProbeConfig::default()
    }
}

/// Reserves a local port that nothing is listening on.
///
/// The listener is bound and dropped; a connect attempt to the port
/// afterwards is refused.
pub async fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to reserve port");
    let port = listener.local_addr().expect("no local addr").port();
    drop(listener);
    port
}
