//! Mock HTTP server for backend-level testing.
//!
//! [`MockHttpServer`] provides a lightweight HTTP/1.1 responder on a
//! localhost `TcpListener`, pre-loaded with scripted responses. It lets the
//! SDRangel client be tested end to end (request paths, PATCH bodies, status
//! classification, timeouts) without a running server.
//!
//! # Example
//!
//! ```
//! use sdrsync_test_harness::MockHttpServer;
//!
//! # async fn example() -> sdrsync_core::Result<()> {
//! let mut server = MockHttpServer::new().await?;
//!
//! // When the client GETs this path, answer 200 with this body.
//! server.expect(
//!     "GET",
//!     "/sdrangel/deviceset/0/device/settings",
//!     200,
//!     r#"{"deviceHwType": "LimeSDR", "limeSdrInputSettings": {"centerFrequency": 145500000}}"#,
//! );
//! server.start();
//!
//! let base_url = server.base_url();
//! // ... point a client at base_url and run it ...
//! let requests = server.wait().await.expect("all expectations met");
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use sdrsync_core::error::{Error, Result};

/// Upper bound on the size of a request head.
const MAX_HEAD_LEN: usize = 16 * 1024;

/// What the server does once a request has been matched.
#[derive(Debug, Clone)]
enum Reply {
    /// Answer with a status code and JSON body.
    Respond { status: u16, body: String },
    /// Never answer; hold the connection until the client gives up.
    Stall,
}

/// A pre-loaded request/response pair for the mock server.
#[derive(Debug, Clone)]
struct HttpExpectation {
    method: String,
    path: String,
    reply: Reply,
}

/// A request the mock server received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// The request body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// A mock HTTP server for testing the SDRangel client.
///
/// The server listens on a random available port on localhost. Once
/// [`start`](MockHttpServer::start) is called, it serves one connection per
/// expectation, in order, and answers every response with
/// `Connection: close`.
///
/// A request whose method or path does not match the next expectation is
/// answered with 500 and reported as an error by
/// [`wait`](MockHttpServer::wait).
pub struct MockHttpServer {
    /// The address the server is listening on (e.g. "127.0.0.1:54321").
    addr: String,
    /// Listener, moved into the server task on start.
    listener: Option<TcpListener>,
    /// Ordered queue of expected requests.
    expectations: VecDeque<HttpExpectation>,
    /// Handle to the server task once started.
    server_handle: Option<JoinHandle<std::result::Result<Vec<RecordedRequest>, String>>>,
}

impl MockHttpServer {
    /// Create a new mock server listening on a random port.
    ///
    /// Connections queue in the listener backlog until
    /// [`start`](MockHttpServer::start) is called.
    pub async fn new() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| Error::Transport(format!("failed to bind mock HTTP server: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| Error::Transport(format!("failed to read local address: {e}")))?
            .to_string();

        Ok(Self {
            addr,
            listener: Some(listener),
            expectations: VecDeque::new(),
            server_handle: None,
        })
    }

    /// Expect `method path` and answer it with `status` and `body`.
    pub fn expect(&mut self, method: &str, path: &str, status: u16, body: &str) {
        self.expectations.push_back(HttpExpectation {
            method: method.to_string(),
            path: path.to_string(),
            reply: Reply::Respond {
                status,
                body: body.to_string(),
            },
        });
    }

    /// Expect `method path` and never answer it.
    ///
    /// The connection is held open until the client closes it, which is how
    /// client-side timeouts are exercised.
    pub fn expect_stall(&mut self, method: &str, path: &str) {
        self.expectations.push_back(HttpExpectation {
            method: method.to_string(),
            path: path.to_string(),
            reply: Reply::Stall,
        });
    }

    /// The `http://host:port` URL clients should use.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Start serving the loaded expectations in a background task.
    ///
    /// Call [`wait`](MockHttpServer::wait) once the client is done to check
    /// that every expectation was met.
    pub fn start(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let expectations: Vec<HttpExpectation> = self.expectations.drain(..).collect();

        let handle = tokio::spawn(async move {
            let mut recorded = Vec::with_capacity(expectations.len());

            for (i, expectation) in expectations.iter().enumerate() {
                let (mut stream, _) = listener
                    .accept()
                    .await
                    .map_err(|e| format!("expectation {i}: failed to accept connection: {e}"))?;

                let request = read_request(&mut stream)
                    .await
                    .map_err(|e| format!("expectation {i}: {e}"))?;
                tracing::trace!(method = %request.method, path = %request.path, "mock HTTP request");

                if request.method != expectation.method || request.path != expectation.path {
                    let _ = write_response(&mut stream, 500, r#"{"message": "unexpected request"}"#)
                        .await;
                    return Err(format!(
                        "expectation {i}: request mismatch: expected {} {}, got {} {}",
                        expectation.method, expectation.path, request.method, request.path
                    ));
                }
                recorded.push(request);

                match &expectation.reply {
                    Reply::Respond { status, body } => {
                        write_response(&mut stream, *status, body)
                            .await
                            .map_err(|e| format!("expectation {i}: write error: {e}"))?;
                    }
                    Reply::Stall => {
                        let mut buf = [0u8; 64];
                        while let Ok(n) = stream.read(&mut buf).await {
                            if n == 0 {
                                break;
                            }
                        }
                    }
                }
            }

            Ok(recorded)
        });

        self.server_handle = Some(handle);
    }

    /// Wait for the server task to finish and return the requests it saw.
    pub async fn wait(self) -> std::result::Result<Vec<RecordedRequest>, String> {
        match self.server_handle {
            Some(handle) => handle
                .await
                .map_err(|e| format!("server task panicked: {e}"))?,
            None => Ok(Vec::new()),
        }
    }
}

/// Read one HTTP/1.1 request (head plus `Content-Length` body).
async fn read_request(stream: &mut TcpStream) -> std::result::Result<RecordedRequest, String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        if let Some(pos) = find_head_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_HEAD_LEN {
            return Err("request head too large".to_string());
        }
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| format!("read error: {e}"))?;
        if n == 0 {
            return Err(format!("client disconnected after {} bytes", buf.len()));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| format!("read error: {e}"))?;
        if n == 0 {
            return Err(format!(
                "client disconnected after {} of {content_length} body bytes",
                body.len()
            ));
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok(RecordedRequest { method, path, body })
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

async fn write_response(stream: &mut TcpStream, status: u16, body: &str) -> std::io::Result<()> {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;
    stream.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn raw_request(base: &str, request: &str) -> String {
        let addr = base.trim_start_matches("http://");
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn serves_scripted_response_and_records_body() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect("PATCH", "/a", 200, r#"{"ok": true}"#);
        server.start();

        let body = r#"{"x": 1}"#;
        let reply = raw_request(
            &server.base_url(),
            &format!(
                "PATCH /a HTTP/1.1\r\nHost: test\r\ncontent-length: {}\r\n\r\n{body}",
                body.len()
            ),
        )
        .await;
        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(reply.ends_with(r#"{"ok": true}"#));

        let requests = server.wait().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].json().unwrap()["x"], 1);
    }

    #[tokio::test]
    async fn mismatch_is_reported() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect("GET", "/expected", 200, "{}");
        server.start();

        let reply = raw_request(&server.base_url(), "GET /other HTTP/1.1\r\nHost: t\r\n\r\n").await;
        assert!(reply.starts_with("HTTP/1.1 500"));

        let err = server.wait().await.unwrap_err();
        assert!(err.contains("request mismatch"));
    }

    #[tokio::test]
    async fn wait_without_start_is_empty() {
        let server = MockHttpServer::new().await.unwrap();
        assert_eq!(server.wait().await.unwrap(), Vec::new());
    }
}
