//! Network fetching
//!
//! Provides a trait for the network side of request interception so the
//! cache manager can be driven by a real HTTP client or a test double.

use crate::cache::{Request, Response};
use crate::error::{ShellError, ShellResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Abstract network interface
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request against the network.
    ///
    /// Any HTTP status is a successful fetch; only transport failures are
    /// errors.
    async fn fetch(&self, request: &Request) -> ShellResult<Response>;
}

/// Largest response body read by default (64 MiB)
pub const DEFAULT_BODY_LIMIT: u64 = 64 * 1024 * 1024;

/// HTTP fetcher backed by `ureq`
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    body_limit: u64,
}

impl HttpFetcher {
    /// Create a fetcher with an overall per-request timeout
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Cap the number of body bytes read per response
    pub fn with_body_limit(mut self, bytes: u64) -> Self {
        self.body_limit = bytes;
        self
    }

    fn fetch_blocking(agent: &ureq::Agent, body_limit: u64, request: &Request) -> ShellResult<Response> {
        let url = request.key.as_str();
        let method = request.method.to_ascii_uppercase();
        let headers = request.headers.as_slice();

        let result = match method.as_str() {
            "GET" => with_headers(agent.get(url), headers).call(),
            "HEAD" => with_headers(agent.head(url), headers).call(),
            "DELETE" => with_headers(agent.delete(url), headers).call(),
            "POST" => with_headers(agent.post(url), headers).send(&request.body[..]),
            "PUT" => with_headers(agent.put(url), headers).send(&request.body[..]),
            "PATCH" => with_headers(agent.patch(url), headers).send(&request.body[..]),
            other => {
                return Err(ShellError::fetch(
                    url,
                    format!("unsupported method {}", other),
                ))
            }
        };

        let mut response = result.map_err(|e| ShellError::fetch(url, e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = if method == "HEAD" {
            Vec::new()
        } else {
            response
                .body_mut()
                .with_config()
                .limit(body_limit)
                .read_to_vec()
                .map_err(|e| ShellError::fetch(url, format!("reading body: {}", e)))?
        };

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> ShellResult<Response> {
        debug!("Network fetch: {} {}", request.method, request.key);

        let agent = self.agent.clone();
        let body_limit = self.body_limit;
        let request = request.clone();
        tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, body_limit, &request))
            .await
            .map_err(|e| ShellError::Internal(format!("Fetch task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{parse_origin, ResourceKey};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve exactly one HTTP response on an ephemeral port and hand back
    /// the raw request it answered
    async fn serve_once(
        status_line: &'static str,
        body: impl Into<Vec<u8>>,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.into();
        let (seen_tx, seen_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                if n == 0 {
                    break;
                }
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                    let length = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let _ = seen_tx.send(String::from_utf8_lossy(&buf).into_owned());

            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.ok();
        });

        (format!("http://{}", addr), seen_rx)
    }

    fn request(origin: &str, path: &str) -> Request {
        Request::get(ResourceKey::resolve(&parse_origin(origin).unwrap(), path).unwrap())
    }

    #[tokio::test]
    async fn fetches_body_and_headers() {
        let (origin, _) = serve_once("200 OK", "hello").await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5));

        let response = fetcher.fetch(&request(&origin, "/")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"hello");
        assert_eq!(response.header("content-type"), Some("text/plain"));
    }

    #[tokio::test]
    async fn error_status_is_not_a_transport_error() {
        let (origin, _) = serve_once("404 Not Found", "missing").await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5));

        let response = fetcher.fetch(&request(&origin, "/nope")).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn refused_connection_is_a_fetch_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let origin = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let fetcher = HttpFetcher::new(Duration::from_secs(5));
        let err = fetcher.fetch(&request(&origin, "/")).await.unwrap_err();
        assert!(matches!(err, ShellError::NetworkFetch { .. }));
    }

    #[tokio::test]
    async fn request_body_and_headers_reach_the_origin() {
        let (origin, seen) = serve_once("201 Created", "ok").await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5));

        let key = ResourceKey::resolve(&parse_origin(&origin).unwrap(), "/api/posts").unwrap();
        let post = Request::new("POST", key)
            .with_header("Content-Type", "application/json")
            .with_header("X-Client", "hubshell")
            .with_body(r#"{"text":"hello"}"#);
        let response = fetcher.fetch(&post).await.unwrap();
        assert_eq!(response.status, 201);

        let raw = seen.await.unwrap();
        assert!(raw.starts_with("POST /api/posts HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("x-client: hubshell"));
        assert!(raw.ends_with(r#"{"text":"hello"}"#));
    }

    #[tokio::test]
    async fn bodies_beyond_ten_megabytes_are_read() {
        let large = vec![b'x'; 12 * 1024 * 1024];
        let (origin, _) = serve_once("200 OK", large.clone()).await;
        let fetcher = HttpFetcher::new(Duration::from_secs(30));

        let response = fetcher.fetch(&request(&origin, "/video.bin")).await.unwrap();
        assert_eq!(response.body.len(), large.len());
    }

    #[tokio::test]
    async fn body_over_limit_is_a_fetch_error() {
        let (origin, _) = serve_once("200 OK", "hello world").await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).with_body_limit(4);

        let err = fetcher.fetch(&request(&origin, "/")).await.unwrap_err();
        assert!(matches!(err, ShellError::NetworkFetch { .. }));
    }
}
