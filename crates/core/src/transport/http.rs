//! reqwest-backed transport implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::HttpConfig;

use super::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Transport that performs real HTTP requests.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a new transport with the given configuration.
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if config.accept_invalid_certs {
            warn!("TLS certificate validation is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Stream the response body into `path`, returning the byte count.
    ///
    /// The body is written next to `path` with a `.part` suffix and renamed
    /// once complete, so `path` only ever holds a whole response.
    async fn write_body(response: Response, path: &Path) -> Result<u64, TransportError> {
        let part = part_path(path);

        match Self::stream_to_file(response, &part).await {
            Ok(written) => {
                tokio::fs::rename(&part, path)
                    .await
                    .map_err(|e| output_error(path, &e))?;
                Ok(written)
            }
            Err(e) => {
                match tokio::fs::remove_file(&part).await {
                    Err(remove) if remove.kind() != std::io::ErrorKind::NotFound => {
                        warn!(path = %part.display(), error = %remove, "Failed to remove partial download");
                    }
                    _ => {}
                }
                Err(e)
            }
        }
    }

    async fn stream_to_file(mut response: Response, path: &Path) -> Result<u64, TransportError> {
        let mut file = File::create(path).await.map_err(|e| output_error(path, &e))?;
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await.map_err(map_reqwest_error)? {
            file.write_all(&chunk)
                .await
                .map_err(|e| output_error(path, &e))?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| output_error(path, &e))?;
        Ok(written)
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn output_error(path: &Path, e: &dyn std::fmt::Display) -> TransportError {
    TransportError::Output {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::ConnectionFailed(e.to_string())
    } else if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self
            .client
            .request(Self::method(request.method), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(creds) = &request.credentials {
            builder = builder.basic_auth(&creds.username, Some(&creds.password));
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        match request.output {
            Some(path) => {
                let bytes = Self::write_body(response, &path).await?;
                debug!(path = %path.display(), bytes, "Response written");
                Ok(HttpResponse {
                    status: status.as_u16(),
                    body: String::new(),
                    bytes,
                })
            }
            None => {
                let body = response.text().await.map_err(map_reqwest_error)?;
                Ok(HttpResponse {
                    status: status.as_u16(),
                    bytes: body.len() as u64,
                    body,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::BasicCredentials;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accept one connection, reply with `response` verbatim, and hand back
    /// the raw request head.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&received).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    fn raw_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(&HttpConfig {
            accept_invalid_certs: false,
            timeout_secs: Some(5),
        })
        .unwrap()
    }

    #[test]
    fn test_new_with_defaults() {
        let transport = ReqwestTransport::new(&HttpConfig::default()).unwrap();
        assert_eq!(transport.name(), "reqwest");
    }

    #[test]
    fn test_new_insecure_with_timeout() {
        let config = HttpConfig {
            accept_invalid_certs: true,
            timeout_secs: Some(5),
        };
        assert!(ReqwestTransport::new(&config).is_ok());
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(ReqwestTransport::method(HttpMethod::Get), Method::GET);
        assert_eq!(ReqwestTransport::method(HttpMethod::Post), Method::POST);
        assert_eq!(ReqwestTransport::method(HttpMethod::Delete), Method::DELETE);
    }

    #[tokio::test]
    async fn test_connection_refused_is_reported() {
        let transport = ReqwestTransport::new(&HttpConfig {
            accept_invalid_certs: false,
            timeout_secs: Some(2),
        })
        .unwrap();

        // Port 9 (discard) is essentially never listening locally.
        let result = transport.send(HttpRequest::get("http://127.0.0.1:9/")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (url, server) = serve_once(raw_response("500 Internal Server Error", "boom")).await;

        let err = transport()
            .send(HttpRequest::get(format!("{}/rules", url)))
            .await
            .unwrap_err();
        server.await.unwrap();

        match err {
            TransportError::HttpStatus { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_basic_auth_header_sent() {
        let (url, server) = serve_once(raw_response("200 OK", "[]")).await;

        let response = transport()
            .send(
                HttpRequest::get(format!("{}/rules", url))
                    .with_credentials(BasicCredentials::new("u", "p")),
            )
            .await
            .unwrap();
        let head = server.await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "[]");
        assert!(head.starts_with("GET /rules HTTP/1.1"));
        // base64("u:p")
        assert!(head.to_lowercase().contains("authorization: basic dtpw"));
    }

    #[tokio::test]
    async fn test_body_written_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed_channel.csv");
        let (url, server) = serve_once(raw_response("200 OK", "a,b\n1")).await;

        let response = transport()
            .send(HttpRequest::get(url).with_output(path.clone()))
            .await
            .unwrap();
        server.await.unwrap();

        assert_eq!(response.bytes, 5);
        assert!(response.body.is_empty());
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n1");
        assert!(!part_path(&path).exists());
    }

    #[tokio::test]
    async fn test_truncated_body_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed_channel.csv");
        // Promises more bytes than it sends, then closes.
        let response = "HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial";
        let (url, server) = serve_once(response.to_string()).await;

        let result = transport()
            .send(HttpRequest::get(url).with_output(path.clone()))
            .await;
        server.await.unwrap();

        assert!(result.is_err());
        assert!(!path.exists());
        assert!(!part_path(&path).exists());
    }

    #[test]
    fn test_part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("out/a_b_2013-01-01T00-00.csv")),
            PathBuf::from("out/a_b_2013-01-01T00-00.csv.part")
        );
    }
}
