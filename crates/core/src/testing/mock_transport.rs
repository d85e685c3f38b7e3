//! Mock transport for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// A recorded request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// The request that was sent.
    pub request: HttpRequest,
    /// When the request was sent.
    pub timestamp: chrono::DateTime<Utc>,
}

/// Predicate deciding whether a request should fail.
type FailurePredicate = Box<dyn Fn(&HttpRequest) -> bool + Send + Sync>;

/// Mock implementation of the HttpTransport trait.
///
/// Provides controllable behavior for testing:
/// - Record every request in send order
/// - Fail the next request, or every request matching a predicate
/// - Return a configurable response body
///
/// # Example
///
/// ```rust,ignore
/// let transport = MockTransport::new();
/// transport.fail_when(|r| r.url.contains("Current3")).await;
///
/// let result = transport.send(HttpRequest::get("http://host/?datastream=Current3")).await;
/// assert!(result.is_err());
/// assert_eq!(transport.request_count().await, 1);
/// ```
pub struct MockTransport {
    /// Recorded requests, including failed ones.
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
    /// If set, the next request will fail with this error.
    next_error: Arc<RwLock<Option<TransportError>>>,
    /// Requests matching this predicate fail with HTTP 500.
    failure_predicate: Arc<RwLock<Option<FailurePredicate>>>,
    /// Body returned on success.
    response_body: Arc<RwLock<String>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("requests", &"<requests>")
            .field("next_error", &"<next_error>")
            .field("failure_predicate", &"<predicate>")
            .finish()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a new mock transport that accepts everything.
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            failure_predicate: Arc::new(RwLock::new(None)),
            response_body: Arc::new(RwLock::new(String::new())),
        }
    }

    /// Make the next request fail with the given error.
    pub async fn fail_next(&self, error: TransportError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every request matching `predicate` fail with HTTP 500.
    pub async fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&HttpRequest) -> bool + Send + Sync + 'static,
    {
        *self.failure_predicate.write().await = Some(Box::new(predicate));
    }

    /// Set the body returned by successful requests.
    pub async fn set_response_body(&self, body: impl Into<String>) {
        *self.response_body.write().await = body.into();
    }

    /// Get recorded requests.
    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    /// Get just the recorded URLs, in send order.
    pub async fn recorded_urls(&self) -> Vec<String> {
        self.requests
            .read()
            .await
            .iter()
            .map(|r| r.request.url.clone())
            .collect()
    }

    /// Get the number of requests sent.
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Clear recorded requests.
    pub async fn clear_recorded(&self) {
        self.requests.write().await.clear();
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.write().await.push(RecordedRequest {
            request: request.clone(),
            timestamp: Utc::now(),
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if let Some(predicate) = self.failure_predicate.read().await.as_ref() {
            if predicate(&request) {
                return Err(TransportError::HttpStatus {
                    status: 500,
                    body: "mock failure".to_string(),
                });
            }
        }

        Ok(HttpResponse::ok(self.response_body.read().await.clone()))
    }
}
