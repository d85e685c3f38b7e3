//! In-memory stand-in for the guard rule service.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transport::{
    BasicCredentials, HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resource {
    Rules,
    Macros,
}

/// Transport that behaves like the policy service's `/rules` and `/macros`
/// resources.
///
/// - `DELETE` clears the collection
/// - `POST` appends the JSON body
/// - `GET` returns the collection as a JSON array, in insertion order
///
/// Requests without basic auth, or with credentials other than the expected
/// ones, are rejected with 401.
#[derive(Debug)]
pub struct MockPolicyServer {
    credentials: BasicCredentials,
    rules: Arc<RwLock<Vec<Value>>>,
    macros: Arc<RwLock<Vec<Value>>>,
    log: Arc<RwLock<Vec<(HttpMethod, String)>>>,
}

impl MockPolicyServer {
    /// Create an empty server accepting the given credentials.
    pub fn new(credentials: BasicCredentials) -> Self {
        Self {
            credentials,
            rules: Arc::new(RwLock::new(Vec::new())),
            macros: Arc::new(RwLock::new(Vec::new())),
            log: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Seed existing rules, as if left over from a previous run.
    pub async fn seed_rules(&self, rules: Vec<Value>) {
        self.rules.write().await.extend(rules);
    }

    /// Seed existing macros.
    pub async fn seed_macros(&self, macros: Vec<Value>) {
        self.macros.write().await.extend(macros);
    }

    /// Current rules, in submission order.
    pub async fn rules(&self) -> Vec<Value> {
        self.rules.read().await.clone()
    }

    /// Current macros, in submission order.
    pub async fn macros(&self) -> Vec<Value> {
        self.macros.read().await.clone()
    }

    /// Method and resource path of every request received.
    pub async fn request_log(&self) -> Vec<(HttpMethod, String)> {
        self.log.read().await.clone()
    }

    fn resource(url: &str) -> Option<Resource> {
        let path = url.split('?').next().unwrap_or(url).trim_end_matches('/');
        if path.ends_with("/rules") {
            Some(Resource::Rules)
        } else if path.ends_with("/macros") {
            Some(Resource::Macros)
        } else {
            None
        }
    }

    fn collection(&self, resource: Resource) -> &Arc<RwLock<Vec<Value>>> {
        match resource {
            Resource::Rules => &self.rules,
            Resource::Macros => &self.macros,
        }
    }
}

fn status(status: u16, body: &str) -> TransportError {
    TransportError::HttpStatus {
        status,
        body: body.to_string(),
    }
}

#[async_trait]
impl HttpTransport for MockPolicyServer {
    fn name(&self) -> &str {
        "mock-policy-server"
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let resource = Self::resource(&request.url).ok_or_else(|| status(404, "Not Found"))?;
        let path = match resource {
            Resource::Rules => "/rules",
            Resource::Macros => "/macros",
        };
        self.log
            .write()
            .await
            .push((request.method, path.to_string()));

        if request.credentials.as_ref() != Some(&self.credentials) {
            return Err(status(401, "Unauthorized"));
        }

        let collection = self.collection(resource);
        match request.method {
            HttpMethod::Delete => {
                collection.write().await.clear();
                Ok(HttpResponse::ok(r#"{"message":"Successfully deleted."}"#))
            }
            HttpMethod::Post => {
                let body = request.body.ok_or_else(|| status(400, "Missing body"))?;
                let value: Value =
                    serde_json::from_str(&body).map_err(|e| status(400, &e.to_string()))?;
                collection.write().await.push(value);
                Ok(HttpResponse::ok(r#"{"message":"Successfully added."}"#))
            }
            HttpMethod::Get => {
                let items = collection.read().await;
                let body = serde_json::to_string(&*items).map_err(|e| status(500, &e.to_string()))?;
                Ok(HttpResponse::ok(body))
            }
        }
    }
}
