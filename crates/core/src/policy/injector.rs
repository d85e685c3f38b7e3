//! Sends generated policy to the guard rule service.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::PolicyConfig;
use crate::transport::{BasicCredentials, HttpRequest, HttpTransport};

use super::{Macro, PolicyError, PolicyStep, Rule};

const RULES_PATH: &str = "/rules";
const MACROS_PATH: &str = "/macros";

/// Issues authenticated requests against the guard rule service.
pub struct PolicyInjector {
    base_url: String,
    credentials: BasicCredentials,
    transport: Arc<dyn HttpTransport>,
}

impl PolicyInjector {
    pub fn new(
        base_url: impl Into<String>,
        credentials: BasicCredentials,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            transport,
        }
    }

    pub fn from_config(config: &PolicyConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self::new(
            config.base_url.clone(),
            BasicCredentials::new(config.username.clone(), config.password.clone()),
            transport,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn send(&self, step: &str, request: HttpRequest) -> Result<String, PolicyError> {
        debug!(step, "Sending policy request");
        let response = self
            .transport
            .send(request.with_credentials(self.credentials.clone()))
            .await
            .map_err(|source| PolicyError::Transport {
                step: step.to_string(),
                source,
            })?;
        Ok(response.body)
    }

    async fn delete_all(&self, path: &str) -> Result<(), PolicyError> {
        self.send(&format!("DELETE {}", path), HttpRequest::delete(self.url(path)))
            .await?;
        Ok(())
    }

    async fn post_json(&self, path: &str, body: String) -> Result<(), PolicyError> {
        self.send(
            &format!("POST {}", path),
            HttpRequest::post(self.url(path)).with_json_body(body),
        )
        .await?;
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Vec<Value>, PolicyError> {
        let body = self
            .send(&format!("GET {}", path), HttpRequest::get(self.url(path)))
            .await?;
        serde_json::from_str(&body).map_err(|e| PolicyError::InvalidResponse {
            resource: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Delete every rule.
    pub async fn reset_rules(&self) -> Result<(), PolicyError> {
        self.delete_all(RULES_PATH).await
    }

    /// Delete every macro.
    pub async fn reset_macros(&self) -> Result<(), PolicyError> {
        self.delete_all(MACROS_PATH).await
    }

    /// Delete every rule, then every macro.
    pub async fn reset(&self) -> Result<(), PolicyError> {
        self.reset_rules().await?;
        self.reset_macros().await
    }

    pub async fn submit_rule(&self, rule: &Rule) -> Result<(), PolicyError> {
        self.post_json(RULES_PATH, serde_json::to_string(rule)?).await
    }

    pub async fn submit_macro(&self, m: &Macro) -> Result<(), PolicyError> {
        self.post_json(MACROS_PATH, serde_json::to_string(m)?).await
    }

    /// Current rules as returned by the service.
    pub async fn list_rules(&self) -> Result<Vec<Value>, PolicyError> {
        self.list(RULES_PATH).await
    }

    /// Current macros as returned by the service.
    pub async fn list_macros(&self) -> Result<Vec<Value>, PolicyError> {
        self.list(MACROS_PATH).await
    }

    pub async fn execute(&self, step: &PolicyStep) -> Result<(), PolicyError> {
        match step {
            PolicyStep::ResetRules => self.reset_rules().await,
            PolicyStep::ResetMacros => self.reset_macros().await,
            PolicyStep::SubmitRule(rule) => self.submit_rule(rule).await,
            PolicyStep::SubmitMacro(m) => self.submit_macro(m).await,
        }
    }

    /// Run steps strictly in order, stopping at the first failure.
    ///
    /// Returns the number of steps completed.
    pub async fn run(&self, steps: &[PolicyStep]) -> Result<usize, PolicyError> {
        info!(
            steps = steps.len(),
            transport = self.transport.name(),
            "Injecting policy"
        );

        for (i, step) in steps.iter().enumerate() {
            info!("[{}/{}] {}", i + 1, steps.len(), step);
            self.execute(step).await?;
        }

        Ok(steps.len())
    }
}
