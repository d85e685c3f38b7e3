//! Types for the policy pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::transport::TransportError;

/// Action taken when a rule matches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Deny,
}

impl RuleAction {
    /// Allow on even indices, deny on odd ones.
    pub fn alternating(index: usize) -> Self {
        if index % 2 == 0 {
            RuleAction::Allow
        } else {
            RuleAction::Deny
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleAction::Allow => f.write_str("allow"),
            RuleAction::Deny => f.write_str("deny"),
        }
    }
}

/// An access-control rule as submitted to `POST /rules`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub target_streams: Vec<String>,
    pub condition: String,
    pub action: RuleAction,
    /// Explicit priority. Left to the service when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

/// A named schedule expression, referenced from conditions as `$(NAME)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Macro {
    pub name: String,
    pub value: String,
}

/// Errors that can occur while generating or injecting policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Rules need at least one target stream")]
    NoTargetStreams,

    #[error("Failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{step} failed: {source}")]
    Transport {
        step: String,
        #[source]
        source: TransportError,
    },

    #[error("Unexpected response from {resource}: {message}")]
    InvalidResponse { resource: String, message: String },
}
