use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::models::message::Message;

/// Normalized reply from any backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    /// Vendor-specific intermediate reasoning, kept opaque. Only populated
    /// for backends that expose such a field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_details: Option<Value>,
}

impl Completion {
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            reasoning_details: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: Value) -> Self {
        self.reasoning_details = Some(reasoning);
        self
    }
}

/// Base trait for AI providers (OpenAI, Anthropic, Google).
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send a conversation to `model` and normalize the reply.
    ///
    /// `timeout` bounds the underlying HTTP request. The dispatcher races
    /// the whole call against the same budget, so an adapter that fails to
    /// honor it is still cut off.
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        timeout: Duration,
    ) -> Result<Completion>;
}
