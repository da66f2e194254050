use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Completion, Provider};
use super::configs::AnthropicProviderConfig;
use crate::errors::DispatchError;
use crate::models::message::{Message, Role};

pub struct AnthropicProvider {
    client: Client,
    config: AnthropicProviderConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicProviderConfig) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .build()
            .map_err(|e| DispatchError::Provider(format!("failed to build http client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Split the conversation for the messages API, which takes the system
    /// instruction separately from the turn list.
    ///
    /// One pass over the input: the last system turn wins the `system`
    /// field (earlier ones are dropped, not demoted into the turn list),
    /// everything else is forwarded in order.
    fn split_conversation(messages: &[Message]) -> (Option<&str>, Vec<Value>) {
        let mut system = None;
        let mut turns = Vec::new();

        for message in messages {
            match message.role {
                Role::System => system = Some(message.content.as_str()),
                Role::User | Role::Assistant => turns.push(json!({
                    "role": message.role,
                    "content": message.content,
                })),
            }
        }

        (system, turns)
    }

    /// Replies arrive as a list of typed blocks; only text blocks carry
    /// output, and they are concatenated in order.
    fn response_text(data: &Value) -> String {
        data.get("content")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|block| block.get("text").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn post(&self, payload: Value, timeout: Duration) -> Result<Value> {
        let url = format!("{}/v1/messages", self.config.host.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .timeout(timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("server error: {}", status))
            }
            _ => {
                let error_text = response.text().await?;
                Err(anyhow!("request failed: {} - {}", status, error_text))
            }
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        timeout: Duration,
    ) -> Result<Completion> {
        let (system, turns) = Self::split_conversation(messages);

        let mut payload = json!({
            "model": model,
            "max_tokens": self.config.max_tokens,
            "messages": turns,
        });
        if let Some(system) = system {
            payload
                .as_object_mut()
                .unwrap()
                .insert("system".to_string(), json!(system));
        }

        let response = self.post(payload, timeout).await?;

        // No reasoning surface on this protocol; text blocks are the whole reply.
        Ok(Completion::new(Self::response_text(&response)))
    }
}
