use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Completion, Provider};
use super::configs::OpenAiProviderConfig;
use super::utils::{messages_to_openai_spec, openai_response_to_completion};
use crate::errors::DispatchError;
use crate::models::message::Message;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .build()
            .map_err(|e| DispatchError::Provider(format!("failed to build http client: {e}")))?;

        Ok(Self { client, config })
    }

    async fn post(&self, payload: Value, timeout: Duration) -> Result<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
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
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        timeout: Duration,
    ) -> Result<Completion> {
        // The chat endpoint takes the conversation as-is: one ordered list,
        // system turns included inline.
        let mut payload = json!({
            "model": model,
            "messages": messages_to_openai_spec(messages),
        });

        if let Some(temp) = self.config.temperature {
            payload
                .as_object_mut()
                .unwrap()
                .insert("temperature".to_string(), json!(temp));
        }
        if let Some(tokens) = self.config.max_tokens {
            payload
                .as_object_mut()
                .unwrap()
                .insert("max_tokens".to_string(), json!(tokens));
        }

        let response = self.post(payload, timeout).await?;

        if let Some(error) = response.get("error") {
            return Err(anyhow!("OpenAI API error: {}", error));
        }

        openai_response_to_completion(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn test_config(host: String) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host,
            api_key: "test_api_key".to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    async fn setup_mock_server(response_body: Value) -> (MockServer, OpenAiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test_api_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(test_config(mock_server.uri())).unwrap();
        (mock_server, provider)
    }

    #[tokio::test]
    async fn test_complete_basic() -> Result<()> {
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello! How can I assist you today?"
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        });

        let (_, provider) = setup_mock_server(response_body).await;

        let messages = vec![Message::user("Hello?")];
        let completion = provider.complete("gpt-4o", &messages, TIMEOUT).await?;

        assert_eq!(completion.content, "Hello! How can I assist you today?");
        assert!(completion.reasoning_details.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_system_turns_sent_inline() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "Be terse"},
                    {"role": "user", "content": "2+2?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "4"}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(test_config(mock_server.uri())).unwrap();
        let messages = vec![Message::system("Be terse"), Message::user("2+2?")];
        let completion = provider.complete("gpt-4o", &messages, TIMEOUT).await?;

        assert_eq!(completion.content, "4");
        Ok(())
    }

    #[tokio::test]
    async fn test_reasoning_details_passthrough() -> Result<()> {
        let response_body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "42",
                    "reasoning_details": [{"type": "reasoning.summary", "summary": "arithmetic"}]
                }
            }]
        });

        let (_, provider) = setup_mock_server(response_body).await;
        let completion = provider
            .complete("o1", &[Message::user("6*7?")], TIMEOUT)
            .await?;

        assert_eq!(
            completion.reasoning_details,
            Some(json!([{"type": "reasoning.summary", "summary": "arithmetic"}]))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_becomes_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(test_config(mock_server.uri())).unwrap();
        let result = provider
            .complete("gpt-4o", &[Message::user("hi")], TIMEOUT)
            .await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("401"), "unexpected error: {err}");
    }
}
