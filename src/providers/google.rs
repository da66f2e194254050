use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Completion, Provider};
use super::configs::GoogleProviderConfig;
use crate::models::message::{Message, Role};

/// Adapter for the Gemini generate endpoint.
///
/// The call path used here has no multi-role chat primitive, so the whole
/// conversation is flattened into one prompt string, and the request runs
/// through the blocking transport on a worker thread so it never stalls
/// sibling calls on the async scheduler.
pub struct GoogleProvider {
    config: GoogleProviderConfig,
}

impl GoogleProvider {
    pub fn new(config: GoogleProviderConfig) -> Self {
        Self { config }
    }

    /// Flatten the conversation to a single prompt: user turns verbatim,
    /// assistant and system turns labeled, blank line between turns,
    /// original order throughout.
    fn flatten_conversation(messages: &[Message]) -> String {
        let parts: Vec<String> = messages
            .iter()
            .map(|message| match message.role {
                Role::User => message.content.clone(),
                Role::Assistant => format!("Assistant: {}", message.content),
                Role::System => format!("System: {}", message.content),
            })
            .collect();

        parts.join("\n\n")
    }

    /// Pull the reply text out of a generate response: the aggregate `text`
    /// field when the backend sends one, otherwise the first candidate's
    /// text parts.
    fn response_text(data: &Value) -> String {
        if let Some(text) = data.get("text").and_then(Value::as_str) {
            return text.to_string();
        }

        data.get("candidates")
            .and_then(|candidates| candidates.get(0))
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        timeout: Duration,
    ) -> Result<Completion> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.host.trim_end_matches('/'),
            model
        );
        let api_key = self.config.api_key.clone();
        let payload = json!({
            "contents": [{
                "parts": [{"text": Self::flatten_conversation(messages)}]
            }]
        });

        // The blocking client must live entirely on the worker thread; it
        // cannot be built or dropped inside the async runtime.
        let data = tokio::task::spawn_blocking(move || -> Result<Value> {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()?;

            let response = client
                .post(&url)
                .header("x-goog-api-key", &api_key)
                .json(&payload)
                .send()?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().unwrap_or_default();
                return Err(anyhow!("request failed: {} - {}", status, error_text));
            }

            Ok(response.json()?)
        })
        .await
        .map_err(|e| anyhow!("generate worker panicked: {e}"))??;

        Ok(Completion::new(Self::response_text(&data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn test_config(host: String) -> GoogleProviderConfig {
        GoogleProviderConfig {
            host,
            api_key: "test_api_key".to_string(),
        }
    }

    #[test]
    fn test_flatten_labels_roles() {
        let messages = vec![
            Message::system("Be terse"),
            Message::user("2+2?"),
            Message::assistant("4"),
            Message::user("and 3+3?"),
        ];

        let prompt = GoogleProvider::flatten_conversation(&messages);
        assert_eq!(prompt, "System: Be terse\n\n2+2?\n\nAssistant: 4\n\nand 3+3?");
    }

    #[test]
    fn test_flatten_empty_conversation() {
        assert_eq!(GoogleProvider::flatten_conversation(&[]), "");
    }

    #[test]
    fn test_response_text_prefers_aggregate_field() {
        let data = json!({
            "text": "direct",
            "candidates": [{"content": {"parts": [{"text": "fallback"}]}}]
        });
        assert_eq!(GoogleProvider::response_text(&data), "direct");
    }

    #[test]
    fn test_response_text_candidate_fallback() {
        let data = json!({
            "candidates": [{
                "content": {"parts": [{"text": "part one"}, {"text": " part two"}]}
            }]
        });
        assert_eq!(GoogleProvider::response_text(&data), "part one part two");
    }

    #[test]
    fn test_response_text_empty_body() {
        // An empty reply is normalized to empty content, not an error.
        assert_eq!(GoogleProvider::response_text(&json!({})), "");
    }

    #[tokio::test]
    async fn test_complete_basic() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
            .and(header("x-goog-api-key", "test_api_key"))
            .and(body_partial_json(json!({
                "contents": [{"parts": [{"text": "System: Be terse\n\n2+2?"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "4"}], "role": "model"},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = GoogleProvider::new(test_config(mock_server.uri()));
        let messages = vec![Message::system("Be terse"), Message::user("2+2?")];
        let completion = provider
            .complete("gemini-2.0-flash-exp", &messages, TIMEOUT)
            .await?;

        assert_eq!(completion.content, "4");
        assert!(completion.reasoning_details.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_becomes_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
            .respond_with(ResponseTemplate::new(403).set_body_string("key rejected"))
            .mount(&mock_server)
            .await;

        let provider = GoogleProvider::new(test_config(mock_server.uri()));
        let result = provider
            .complete("gemini-2.0-flash-exp", &[Message::user("hi")], TIMEOUT)
            .await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("403"), "unexpected error: {err}");
    }
}
