//! Per-provider connection settings, read from the environment.
//!
//! Credentials must be present before a provider's first call; a missing
//! key fails that provider's construction with
//! [`DispatchError::MissingCredential`] and the dispatcher keeps the
//! failure for the process lifetime. Hosts can be overridden so tests can
//! point an adapter at a local server.

use std::env;

use crate::errors::DispatchError;

fn required(key: &str) -> Result<String, DispatchError> {
    env::var(key).map_err(|_| DispatchError::MissingCredential(key.to_string()))
}

fn host_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl OpenAiProviderConfig {
    pub fn from_env() -> Result<Self, DispatchError> {
        Ok(Self {
            host: host_or("OPENAI_HOST", "https://api.openai.com"),
            api_key: required("OPENAI_API_KEY")?,
            temperature: None,
            max_tokens: None,
        })
    }
}

#[derive(Debug)]
pub struct AnthropicProviderConfig {
    pub host: String,
    pub api_key: String,
    /// Required by the messages API on every request.
    pub max_tokens: u32,
}

impl AnthropicProviderConfig {
    pub fn from_env() -> Result<Self, DispatchError> {
        Ok(Self {
            host: host_or("ANTHROPIC_HOST", "https://api.anthropic.com"),
            api_key: required("ANTHROPIC_API_KEY")?,
            max_tokens: 4096,
        })
    }
}

pub struct GoogleProviderConfig {
    pub host: String,
    pub api_key: String,
}

impl GoogleProviderConfig {
    pub fn from_env() -> Result<Self, DispatchError> {
        Ok(Self {
            host: host_or("GOOGLE_HOST", "https://generativelanguage.googleapis.com"),
            api_key: required("GOOGLE_API_KEY")?,
        })
    }
}
