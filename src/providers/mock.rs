use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use super::base::{Completion, Provider};
use super::utils::messages_to_openai_spec;
use crate::models::message::Message;

enum Behavior {
    /// Reply with fixed content after an optional delay.
    Reply { content: String, delay: Duration },
    /// Reply with the wire rendering of the incoming conversation.
    Echo,
    /// Reply with the next queued content, in arrival order.
    Sequence(Mutex<Vec<String>>),
    /// Fail with the given reason.
    Fail(String),
}

/// Scripted provider for exercising the dispatcher without a network.
pub struct MockProvider {
    behavior: Behavior,
}

impl MockProvider {
    pub fn replying<S: Into<String>>(content: S) -> Self {
        Self::replying_after(content, Duration::ZERO)
    }

    pub fn replying_after<S: Into<String>>(content: S, delay: Duration) -> Self {
        Self {
            behavior: Behavior::Reply {
                content: content.into(),
                delay,
            },
        }
    }

    pub fn echoing() -> Self {
        Self {
            behavior: Behavior::Echo,
        }
    }

    pub fn sequencing<S: Into<String>>(replies: Vec<S>) -> Self {
        Self {
            behavior: Behavior::Sequence(Mutex::new(
                replies.into_iter().map(Into::into).collect(),
            )),
        }
    }

    pub fn failing<S: Into<String>>(reason: S) -> Self {
        Self {
            behavior: Behavior::Fail(reason.into()),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        _model: &str,
        messages: &[Message],
        _timeout: Duration,
    ) -> Result<Completion> {
        match &self.behavior {
            Behavior::Reply { content, delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(Completion::new(content.clone()))
            }
            Behavior::Echo => Ok(Completion::new(serde_json::to_string(
                &messages_to_openai_spec(messages),
            )?)),
            Behavior::Sequence(replies) => {
                let mut replies = replies.lock().unwrap();
                if replies.is_empty() {
                    Ok(Completion::new(""))
                } else {
                    Ok(Completion::new(replies.remove(0)))
                }
            }
            Behavior::Fail(reason) => Err(anyhow!("{reason}")),
        }
    }
}
