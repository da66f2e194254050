use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use super::base::Completion;
use crate::models::message::Message;

/// Convert the internal conversation to OpenAI's chat spec: one ordered
/// role/content list, system turns included inline like any other turn.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role,
                "content": message.content,
            })
        })
        .collect()
}

/// Extract the normalized output from an OpenAI chat completion body.
///
/// Content comes from the first choice's message. A `reasoning_details`
/// field on that message is carried through opaquely when present; most
/// models never send one.
pub fn openai_response_to_completion(response: &Value) -> Result<Completion> {
    let message = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| anyhow!("no choices in response"))?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let reasoning_details = message
        .get("reasoning_details")
        .filter(|value| !value.is_null())
        .cloned();

    Ok(Completion {
        content,
        reasoning_details,
    })
}
