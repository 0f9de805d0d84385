use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use crate::models::message::Message;

/// Convert the internal transcript to Gemini's `contents` specification:
/// one entry per message with a role tag and a single text part.
pub fn messages_to_gemini_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role,
                "parts": [{ "text": message.content }]
            })
        })
        .collect()
}

/// Extract the reply text from a `generateContent` response. Gemini may
/// split the reply over several parts; they are concatenated in order.
pub fn gemini_response_to_message(response: &Value) -> Result<Message> {
    let candidate = response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .ok_or_else(|| anyhow!("No candidates in response: {}", response))?;

    let parts = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("No content parts in candidate: {}", candidate))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        return Err(anyhow!("Candidate contained no text parts: {}", candidate));
    }

    Ok(Message::model(text))
}
