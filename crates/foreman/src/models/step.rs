use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AgentError, AgentResult};

/// One structured turn emitted by the model.
///
/// The model is instructed to respond with exactly one JSON object per
/// completion, discriminated by the `step` field. `input` is carried as raw
/// JSON so a string stays a string and an object stays an object; the tool
/// receiving it decides what shape it expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "lowercase")]
pub enum Step {
    Think {
        content: String,
    },
    Action {
        tool: String,
        #[serde(default)]
        input: Value,
        content: String,
    },
    Observe {
        content: String,
    },
    Output {
        content: String,
    },
}

const KNOWN_STEPS: [&str; 4] = ["think", "action", "observe", "output"];

impl Step {
    /// Decode a model reply into a step.
    ///
    /// Markdown code fences are stripped before decoding. Three outcomes are
    /// distinguished: a valid step, well-formed JSON whose `step` tag is not
    /// one of the four known kinds (`UnknownStep`), and anything that does
    /// not decode to a JSON object with a `step` field (`InvalidResponse`,
    /// carrying the raw text).
    pub fn parse(raw: &str) -> AgentResult<Step> {
        let value = extract_json(raw).ok_or_else(|| {
            AgentError::InvalidResponse(format!("expected a JSON step object, got: {raw}"))
        })?;

        let tag = value
            .get("step")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AgentError::InvalidResponse(format!("missing 'step' field in: {value}"))
            })?;

        if !KNOWN_STEPS.contains(&tag) {
            return Err(AgentError::UnknownStep(tag.to_string()));
        }

        serde_json::from_value(value)
            .map_err(|e| AgentError::InvalidResponse(format!("malformed step payload: {e}")))
    }
}

/// Pull the first JSON document out of a model reply, tolerating the
/// triple-backtick wrappers models like to add despite instructions.
fn extract_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if trimmed.starts_with("```") {
        let stripped = trimmed.trim_start_matches("```json");
        let stripped = stripped.trim_start_matches("```JSON");
        let stripped = stripped.trim_start_matches("```");
        if let Some(end) = stripped.rfind("```") {
            if let Ok(value) = serde_json::from_str::<Value>(stripped[..end].trim()) {
                return Some(value);
            }
        }
    }

    // Last resort: the outermost brace-delimited slice
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return Some(value);
            }
        }
    }

    None
}
