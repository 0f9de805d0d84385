use super::role::Role;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A single text message to or from the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub created: i64,
    pub content: String,
}

impl Message {
    /// Create a user message with the current timestamp
    pub fn user<S: Into<String>>(content: S) -> Self {
        Message {
            role: Role::User,
            created: Utc::now().timestamp(),
            content: content.into(),
        }
    }

    /// Create a model message with the current timestamp
    pub fn model<S: Into<String>>(content: S) -> Self {
        Message {
            role: Role::Model,
            created: Utc::now().timestamp(),
            content: content.into(),
        }
    }
}

/// The ordered conversation history sent to the model on every request.
///
/// Owned by the driver and threaded through the loop. The API only appends:
/// once a message is recorded it is never edited or removed, so the sequence
/// length is non-decreasing for the lifetime of a run.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message
    pub fn push_user<S: Into<String>>(&mut self, content: S) {
        self.messages.push(Message::user(content));
    }

    /// Append a model message
    pub fn push_model<S: Into<String>>(&mut self, content: S) {
        self.messages.push(Message::model(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_lowercase() {
        let user = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(user["role"], "user");

        let model = serde_json::to_value(Message::model("hello")).unwrap();
        assert_eq!(model["role"], "model");
    }

    #[test]
    fn test_transcript_appends_in_order() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());

        transcript.push_user("first");
        transcript.push_model("second");
        transcript.push_user("third");

        assert_eq!(transcript.len(), 3);
        let contents: Vec<&str> = transcript
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(transcript.messages()[1].role, Role::Model);
    }
}
