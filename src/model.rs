//! Data models for chat transcripts and the Ollama chat wire format.

use serde::{Deserialize, Serialize};

/// Role of the message sender.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation.
///
/// Messages are immutable once appended to a transcript; the serialized
/// form (`{"role": …, "content": …}`) is exactly what the chat endpoint
/// expects, so the same type serves both the transcript and the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub stream: bool,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<SamplingParams>,
}

/// Sampling parameters forwarded in the request's `options` object.
///
/// Only set fields are serialized; the server applies its own defaults
/// for anything omitted.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SamplingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

impl SamplingParams {
    /// True when no parameter is set, in which case the `options` object
    /// is left off the request entirely.
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_p.is_none() && self.num_predict.is_none()
    }
}

/// One decoded JSON object from one line of the streamed response body.
///
/// The only shape that contributes text is `{"message":{"content": …}}`;
/// every other field (`model`, `done`, timing counters, …) is tolerated
/// and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatStreamRecord {
    #[serde(default)]
    pub message: Option<RecordMessage>,
    #[serde(default)]
    pub done: bool,
}

/// The `message` field of a stream record.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Response body of `GET /api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelTags {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

/// One installed model as listed by the tags endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn chat_request_omits_empty_options() {
        let req = ChatRequest {
            model: "qwen2.5:7b".to_string(),
            stream: true,
            messages: vec![Message::user("hi")],
            options: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("options").is_none());
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn stream_record_tolerates_unknown_fields() {
        let record: ChatStreamRecord = serde_json::from_str(
            r#"{"model":"qwen2.5:7b","created_at":"2024-01-01T00:00:00Z","message":{"role":"assistant","content":"Hi"},"done":false}"#,
        )
        .unwrap();
        assert_eq!(record.message.unwrap().content.as_deref(), Some("Hi"));
        assert!(!record.done);
    }

    #[test]
    fn stream_record_without_message_is_fine() {
        let record: ChatStreamRecord =
            serde_json::from_str(r#"{"done":true,"eval_count":10}"#).unwrap();
        assert!(record.message.is_none());
        assert!(record.done);
    }

    #[test]
    fn model_tags_parse() {
        let tags: ModelTags =
            serde_json::from_str(r#"{"models":[{"name":"qwen2.5:7b","size":4}]}"#).unwrap();
        assert_eq!(tags.models[0].name, "qwen2.5:7b");
    }
}
