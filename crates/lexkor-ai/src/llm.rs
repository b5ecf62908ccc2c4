//! Chat-completion abstraction.
//!
//! Core logic talks to a [`ChatModel`] and gets back an explicit [`LlmReply`]:
//! either a whole [`ChatResponse`] or a stream of [`Delta`]s. Transport
//! details (OpenAI wire format, SSE framing) stay in [`crate::openai`].

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Tool definitions, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<serde_json::Value>>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
            temperature: None,
            max_tokens: None,
            tools: None,
        }
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A complete tool call from a non-streaming response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON argument string as sent by the model.
    pub arguments: String,
}

/// A whole (non-streaming) completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatResponse {
    pub content: String,
    pub finish_reason: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ChatResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: Some("stop".to_string()),
            tool_calls: Vec::new(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Tool call fragment inside a streaming delta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallDelta {
    pub index: u32,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// One incremental update from a streaming completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCallDelta>>,
    pub finish_reason: Option<String>,
    /// Categories flagged by the provider's content filter on this chunk.
    pub filter_categories: Vec<String>,
}

impl Delta {
    /// A chunk that ends the completion on a content-filter rejection
    /// without producing any output.
    pub fn is_filtered_empty(&self) -> bool {
        self.finish_reason.as_deref() == Some("content_filter")
            && self.content.is_none()
            && self.tool_calls.is_none()
    }

    pub(crate) fn carries_nothing(&self) -> bool {
        self.content.is_none() && self.tool_calls.is_none() && self.finish_reason.is_none()
    }
}

pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<Delta, LlmError>> + Send>>;

/// What a chat-completion call produced.
pub enum LlmReply {
    Message(ChatResponse),
    Stream(DeltaStream),
}

impl LlmReply {
    /// Resolve to a whole response, draining the stream if necessary.
    pub async fn into_response(self) -> Result<ChatResponse, LlmError> {
        match self {
            LlmReply::Message(resp) => Ok(resp),
            LlmReply::Stream(stream) => collect_stream(stream).await,
        }
    }
}

impl fmt::Debug for LlmReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmReply::Message(resp) => f.debug_tuple("Message").field(resp).finish(),
            LlmReply::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Concatenate a delta stream into a single response.
pub async fn collect_stream(mut stream: DeltaStream) -> Result<ChatResponse, LlmError> {
    let mut out = ChatResponse::default();
    while let Some(delta) = stream.next().await {
        let delta = delta?;
        if let Some(text) = delta.content {
            out.content.push_str(&text);
        }
        if delta.finish_reason.is_some() {
            out.finish_reason = delta.finish_reason;
        }
    }
    Ok(out)
}

/// Chat-completion capability.
///
/// `request.stream` selects the reply variant: implementations return
/// [`LlmReply::Stream`] for streaming requests and [`LlmReply::Message`]
/// otherwise.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn create(&self, request: ChatRequest) -> Result<LlmReply, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_omitted() {
        let req = ChatRequest::new("m", vec![ChatMessage::user("안녕")]);
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("tools"));
        assert!(json.contains(r#""role":"user""#));
    }

    #[test]
    fn zero_temperature_is_sent() {
        let req = ChatRequest::new("m", vec![]).temperature(0.0).max_tokens(256);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""temperature":0.0"#));
        assert!(json.contains(r#""max_tokens":256"#));
    }

    #[tokio::test]
    async fn collect_concatenates_deltas() {
        let deltas = vec![
            Ok(Delta {
                content: Some("민법 ".into()),
                ..Delta::default()
            }),
            Ok(Delta {
                content: Some("제750조".into()),
                finish_reason: Some("stop".into()),
                ..Delta::default()
            }),
        ];
        let stream: DeltaStream = Box::pin(futures::stream::iter(deltas));
        let resp = LlmReply::Stream(stream).into_response().await.unwrap();
        assert_eq!(resp.content(), "민법 제750조");
        assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
    }
}
