//! OpenAI-compatible chat-completion client.
//!
//! Speaks `POST {base_url}/chat/completions` in both modes: a JSON body for
//! non-streaming calls, Server-Sent Events (`data: {...}\n\n`, terminated by
//! `data: [DONE]`) for streaming ones.

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{LlmError, filtered_categories};
use crate::llm::{
    ChatModel, ChatRequest, ChatResponse, Delta, DeltaStream, LlmReply, ToolCall, ToolCallDelta,
};

/// Client for an OpenAI-compatible endpoint.
///
/// No request timeout is configured; calls rely on the transport defaults.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl OpenAiClient {
    /// `base_url` should be like `https://api.openai.com/v1` (no trailing slash needed).
    pub fn new(base_url: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn create(&self, request: ChatRequest) -> Result<LlmReply, LlmError> {
        let url = self.endpoint();
        info!(
            url = %url,
            model = %request.model,
            message_count = request.messages.len(),
            stream = request.stream,
            "chat completion request"
        );

        let mut builder = self.http.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }
        if request.stream {
            builder = builder.header("Accept", "text/event-stream");
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::ConnectionFailed {
                    endpoint: url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = LlmError::from_status(status.as_u16(), body);
            warn!(status = status.as_u16(), error = %err, "chat completion rejected");
            return Err(err);
        }

        if request.stream {
            return Ok(LlmReply::Stream(Box::pin(parse_sse_stream(resp.bytes_stream()))));
        }

        let body: CompletionBody = resp
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;
        body.into_response().map(LlmReply::Message)
    }
}

// ── Non-streaming wire types ──

#[derive(Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    content_filter_results: Option<Value>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl CompletionBody {
    fn into_response(self) -> Result<ChatResponse, LlmError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Decode("no choices in response".to_string()))?;

        let content = choice.message.content.unwrap_or_default();

        // A 200 with an empty, filtered completion is a rejection too.
        if choice.finish_reason.as_deref() == Some("content_filter") && content.is_empty() {
            let categories = choice
                .content_filter_results
                .as_ref()
                .map(filtered_categories)
                .unwrap_or_default();
            return Err(LlmError::ContentFilter {
                categories,
                message: "completion withheld by content filter".to_string(),
            });
        }

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(ChatResponse {
            content,
            finish_reason: choice.finish_reason,
            tool_calls,
        })
    }
}

// ── Streaming wire types ──

#[derive(Deserialize)]
struct ChunkBody {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    content_filter_results: Option<Value>,
}

#[derive(Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChunkToolCall>>,
}

#[derive(Deserialize)]
struct ChunkToolCall {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<ChunkFunction>,
}

#[derive(Deserialize)]
struct ChunkFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

// ── SSE parser ──

struct SseState<S> {
    inner: std::pin::Pin<Box<S>>,
    buffer: Vec<u8>,
    done: bool,
}

enum SseEvent {
    Delta(Delta),
    Done,
    Skip,
}

/// Turn a raw SSE byte stream into [`Delta`]s.
///
/// Bytes are buffered until a full event (`\n\n`) is available, so multi-byte
/// characters split across network chunks decode correctly. Carriage returns
/// are dropped so `\r\n` framing works too.
pub fn parse_sse_stream<S, B, E>(bytes: S) -> impl Stream<Item = Result<Delta, LlmError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    let state = SseState {
        inner: Box::pin(bytes),
        buffer: Vec::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.done {
                return None;
            }

            if let Some(end) = find_event_end(&state.buffer) {
                let event: Vec<u8> = state.buffer.drain(..end + 2).collect();
                match process_event(&String::from_utf8_lossy(&event[..end])) {
                    Ok(SseEvent::Delta(delta)) => return Some((Ok(delta), state)),
                    Ok(SseEvent::Done) => {
                        state.done = true;
                        return None;
                    }
                    Ok(SseEvent::Skip) => continue,
                    Err(e) => return Some((Err(e), state)),
                }
            }

            match state.inner.next().await {
                Some(Ok(chunk)) => state
                    .buffer
                    .extend(chunk.as_ref().iter().copied().filter(|&b| b != b'\r')),
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(LlmError::Stream(format!("read error: {e}"))), state));
                }
                None => {
                    // Trailing event without the final blank line.
                    state.done = true;
                    let rest = std::mem::take(&mut state.buffer);
                    let rest = String::from_utf8_lossy(&rest);
                    if rest.trim().is_empty() {
                        return None;
                    }
                    return match process_event(rest.trim()) {
                        Ok(SseEvent::Delta(delta)) => Some((Ok(delta), state)),
                        Ok(_) => None,
                        Err(e) => Some((Err(e), state)),
                    };
                }
            }
        }
    })
}

fn find_event_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn process_event(event: &str) -> Result<SseEvent, LlmError> {
    let mut data = String::new();
    for line in event.lines() {
        if let Some(payload) = line.strip_prefix("data:") {
            let payload = payload.trim();
            if payload == "[DONE]" {
                return Ok(SseEvent::Done);
            }
            data.push_str(payload);
        }
        // Comments, `event:` and `id:` lines carry nothing we use.
    }

    if data.is_empty() {
        return Ok(SseEvent::Skip);
    }

    let value: Value = serde_json::from_str(&data)
        .map_err(|e| LlmError::Stream(format!("bad SSE chunk: {e} (data: {data})")))?;
    if let Some(err) = value.get("error") {
        return Err(LlmError::from_status(200, serde_json::json!({ "error": err }).to_string()));
    }

    let chunk: ChunkBody =
        serde_json::from_value(value).map_err(|e| LlmError::Stream(e.to_string()))?;
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(SseEvent::Skip);
    };

    let tool_calls = choice.delta.tool_calls.map(|calls| {
        calls
            .into_iter()
            .map(|tc| ToolCallDelta {
                index: tc.index,
                id: tc.id,
                name: tc.function.as_ref().and_then(|f| f.name.clone()),
                arguments: tc.function.and_then(|f| f.arguments),
            })
            .collect()
    });

    debug!(finish_reason = ?choice.finish_reason, "SSE delta");
    Ok(SseEvent::Delta(Delta {
        content: choice.delta.content.filter(|c| !c.is_empty()),
        tool_calls,
        finish_reason: choice.finish_reason,
        filter_categories: choice
            .content_filter_results
            .as_ref()
            .map(filtered_categories)
            .unwrap_or_default(),
    }))
}

/// Box a parsed SSE stream as a [`DeltaStream`].
pub fn boxed_sse_stream<S, B, E>(bytes: S) -> DeltaStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(parse_sse_stream(bytes))
}
