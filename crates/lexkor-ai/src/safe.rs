//! Content-filter guard around a single chat completion.
//!
//! A policy rejection is recognised, retried once with a softening system
//! instruction when allowed, and otherwise turned into a fixed guidance
//! message. Errors on the first attempt other than a rejection are returned
//! to the caller untouched; once a retry has been made, any failure ends in
//! the guidance message.
//!
//! Streaming replies are opened up to their first meaningful delta, so a
//! rejection at the head of a stream is handled like a rejected response.

use std::fmt;

use futures::{StreamExt, stream};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::LlmError;
use crate::llm::{
    ChatMessage, ChatModel, ChatRequest, ChatResponse, Delta, DeltaStream, LlmReply, Role,
};

/// Shown to the user when a completion is withheld.
pub const CONTENT_FILTER_GUIDANCE: &str = "요청하신 내용이 안전 정책에 의해 답변이 제한되었습니다. \
폭력적이거나 자극적인 표현을 줄이고, 사실관계를 중립적으로 정리해 다시 질문해 주세요. \
긴급한 위험이 있다면 112(경찰) 또는 109(자살예방상담)로 바로 연락하세요.";

/// Injected before the retry.
pub const SOFTEN_INSTRUCTION: &str = "사용자 입력에 민감한 표현이 포함되어 있을 수 있습니다. \
민감한 표현은 중립적인 법률 용어로 바꾸어 이해하고, 폭력·자해·성적 묘사를 재현하거나 \
구체화하지 마세요. 사실관계와 적용 법령, 절차 안내에만 집중해 답하세요.";

pub const KIND_OK: &str = "ok";
pub const KIND_STREAM: &str = "stream";
pub const KIND_BLOCKED: &str = "blocked_by_content_filter";

/// Extra request parameters passed through to the model.
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tools: Option<Vec<Value>>,
}

/// Result of [`complete_safely`].
pub enum SafeOutcome {
    Ok(ChatResponse),
    Stream(DeltaStream),
    Blocked {
        message: String,
        /// Rejection categories for logging; empty when the provider gave none.
        categories: Vec<String>,
    },
}

impl SafeOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            SafeOutcome::Ok(_) => KIND_OK,
            SafeOutcome::Stream(_) => KIND_STREAM,
            SafeOutcome::Blocked { .. } => KIND_BLOCKED,
        }
    }

    fn from_reply(reply: LlmReply) -> Self {
        match reply {
            LlmReply::Message(resp) => SafeOutcome::Ok(resp),
            LlmReply::Stream(stream) => SafeOutcome::Stream(stream),
        }
    }
}

impl fmt::Debug for SafeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafeOutcome::Ok(resp) => f.debug_tuple("Ok").field(resp).finish(),
            SafeOutcome::Stream(_) => f.write_str("Stream(..)"),
            SafeOutcome::Blocked { message, categories } => f
                .debug_struct("Blocked")
                .field("message", message)
                .field("categories", categories)
                .finish(),
        }
    }
}

/// Run one completion with content-filter handling.
///
/// `stream` selects the reply shape and is honoured on the retry too.
pub async fn complete_safely(
    client: &dyn ChatModel,
    messages: &[ChatMessage],
    model: &str,
    stream: bool,
    allow_retry: bool,
    options: &CompletionOptions,
) -> Result<SafeOutcome, LlmError> {
    let first = attempt(client, build_request(messages.to_vec(), model, stream, options)).await;

    let categories = match first {
        Ok(reply) => return Ok(SafeOutcome::from_reply(reply)),
        Err(LlmError::ContentFilter { categories, .. }) => categories,
        Err(e) => return Err(e),
    };
    warn!(categories = ?categories, allow_retry, "completion blocked by content filter");

    if !allow_retry {
        return Ok(blocked(categories));
    }

    let retry = attempt(client, build_request(softened(messages), model, stream, options)).await;
    match retry {
        Ok(reply) => {
            info!("softened retry succeeded");
            Ok(SafeOutcome::from_reply(reply))
        }
        Err(LlmError::ContentFilter {
            categories: again, ..
        }) => {
            warn!(categories = ?again, "softened retry blocked as well");
            let mut merged = categories;
            for c in again {
                if !merged.contains(&c) {
                    merged.push(c);
                }
            }
            Ok(blocked(merged))
        }
        Err(e) => {
            warn!(error = %e, "softened retry failed");
            Ok(blocked(categories))
        }
    }
}

/// One model call; a streaming reply is opened before it is returned.
async fn attempt(client: &dyn ChatModel, request: ChatRequest) -> Result<LlmReply, LlmError> {
    match client.create(request).await? {
        LlmReply::Stream(deltas) => open_stream(deltas).await.map(LlmReply::Stream),
        reply => Ok(reply),
    }
}

/// Read up to the first delta that carries output. Errors and an empty
/// content-filter finish at that point fail the call; the delta is put back
/// in front of the rest of the stream otherwise.
async fn open_stream(mut deltas: DeltaStream) -> Result<DeltaStream, LlmError> {
    while let Some(item) = deltas.next().await {
        let delta = item?;
        if delta.is_filtered_empty() {
            return Err(LlmError::ContentFilter {
                categories: delta.filter_categories,
                message: "stream withheld by content filter".to_string(),
            });
        }
        if delta.carries_nothing() {
            debug!("skipping empty leading delta");
            continue;
        }
        return Ok(Box::pin(stream::once(async move { Ok::<_, LlmError>(delta) }).chain(deltas)));
    }
    Ok(Box::pin(stream::empty::<Result<Delta, LlmError>>()))
}

fn build_request(
    messages: Vec<ChatMessage>,
    model: &str,
    stream: bool,
    options: &CompletionOptions,
) -> ChatRequest {
    let mut request = ChatRequest::new(model, messages).streaming(stream);
    request.temperature = options.temperature;
    request.max_tokens = options.max_tokens;
    request.tools = options.tools.clone();
    request
}

/// Copy of `messages` with the softening instruction after the leading
/// system messages.
fn softened(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let at = messages
        .iter()
        .position(|m| m.role != Role::System)
        .unwrap_or(messages.len());
    let mut out = Vec::with_capacity(messages.len() + 1);
    out.extend_from_slice(&messages[..at]);
    out.push(ChatMessage::system(SOFTEN_INSTRUCTION));
    out.extend_from_slice(&messages[at..]);
    out
}

fn blocked(categories: Vec<String>) -> SafeOutcome {
    SafeOutcome::Blocked {
        message: CONTENT_FILTER_GUIDANCE.to_string(),
        categories,
    }
}
